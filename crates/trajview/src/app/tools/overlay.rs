use crate::app::rendering::{Rgba, Surface};
use crate::app::{ColorScheme, LoopMetricsSnapshot, PhaseStats};
use crate::geometry::Vec2;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const OVERLAY_PADDING: i32 = 6 * TEXT_SCALE;
const PANEL_INSET_X: i32 = 4 * TEXT_SCALE;
const PANEL_INSET_Y: i32 = 3 * TEXT_SCALE;
const TEXT_PRIMARY_COLOR: Rgba = [244, 248, 252, 255];
const TEXT_ALERT_COLOR: Rgba = [255, 196, 90, 255];
const PANEL_BG_COLOR: Rgba = [10, 12, 16, 210];
const PANEL_BORDER_COLOR: Rgba = [92, 106, 126, 255];
const PAUSED_LABEL: &str = "PAUSED";

/// Everything the diagnostics panel shows for one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub target_tps: u32,
    pub entity_count: usize,
    pub cursor_field: Option<Vec2>,
    pub scheme: ColorScheme,
    pub paused: bool,
}

pub(crate) fn draw_overlay(surface: &mut Surface, data: &OverlayData) {
    if surface.width() == 0 || surface.height() == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * GLYPH_ADVANCE + PANEL_INSET_X * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + PANEL_INSET_Y * 2;
    let panel_left = OVERLAY_PADDING - PANEL_INSET_X;
    let panel_top = OVERLAY_PADDING - PANEL_INSET_Y;
    surface.fill_rect(panel_left, panel_top, panel_width, panel_height, PANEL_BG_COLOR);
    draw_rect_outline(surface, panel_left, panel_top, panel_width, panel_height);

    let mut y = OVERLAY_PADDING;
    for line in lines {
        let color = if line == PAUSED_LABEL {
            TEXT_ALERT_COLOR
        } else {
            TEXT_PRIMARY_COLOR
        };
        draw_text(surface, OVERLAY_PADDING, y, &line, color);
        y += LINE_ADVANCE;
    }
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        format!(
            "FPS {:.1} / {}",
            data.metrics.measured_tps, data.target_tps
        ),
        format_phase_line("UPD", data.metrics.timings.update),
        format_phase_line("REN", data.metrics.timings.render),
        format_phase_line("OVR", data.metrics.timings.overrun),
        format!(
            "LATE {} / {}",
            data.metrics.late_ticks, data.metrics.total_ticks
        ),
        format!("ENTITIES {}", data.entity_count),
        match data.cursor_field {
            Some(field) => format!("CURSOR {:.1}, {:.1}", field.x, field.y),
            None => "CURSOR -".to_string(),
        },
        format!("SCHEME {:?}", data.scheme).to_uppercase(),
    ];
    if data.paused {
        lines.push(PAUSED_LABEL.to_string());
    }
    lines
}

fn format_phase_line(label: &str, stats: PhaseStats) -> String {
    format!(
        "{label} {:.2}/{:.2}/{:.2} MS",
        stats.last_ms, stats.avg_ms, stats.max_ms
    )
}

fn draw_rect_outline(surface: &mut Surface, x: i32, y: i32, rect_width: i32, rect_height: i32) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    surface.fill_rect(x, y, rect_width, 1, PANEL_BORDER_COLOR);
    surface.fill_rect(x, y + rect_height - 1, rect_width, 1, PANEL_BORDER_COLOR);
    surface.fill_rect(x, y, 1, rect_height, PANEL_BORDER_COLOR);
    surface.fill_rect(x + rect_width - 1, y, 1, rect_height, PANEL_BORDER_COLOR);
}

/// Text is upper-cased; characters without a glyph render as `?`.
fn draw_text(surface: &mut Surface, mut x: i32, y: i32, text: &str, color: Rgba) {
    for ch in text.chars().flat_map(char::to_uppercase) {
        let rows = glyph_rows(ch).unwrap_or(UNKNOWN_GLYPH);
        for (row_index, row_bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                surface.fill_rect(
                    x + col * TEXT_SCALE,
                    y + row_index as i32 * TEXT_SCALE,
                    TEXT_SCALE,
                    TEXT_SCALE,
                    color,
                );
            }
        }
        x += GLYPH_ADVANCE;
    }
}

type GlyphRows = [u8; GLYPH_HEIGHT as usize];

const UNKNOWN_GLYPH: GlyphRows = [0b111, 0b001, 0b011, 0b000, 0b010];

fn glyph_rows(ch: char) -> Option<GlyphRows> {
    let rows = match ch {
        ' ' => [0, 0, 0, 0, 0],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        _ => return None,
    };
    Some(rows)
}
