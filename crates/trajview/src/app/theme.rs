use serde::Deserialize;

use super::rendering::Rgba;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

impl ColorScheme {
    pub fn palette(self) -> &'static Palette {
        match self {
            ColorScheme::Dark => &DARK_PALETTE,
            ColorScheme::Light => &LIGHT_PALETTE,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ColorScheme::Dark => ColorScheme::Light,
            ColorScheme::Light => ColorScheme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub clear: Rgba,
    pub grid_minor: Rgba,
    pub grid_major: Rgba,
    pub axis: Rgba,
    pub compass: Rgba,
    pub compass_north: Rgba,
    pub path: Rgba,
    pub path_outline: Rgba,
    pub path_hover: Rgba,
    pub start_marker: Rgba,
    pub turn_marker: Rgba,
    pub wait_marker: Rgba,
    pub robot_body: Rgba,
    pub robot_heading: Rgba,
}

const DARK_PALETTE: Palette = Palette {
    clear: [20, 22, 28, 255],
    grid_minor: [35, 39, 46, 255],
    grid_major: [52, 58, 70, 255],
    axis: [120, 130, 150, 255],
    compass: [176, 198, 220, 255],
    compass_north: [255, 120, 120, 255],
    path: [80, 220, 255, 255],
    path_outline: [80, 220, 255, 90],
    path_hover: [255, 236, 120, 255],
    start_marker: [244, 248, 252, 255],
    turn_marker: [255, 160, 60, 255],
    wait_marker: [200, 110, 255, 255],
    robot_body: [90, 200, 120, 200],
    robot_heading: [244, 248, 252, 255],
};

const LIGHT_PALETTE: Palette = Palette {
    clear: [238, 240, 244, 255],
    grid_minor: [218, 222, 230, 255],
    grid_major: [190, 196, 208, 255],
    axis: [90, 98, 114, 255],
    compass: [60, 70, 90, 255],
    compass_north: [200, 40, 40, 255],
    path: [20, 110, 200, 255],
    path_outline: [20, 110, 200, 80],
    path_hover: [220, 140, 0, 255],
    start_marker: [30, 34, 40, 255],
    turn_marker: [230, 110, 20, 255],
    wait_marker: [140, 40, 200, 255],
    robot_body: [40, 150, 80, 200],
    robot_heading: [30, 34, 40, 255],
};
