use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;
use trajview::{resolve_root, AppPaths, Simulation, ViewerConfig, ViewerLink};

use super::demo;

const CONFIG_ENV_VAR: &str = "TRAJVIEW_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "trajview.json";

pub(crate) struct AppWiring {
    pub(crate) config: ViewerConfig,
    pub(crate) paths: AppPaths,
    pub(crate) simulation: Simulation,
    pub(crate) link: ViewerLink,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== trajview startup ===");

    let root = resolve_root().map_err(|error| error.to_string())?;
    let config = load_config(&root, env::var_os(CONFIG_ENV_VAR))?;
    let paths = AppPaths::for_root(root, &config.export_dir).map_err(|error| error.to_string())?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        export_dir = %paths.export_dir.display(),
        "startup"
    );

    let (mut simulation, link) =
        Simulation::new(&config, &paths.assets_dir).map_err(|error| error.to_string())?;
    let trajectory_count = demo::install(&mut simulation);
    info!(
        trajectory_count,
        background = ?config.background,
        scheme = ?config.color_scheme,
        "demo_loaded"
    );

    Ok(AppWiring {
        config,
        paths,
        simulation,
        link,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// An explicit path must exist; the default file under the root is optional.
fn config_path(root: &Path, env_value: Option<OsString>) -> Option<PathBuf> {
    match env_value.filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(PathBuf::from(raw)),
        None => {
            let default_path = root.join(DEFAULT_CONFIG_FILE);
            default_path.is_file().then_some(default_path)
        }
    }
}

fn load_config(root: &Path, env_value: Option<OsString>) -> Result<ViewerConfig, String> {
    let Some(path) = config_path(root, env_value) else {
        info!("config_defaults");
        return Ok(ViewerConfig::default());
    };
    let raw = fs::read_to_string(&path)
        .map_err(|error| format!("read config '{}': {error}", path.display()))?;
    let config = parse_config_json(&raw)
        .map_err(|error| format!("config '{}': {error}", path.display()))?;
    info!(path = %path.display(), "config_loaded");
    Ok(config)
}

fn parse_config_json(raw: &str) -> Result<ViewerConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ViewerConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use trajview::app::{Background, ColorScheme};

    use super::*;

    #[test]
    fn parse_reports_field_path_on_type_error() {
        let error = parse_config_json(r#"{ "window_width": "wide" }"#).expect_err("type error");
        assert!(error.starts_with("parse config json at window_width:"), "{error}");
    }

    #[test]
    fn parse_reports_bad_enum_variant_with_path() {
        let error = parse_config_json(r#"{ "background": "lava" }"#).expect_err("variant error");
        assert!(error.contains("at background"), "{error}");
    }

    #[test]
    fn parse_accepts_partial_config() {
        let config = parse_config_json(r#"{ "color_scheme": "light", "background": "grid_light" }"#)
            .expect("parse");
        assert_eq!(config.color_scheme, ColorScheme::Light);
        assert_eq!(config.background, Background::GridLight);
        assert_eq!(config.target_tps, ViewerConfig::default().target_tps);
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let root = tempfile::tempdir().expect("temp");
        assert_eq!(config_path(root.path(), None), None);
        let config = load_config(root.path(), None).expect("defaults");
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn default_file_under_root_is_used() {
        let root = tempfile::tempdir().expect("temp");
        fs::write(root.path().join(DEFAULT_CONFIG_FILE), r#"{ "target_tps": 30 }"#).expect("write");

        let config = load_config(root.path(), None).expect("load");
        assert_eq!(config.target_tps, 30);
    }

    #[test]
    fn explicit_path_wins_and_must_exist() {
        let root = tempfile::tempdir().expect("temp");
        fs::write(root.path().join(DEFAULT_CONFIG_FILE), r#"{ "target_tps": 30 }"#).expect("write");
        let explicit = root.path().join("custom.json");
        fs::write(&explicit, r#"{ "target_tps": 90 }"#).expect("write");

        let config = load_config(root.path(), Some(explicit.clone().into_os_string())).expect("load");
        assert_eq!(config.target_tps, 90);

        let missing = root.path().join("missing.json");
        let error = load_config(root.path(), Some(missing.into_os_string())).expect_err("missing");
        assert!(error.starts_with("read config"), "{error}");
    }

    #[test]
    fn empty_env_value_falls_back_to_default_file() {
        let root = tempfile::tempdir().expect("temp");
        assert_eq!(config_path(root.path(), Some(OsString::new())), None);
    }
}
