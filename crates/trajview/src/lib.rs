use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod atomic_io;
pub mod geometry;
pub mod trajectory;

pub use app::{
    run_viewer, AppError, ColorScheme, EntityId, FieldTransform, LoopConfig, LoopManager,
    LoopMetricsSnapshot, MetricsHandle, SimError, Simulation, ViewerConfig, ViewerLink, Viewport,
};
pub use geometry::{Pose2d, Vec2};
pub use trajectory::{
    CubicBezierPath, HeadingProfile, LinePath, PathSampler, PathSegment, Segment,
    SegmentRenderer, TrajectorySequence, TurnSegment, WaitSegment,
};

pub const ROOT_ENV_VAR: &str = "TRAJVIEW_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub export_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create export directory at {path}: {source}")]
    CreateExportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "TRAJVIEW_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/trajview\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

impl AppPaths {
    /// Lays out paths under `root`. A relative `export_dir` resolves against
    /// the root; the export directory is created if missing.
    pub fn for_root(root: PathBuf, export_dir: &Path) -> Result<Self, StartupError> {
        let assets_dir = root.join("assets");
        let export_dir = if export_dir.is_absolute() {
            export_dir.to_path_buf()
        } else {
            root.join(export_dir)
        };

        fs::create_dir_all(&export_dir).map_err(|source| StartupError::CreateExportDir {
            path: export_dir.clone(),
            source,
        })?;

        Ok(Self {
            root,
            assets_dir,
            export_dir,
        })
    }
}

pub fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_from(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = tempfile::tempdir().expect("temp");
        fs::create_dir_all(temp.path().join("assets")).expect("mkdir");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let temp = tempfile::tempdir().expect("temp");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        let nested = temp.path().join("crates/trajview_app/target/debug");
        fs::create_dir_all(&nested).expect("mkdir");

        let found = find_root_from(&nested).expect("root");
        assert_eq!(found, normalize_path(temp.path()));
    }

    #[test]
    fn relative_export_dir_resolves_under_root_and_is_created() {
        let temp = tempfile::tempdir().expect("temp");
        let paths = AppPaths::for_root(temp.path().to_path_buf(), Path::new("exports")).expect("paths");

        assert_eq!(paths.assets_dir, temp.path().join("assets"));
        assert_eq!(paths.export_dir, temp.path().join("exports"));
        assert!(paths.export_dir.is_dir());
    }

    #[test]
    fn absolute_export_dir_is_kept() {
        let root = tempfile::tempdir().expect("root");
        let elsewhere = tempfile::tempdir().expect("elsewhere");
        let target = elsewhere.path().join("shots");

        let paths = AppPaths::for_root(root.path().to_path_buf(), &target).expect("paths");
        assert_eq!(paths.export_dir, target);
        assert!(target.is_dir());
    }
}
