use std::process::ExitCode;

use tracing::{error, info};
use trajview::run_viewer;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_viewer(&app.config, app.simulation, app.link, app.paths.export_dir) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    info!("viewer_closed");
    ExitCode::SUCCESS
}
