use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let wiring = match app::build_app() {
        Ok(wiring) => wiring,
        Err(message) => {
            error!(error = %message, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    app::run(wiring)
}
