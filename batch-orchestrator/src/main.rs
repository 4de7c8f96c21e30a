mod driver;
mod infrastructure;

use std::process::ExitCode;

use colored::Colorize;
use infrastructure::{
    config::{build_config, AppConfig},
    telemetry::initialize_telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match build_config().and_then(|config| Ok(config.try_deserialize::<AppConfig>()?)) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to build config".red());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = initialize_telemetry(&config.common.telemetry) {
        eprintln!("{}: {e}", "Failed to initialize logger".red());
        return ExitCode::FAILURE;
    }

    driver::run(config).await
}
