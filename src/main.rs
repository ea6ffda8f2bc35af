use clap::Parser;
use std::process::ExitCode;
use vortex::cli::{run_cli, Cli};
use vortex::logging::{init_logging_with_config, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut log_config = LogConfig::from_env();
    // Keep stdout for command output unless asked otherwise
    if std::env::var_os("VORTEX_LOG_LEVEL").is_none() {
        log_config.log_level = "warn".to_string();
    }
    if let Err(e) = init_logging_with_config(&log_config) {
        eprintln!("warning: {e:#}");
    }
    match run_cli(cli, &mut std::io::stdout().lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
