//! Config validation CLI tool
//!
//! Validates an aliveim configuration file and reports any errors.

use aliveim_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an aliveim configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match aliveim_config::load_config(&config_path) {
        Ok(cfg) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", aliveim_config::CURRENT_CONFIG_VERSION);
            println!("  Listen: {}", cfg.listen.bind_addr());
            println!("  Notify URL: {}", cfg.notify.api_url);
            println!("  Notify timeout: {}ms", cfg.notify.request_timeout.as_millis());
            ExitCode::SUCCESS
        }
        Err(aliveim_config::ConfigError::ValidationFailed { errors }) => {
            eprintln!("✗ Configuration has {} error(s):", errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {}", e);
            ExitCode::from(1)
        }
    }
}
