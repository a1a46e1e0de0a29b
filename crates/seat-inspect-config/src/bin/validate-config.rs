//! Config validation CLI tool
//!
//! Validates a seat-inspect configuration file and reports any errors.

use seat_inspect_api::Category;
use seat_inspect_util::default_config_path;
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
            eprintln!("Validates a seat-inspect configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match seat_inspect_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", seat_inspect_config::CURRENT_CONFIG_VERSION);
            println!("  loginctl: {}", config.fetch.loginctl);
            println!("  Concurrency: {}", config.fetch.concurrency);
            println!("  Deadline: {}s", config.fetch.deadline.as_secs());
            println!(
                "  Leader probing: {}",
                if config.fetch.probe_leaders { "on" } else { "off" }
            );

            println!();
            println!("Checks:");
            for category in Category::ALL {
                let state = if config.checks.is_enabled(category) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("  - {} [{}]: {}", category.tag(), state, category.description());
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                seat_inspect_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                seat_inspect_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                seat_inspect_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                seat_inspect_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        seat_inspect_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
