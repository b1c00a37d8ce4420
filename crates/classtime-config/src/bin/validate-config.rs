//! Config validation CLI tool
//!
//! Validates a classtime configuration file and reports any errors.

use classtime_config::{ConfigError, CURRENT_CONFIG_VERSION, load_config};
use classtime_util::default_config_path;
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
            eprintln!("Validates a classtime configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match load_config(&config_path) {
        Ok(catalog) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!(
                "  Teaching hours: {:02}:00-{:02}:00 starts",
                catalog.rules.first_hour, catalog.rules.last_hour
            );
            println!("  Classrooms: {}", catalog.classrooms.len());
            println!(
                "  Schedules: {} ({} approved)",
                catalog.schedules.len(),
                catalog.approved().count()
            );

            if !catalog.schedules.is_empty() {
                println!();
                println!("Schedules:");
                for schedule in &catalog.schedules {
                    let sessions: Vec<String> =
                        schedule.sessions.iter().map(|s| s.to_string()).collect();
                    println!(
                        "  - {} [{}] {} in {} by {}, {} to {}: {}",
                        schedule.id,
                        if schedule.approved { "approved" } else { "pending" },
                        schedule.subject,
                        catalog.classroom_label(&schedule.classroom_id),
                        schedule.tutor_id,
                        schedule.start(),
                        schedule.end(),
                        sessions.join(", ")
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
