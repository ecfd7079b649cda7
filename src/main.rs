use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use env_logger::Env;

use taposwitch::cli::{self, Args};
use taposwitch::config::{Config, APP_NAME};
use taposwitch::TapoConnector;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = cli::usage_exit_code(&e);
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let (config, skipped) = match Config::load(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(1);
        }
    };

    match init_logger(config.log_to_file) {
        Ok(Some(log_path)) => log::debug!("Logging to {}", log_path.display()),
        Ok(None) => (),
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(1);
        }
    }

    match (&args.config, skipped) {
        (Some(path), _) => log::debug!("Loaded config from {}", path.display()),
        (None, Some(e)) => log::warn!("{:#}; using the environment only", e),
        (None, None) => {
            if let Ok(path) = confy::get_configuration_file_path(APP_NAME, None) {
                log::debug!("Loaded config from {}", path.display());
            }
        }
    }

    let connector = TapoConnector::new(config.timeout());
    ExitCode::from(cli::run(&args, &config, &connector).await)
}

/// Logs to stderr, or to a timestamped file in the cache dir when asked to.
fn init_logger(to_file: bool) -> Result<Option<PathBuf>> {
    let mut logger_builder =
        env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    // Same directory layout as `confy`
    let log_path = match ProjectDirs::from("rs", "", APP_NAME) {
        Some(project_dirs) if to_file => {
            let now = chrono::Local::now();
            let target = project_dirs
                .cache_dir()
                .join(now.format("log_%Y%m%d_%H%M%S.log").to_string());

            fs::create_dir_all(project_dirs.cache_dir())
                .with_context(|| format!("failed to create {}", project_dirs.cache_dir().display()))?;

            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&target)
                .with_context(|| format!("failed to open log file {}", target.display()))?;
            logger_builder.target(env_logger::Target::Pipe(Box::new(file)));

            Some(target)
        }
        _ => None,
    };
    logger_builder.init();

    Ok(log_path)
}
