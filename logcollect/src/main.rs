//! kubectl logCollect - Entry Point
//!
//! Installed on the PATH as `kubectl-logCollect` so kubectl picks it up as
//! the `logCollect` plugin.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use logcollect::app::options::{AppOptions, Cli};
use logcollect::app::run::run;
use logcollect::cluster::KubectlClient;
use logcollect::console;
use logcollect::exit::codes;
use logcollect::logs::{init_logging, LogOptions};
use logcollect::storage::layout::StorageLayout;
use logcollect::storage::settings::Settings;
use logcollect::utils::version_info;

use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            if e.use_stderr() {
                console::farewell();
            }
            std::process::exit(e.exit_code());
        }
    };

    let layout = StorageLayout::default();
    let settings = match load_settings(&cli, &layout).await {
        Ok(settings) => settings,
        Err(e) => {
            console::failure(format!("Error: {:#}", e));
            console::farewell();
            std::process::exit(codes::IO_ERROR);
        }
    };

    let log_options = LogOptions {
        log_level: settings.log_level,
        json_format: settings.log_json,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }
    debug!("Version: {:?}", version_info());
    debug!("Settings: {:?}", settings);

    console::notice("Reading arguments...");
    let cluster = Arc::new(KubectlClient::new(settings.kubectl_path.clone()));
    let options = AppOptions::new(settings, cli.selection(), &layout);

    let code = run(options, cluster).await;
    std::process::exit(code);
}

async fn load_settings(cli: &Cli, layout: &StorageLayout) -> anyhow::Result<Settings> {
    let file = cli.settings_file(layout);
    let mut settings = Settings::load(&file)
        .await
        .with_context(|| format!("unable to load settings from {}", file.path().display()))?;
    cli.apply(&mut settings);
    Ok(settings)
}
