//! 🚀 ipx-cli: the front door, the bouncer, the maitre d' of ipx.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that parses args, loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🗂️ Flatten GitHub issue dumps into spreadsheets, and push computed metrics back to Postgres.
#[derive(Debug, Parser)]
#[command(name = "ipx", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 🧱 Project an issues document into a delimited table.
    Project {
        /// TOML config; if it doesn't exist, only IPX_* environment variables are used
        #[arg(default_value = "ipx.toml")]
        config: PathBuf,
    },
    /// 📈 Write a metrics document into a Postgres table, one UPDATE per metric.
    UpdateMetrics {
        /// TOML config; if it doesn't exist, only IPX_* environment variables are used
        #[arg(default_value = "ipx.toml")]
        config: PathBuf,
    },
}

/// 🔒 Validate the config file exists before we get too emotionally attached.
/// Missing file → `None` → environment only.
fn existing_config(config_file: &Path) -> Result<Option<&Path>> {
    let exists = config_file.try_exists().context(format!(
        "💀 Couldn't even check whether the configuration file exists. Maybe it's a permissions thing, \
         maybe it's pwd/cwd and relative paths. Use an absolute path, to be absolutely certain. \
         Was checking here: '{}'",
        config_file.display()
    ))?;
    Ok(exists.then_some(config_file))
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Project { config } => {
            let app_config = ipx::app_config::load_config::<ipx::app_config::ProjectorConfig>(
                existing_config(&config)?,
            )
            .context("💀 In ipx-cli, we couldn't load the projector config. Make sure [projection], [source_config] and [sink_config] are all there.")?;

            let summary = ipx::run(app_config).await?;
            println!("{}", summary.to_table());
        }
        Command::UpdateMetrics { config } => {
            let app_config = ipx::app_config::load_config::<ipx::app_config::MetricsConfig>(
                existing_config(&config)?,
            )
            .context("💀 In ipx-cli, we couldn't load the metrics config. Make sure [metrics_source], [database] and [update] are all there.")?;

            let summary = ipx::update_metrics(app_config).await?;
            println!("{}", summary.to_table());
        }
    }
    Ok(())
}

/// 🚀 main(): where it all begins. The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config and run the subcommand
/// 4. Handle errors (cry, then exit 1)
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli.command).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one layer at a time
        let mut the_vibes_are_giving_connection_issues = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            let cause_str = cause.to_string();
            if cause_str.contains("Connection refused")
                || cause_str.contains("connection refused")
                || cause_str.contains("pool timed out")
                || cause_str.contains("password authentication failed")
            {
                the_vibes_are_giving_connection_issues = true;
            }
        }

        if the_vibes_are_giving_connection_issues {
            error!(
                "🔧 hint: looks like Postgres isn't reachable or didn't like the credentials. \
                Double-check [database] host, port, user and password. If you're using Docker, try \
                `docker ps` to see what's up, or `docker compose up -d` to resurrect it. ☕"
            );
        }

        // 🗑️ Exit with prejudice.
        std::process::exit(1);
    }
}
