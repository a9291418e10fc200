use anyhow::Context;
use clap::{Parser, Subcommand};
use lmengine_core::logger::DEFAULT_CHANNEL;
use lmengine_core::{ConfigStore, EngineSettings, Layout, LogService};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inspect and edit the engine configuration, or append to its logs.
#[derive(Debug, Parser)]
#[command(name = "lmengine", about = "Engine configuration and log utility")]
struct Cli {
    /// Installation root (defaults to $LMENGINE_HOME or the current directory).
    #[arg(long, global = true)]
    home: Option<PathBuf>,
    /// Path to the INI config file (defaults to <home>/config/config.ini).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resolved engine settings as TOML.
    Show {
        /// Print the engine secret instead of masking it.
        #[arg(long)]
        reveal_secret: bool,
    },
    /// Print one option value.
    Get { section: String, option: String },
    /// Print every option of a section.
    Options { section: String },
    /// List section names.
    Sections,
    /// Overwrite an existing option.
    Set { section: String, option: String, value: String },
    /// Append one line to a log file.
    Log {
        /// Record at ERROR instead of INFO.
        #[arg(long)]
        error: bool,
        /// Destination file (defaults to <home>/log/engine_run.log).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        message: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = cli.home.map(Layout::new).unwrap_or_else(Layout::from_env);
    let config_path = cli.config.unwrap_or_else(|| layout.config_file());

    match cli.command {
        Command::Show { reveal_secret } => {
            let mut settings = EngineSettings::load(&config_path, layout.browser_dir())
                .with_context(|| format!("loading settings from {}", config_path.display()))?;
            if !reveal_secret {
                settings.engine_secret = "********".into();
            }
            print!("{}", toml::to_string(&settings)?);
        }
        Command::Get { section, option } => {
            let store = ConfigStore::open(&config_path)?;
            println!("{}", store.get(&section, &option)?);
        }
        Command::Options { section } => {
            let store = ConfigStore::open(&config_path)?;
            for (option, value) in store.get_all(&section)? {
                println!("{option} = {value}");
            }
        }
        Command::Sections => {
            let store = ConfigStore::open(&config_path)?;
            for section in store.sections()? {
                println!("{section}");
            }
        }
        Command::Set { section, option, value } => {
            let store = ConfigStore::open(&config_path)?;
            store.set(&section, &option, &value)?;
            tracing::info!(section = %section, option = %option, "updated {}", config_path.display());
        }
        Command::Log { error, file, message } => {
            let destination = file.unwrap_or_else(|| layout.default_log_file());
            let logger = LogService::new().channel(DEFAULT_CHANNEL);
            if error {
                logger.error(&message, &destination);
            } else {
                logger.info(&message, &destination);
            }
        }
    }

    Ok(())
}
