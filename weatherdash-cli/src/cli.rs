use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use weatherdash_core::{
    Config, FileHistoryStore, HistoryEntry, OpenWeatherProvider, Session,
    provider_from_config,
};

use crate::view;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "City weather dashboard")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use this history file instead of the platform default.
    #[arg(long, global = true)]
    pub history_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key.
    Configure,

    /// Show weather for the most recent city and the search history.
    Show,

    /// Search for a city and add it to the history.
    Search {
        /// City name (letters and spaces only).
        #[arg(required = true)]
        city: Vec<String>,
    },

    /// Show a city from the history again, moving it to the front.
    Select {
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Re-fetch weather for every city in the history.
    Refresh,

    /// Forget the search history.
    Clear,

    /// List the search history without fetching anything.
    History,
}

type DashSession = Session<OpenWeatherProvider, FileHistoryStore>;

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        tracing::debug!(command = ?self.command, "Running command");

        match &self.command {
            Command::Configure => self.configure(config)?,
            Command::History => {
                let mut session = self.session(&config, false)?;
                session.load_history().map_err(view::notice)?;
                print!("{}", view::history(session.history()));
            }
            Command::Show => {
                let mut session = self.session(&config, true)?;
                let boot = session.bootstrap().await.map_err(view::notice)?;
                eprint!("{}", view::failures(&boot.failures));
                match &boot.active {
                    Some(entry) => print_entry(&session, entry),
                    None => println!("Nothing to show yet. Try `weatherdash search <city>`."),
                }
                println!();
                print!("{}", view::history(session.history()));
            }
            Command::Search { city: words } | Command::Select { name: words } => {
                let query = words.join(" ");
                let mut session = self.session(&config, true)?;
                ensure_initialized(&mut session).await?;

                let entry = if matches!(self.command, Command::Select { .. }) {
                    session.select_history_item(&query).await
                } else {
                    session.search(&query).await
                }
                .map_err(view::notice)?;

                print_entry(&session, &entry);
                println!();
                print!("{}", view::history(session.history()));
            }
            Command::Refresh => {
                let mut session = self.session(&config, true)?;
                ensure_initialized(&mut session).await?;

                let refresh = session.refresh_all().await.map_err(view::notice)?;
                eprint!("{}", view::failures(&refresh.failures));
                let refreshed = refresh.history.len().saturating_sub(refresh.failures.len());
                println!("Refreshed {refreshed} of {} cities.", refresh.history.len());
                print!("{}", view::history(&refresh.history));
            }
            Command::Clear => {
                let mut session = self.session(&config, false)?;
                session.clear_all().map_err(view::notice)?;
                println!("Search history cleared.");
            }
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    fn store(&self) -> anyhow::Result<FileHistoryStore> {
        match &self.history_file {
            Some(path) => Ok(FileHistoryStore::new(path)),
            None => FileHistoryStore::in_data_dir().map_err(view::notice),
        }
    }

    /// Build a session. Commands that never make requests can skip the
    /// API key check.
    fn session(&self, config: &Config, needs_network: bool) -> anyhow::Result<DashSession> {
        let provider = if needs_network {
            provider_from_config(config)?
        } else {
            OpenWeatherProvider::new(String::new()).with_base_url(config.base_url())
        };

        Ok(Session::new(provider, self.store()?, config.default_cities(), config.history_capacity()))
    }

    fn configure(&self, mut config: Config) -> anyhow::Result<()> {
        let api_key = inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.set_api_key(api_key.trim().to_string());

        let timeout = inquire::Text::new("Request timeout in seconds (leave empty for none):")
            .prompt()
            .context("Failed to read timeout")?;
        config.request_timeout_secs = match timeout.trim() {
            "" => None,
            secs => Some(secs.parse::<u64>().with_context(|| format!("Invalid timeout '{secs}'"))?),
        };

        match &self.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }

        println!("Configuration saved.");
        Ok(())
    }
}

/// The dashboard always starts from a populated history, so commands that
/// change it seed the default cities on first use.
async fn ensure_initialized(session: &mut DashSession) -> anyhow::Result<()> {
    if !session.load_history().map_err(view::notice)? {
        let boot = session.bootstrap().await.map_err(view::notice)?;
        eprint!("{}", view::failures(&boot.failures));
    }
    Ok(())
}

fn print_entry(session: &DashSession, entry: &HistoryEntry) {
    let provider = session.provider();
    print!("{}", view::today(entry, &provider.icon_url(&entry.current.icon_code)));
    println!();
    print!("{}", view::forecast(&entry.forecast, |code| provider.icon_url(code)));
}
