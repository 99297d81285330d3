//! Orchestrates provider calls, history bookkeeping and the active view.

use futures::future::join_all;

use crate::{
    error::{Result, WeatherError},
    forecast::collapse,
    history::{History, HistoryStore},
    model::{GeoLocation, HistoryEntry},
    provider::WeatherProvider,
    validate::validate_city_name,
};

/// Progress of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    ResolvingCity,
    FetchingCurrent,
    FetchingForecast,
    Merging,
    Rendering,
}

/// A city or entry that could not be loaded during a fan-out operation.
#[derive(Debug)]
pub struct CityFailure {
    pub city: String,
    pub error: WeatherError,
}

#[derive(Debug)]
pub struct Bootstrap {
    pub history: History,
    pub active: Option<HistoryEntry>,
    /// True when the history was built from the default city list.
    pub seeded: bool,
    pub failures: Vec<CityFailure>,
}

#[derive(Debug)]
pub struct Refresh {
    pub history: History,
    pub failures: Vec<CityFailure>,
}

/// Owns the search history and the entry currently on display.
///
/// Every mutating operation takes `&mut self`, so at most one write to the
/// store is in flight at a time.
#[derive(Debug)]
pub struct Session<P, S> {
    provider: P,
    store: S,
    default_cities: Vec<String>,
    capacity: usize,
    history: History,
    active: Option<HistoryEntry>,
    state: SearchState,
}

impl<P: WeatherProvider, S: HistoryStore> Session<P, S> {
    pub fn new(provider: P, store: S, default_cities: Vec<String>, capacity: usize) -> Self {
        Self {
            provider,
            store,
            default_cities,
            capacity: capacity.max(1),
            history: History::new(),
            active: None,
            state: SearchState::Idle,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn active(&self) -> Option<&HistoryEntry> {
        self.active.as_ref()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the persisted history without touching the network.
    ///
    /// Returns `false` when nothing has been stored yet.
    pub fn load_history(&mut self) -> Result<bool> {
        match self.store.load()? {
            Some(history) => {
                self.active = history.first().cloned();
                self.history = history;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load the persisted history, seeding it from the default cities on
    /// first run, then refresh the first entry as the active view.
    pub async fn bootstrap(&mut self) -> Result<Bootstrap> {
        let mut failures = Vec::new();

        let (history, seeded) = match self.store.load()? {
            Some(history) => {
                tracing::debug!(entries = history.len(), "Using persisted history");
                (history, false)
            }
            None => {
                tracing::info!(cities = self.default_cities.len(), "No history yet, loading default cities");
                let history = self.seed(&mut failures).await;
                if !history.is_empty() {
                    self.store.save(&history)?;
                }
                (history, true)
            }
        };

        let active = match history.first() {
            Some(first) => match fetch_weather(&self.provider, first.geolocation.clone()).await {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::warn!(city = %first.name(), %error, "Failed to refresh active city");
                    failures.push(CityFailure { city: first.name().to_string(), error });
                    Some(first.clone())
                }
            },
            None => None,
        };

        self.history = history.clone();
        self.active = active.clone();

        Ok(Bootstrap { history, active, seeded, failures })
    }

    async fn seed(&self, failures: &mut Vec<CityFailure>) -> History {
        let lookups = self.default_cities.iter().map(|city| fetch_city(&self.provider, city));
        let results = join_all(lookups).await;

        let mut entries = Vec::with_capacity(results.len());
        for (city, result) in self.default_cities.iter().zip(results) {
            match result {
                Ok(entry) => entries.push(entry),
                Err(error) => {
                    tracing::warn!(%city, %error, "Failed to load default city");
                    failures.push(CityFailure { city: city.clone(), error });
                }
            }
        }

        History::from_ordered(entries, self.capacity)
    }

    /// Search for a city and record it as the most recent entry.
    ///
    /// On any failure the history and the store are left as they were.
    pub async fn search(&mut self, city: &str) -> Result<HistoryEntry> {
        let name = validate_city_name(city)?;
        self.search_named(&name).await
    }

    /// A city picked from the history list is searched again, which also
    /// moves it to the front.
    ///
    /// The name comes from the provider, so only emptiness is checked; names
    /// such as "São Paulo" must stay selectable.
    pub async fn select_history_item(&mut self, name: &str) -> Result<HistoryEntry> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::InvalidInput(name.to_string()));
        }
        self.search_named(name).await
    }

    async fn search_named(&mut self, name: &str) -> Result<HistoryEntry> {
        let result = self.run_search(name).await;
        self.transition(SearchState::Idle);

        if let Err(error) = &result {
            tracing::debug!(city = %name, %error, "Search aborted");
        }
        result
    }

    async fn run_search(&mut self, name: &str) -> Result<HistoryEntry> {
        self.transition(SearchState::ResolvingCity);
        let geolocation = self.provider.resolve_city(name).await?;

        self.transition(SearchState::FetchingCurrent);
        let current = self.provider.fetch_current(geolocation.lat, geolocation.lon).await?;

        self.transition(SearchState::FetchingForecast);
        let samples = self.provider.fetch_forecast(geolocation.lat, geolocation.lon).await?;

        self.transition(SearchState::Merging);
        let entry = HistoryEntry { geolocation, current, forecast: collapse(&samples) };
        let history = self.history.upsert_most_recent(entry.clone(), self.capacity);
        self.store.save(&history)?;
        self.history = history;

        self.transition(SearchState::Rendering);
        self.active = Some(entry.clone());

        tracing::info!(city = %entry.name(), entries = self.history.len(), "Search recorded");
        Ok(entry)
    }

    /// Re-fetch weather for every entry using its stored coordinates.
    ///
    /// Entries that fail keep their previous data. The result is persisted
    /// once all refreshes have settled.
    pub async fn refresh_all(&mut self) -> Result<Refresh> {
        let refreshes =
            self.history.iter().map(|entry| fetch_weather(&self.provider, entry.geolocation.clone()));
        let results = join_all(refreshes).await;

        let mut failures = Vec::new();
        let mut replacements = Vec::with_capacity(results.len());
        for (old, result) in self.history.iter().zip(results) {
            match result {
                Ok(entry) => replacements.push(Some(entry)),
                Err(error) => {
                    tracing::warn!(city = %old.name(), %error, "Failed to refresh city");
                    failures.push(CityFailure { city: old.name().to_string(), error });
                    replacements.push(None);
                }
            }
        }

        let history = self.history.with_replacements(replacements);
        self.store.save(&history)?;
        self.history = history.clone();

        let updated = self.active.as_ref().and_then(|active| self.history.get(active.name())).cloned();
        if updated.is_some() {
            self.active = updated;
        }

        tracing::info!(entries = history.len(), failed = failures.len(), "History refreshed");
        Ok(Refresh { history, failures })
    }

    /// Forget the whole history, including the persisted copy.
    pub fn clear_all(&mut self) -> Result<()> {
        self.store.clear()?;
        self.history = History::new();
        self.active = None;

        tracing::info!("History cleared");
        Ok(())
    }

    fn transition(&mut self, next: SearchState) {
        tracing::debug!(from = ?self.state, to = ?next, "Search state");
        self.state = next;
    }
}

async fn fetch_city<P: WeatherProvider>(provider: &P, city: &str) -> Result<HistoryEntry> {
    let geolocation = provider.resolve_city(city).await?;
    fetch_weather(provider, geolocation).await
}

async fn fetch_weather<P: WeatherProvider>(
    provider: &P,
    geolocation: GeoLocation,
) -> Result<HistoryEntry> {
    let current = provider.fetch_current(geolocation.lat, geolocation.lon).await?;
    let samples = provider.fetch_forecast(geolocation.lat, geolocation.lon).await?;

    Ok(HistoryEntry { geolocation, current, forecast: collapse(&samples) })
}
