//! Core library for the `weatherdash` city weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider client
//! - Forecast deduplication and the persisted search history
//! - The session that ties searches, refreshes and history together
//!
//! It is used by `weatherdash-cli`, which only renders what the session returns.

pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod provider;
pub mod session;
pub mod validate;

pub use config::Config;
pub use error::{Result, WeatherError};
pub use history::{FileHistoryStore, History, HistoryStore, MemoryHistoryStore};
pub use model::{CurrentWeather, ForecastDay, ForecastSample, GeoLocation, HistoryEntry};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use session::{Bootstrap, CityFailure, Refresh, SearchState, Session};
