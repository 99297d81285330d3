use crate::{
    Config,
    error::Result,
    model::{CurrentWeather, ForecastSample, GeoLocation},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of geocoding and weather data.
///
/// Every call is a single request/response with no caching or retry.
/// A city that the provider cannot find is `WeatherError::NotFound`; any
/// transport, status or payload problem is `WeatherError::Provider`.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a city name to its best single match.
    async fn resolve_city(&self, name: &str) -> Result<GeoLocation>;

    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentWeather>;

    /// Raw forecast timeline in provider order, not deduplicated.
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastSample>>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key()?;

    Ok(OpenWeatherProvider::new(api_key)
        .with_base_url(config.base_url())
        .with_timeout(config.request_timeout()))
}
