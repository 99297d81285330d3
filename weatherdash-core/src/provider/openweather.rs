use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::DEFAULT_BASE_URL,
    error::{Result, WeatherError},
    model::{CurrentWeather, ForecastSample, GeoLocation},
};

use super::WeatherProvider;

const UNITS: &str = "metric";
const LANG: &str = "en";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// URL of the small condition icon for `icon_code`.
    pub fn icon_url(&self, icon_code: &str) -> String {
        format!("{}/img/w/{}.png", self.base_url, icon_code)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "Requesting OpenWeather {what}");

        let mut req = self.http.get(&url).query(query).query(&[("appid", self.api_key.as_str())]);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let res = req
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }

    async fn geocode(&self, name: &str) -> anyhow::Result<Vec<OwGeo>> {
        self.get_json("/geo/1.0/direct", &[("q", name), ("limit", "1")], "geocoding").await
    }

    async fn current(&self, lat: f64, lon: f64) -> anyhow::Result<CurrentWeather> {
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let parsed: OwCurrentResponse = self
            .get_json(
                "/data/2.5/weather",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", UNITS), ("lang", LANG)],
                "current weather",
            )
            .await?;

        let (description, icon_code) = condition(&parsed.weather);

        Ok(CurrentWeather {
            temp: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            sunrise: unix_to_utc(parsed.sys.sunrise)?,
            sunset: unix_to_utc(parsed.sys.sunset)?,
            observed_at: unix_to_utc(parsed.dt)?,
            humidity: parsed.main.humidity,
            pressure: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            description,
            icon_code,
        })
    }

    async fn forecast(&self, lat: f64, lon: f64) -> anyhow::Result<Vec<ForecastSample>> {
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let parsed: OwForecastResponse = self
            .get_json(
                "/data/2.5/forecast",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", UNITS), ("lang", LANG)],
                "forecast",
            )
            .await?;

        let utc_offset_secs = parsed.city.map(|c| c.timezone).unwrap_or(0);

        parsed
            .list
            .into_iter()
            .map(|entry| {
                let (description, icon_code) = condition(&entry.weather);
                Ok(ForecastSample {
                    observed_at: unix_to_utc(entry.dt)?,
                    utc_offset_secs,
                    temp: entry.main.temp,
                    feels_like: entry.main.feels_like,
                    temp_min: entry.main.temp_min,
                    temp_max: entry.main.temp_max,
                    humidity: entry.main.humidity,
                    pressure: entry.main.pressure,
                    wind_speed: entry.wind.speed,
                    description,
                    icon_code,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OwGeo {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    sys: OwSys,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn resolve_city(&self, name: &str) -> Result<GeoLocation> {
        let matches = self.geocode(name).await.map_err(WeatherError::Provider)?;

        let geo = matches.into_iter().next().ok_or_else(|| WeatherError::NotFound(name.to_string()))?;
        tracing::debug!(query = name, resolved = %geo.name, "Geocoded city");

        Ok(GeoLocation { name: geo.name, lat: geo.lat, lon: geo.lon, country_code: geo.country })
    }

    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentWeather> {
        self.current(lat, lon).await.map_err(WeatherError::Provider)
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastSample>> {
        self.forecast(lat, lon).await.map_err(WeatherError::Provider)
    }
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.main.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

fn unix_to_utc(ts: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("OpenWeather returned invalid timestamp {ts}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
