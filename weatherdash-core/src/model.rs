use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A city as resolved by the geocoding endpoint.
///
/// `name` is the key of a history entry and is compared case-sensitively,
/// exactly as the provider spelled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
    pub icon_code: String,
}

/// One raw forecast record as returned by the provider (3-hourly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub observed_at: DateTime<Utc>,
    /// Offset of the forecast location from UTC, in seconds.
    pub utc_offset_secs: i32,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
    pub icon_code: String,
}

/// A forecast reduced to one record per provider-local calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub observed_at: DateTime<Utc>,
    pub utc_offset_secs: i32,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub description: String,
    pub icon_code: String,
}

impl ForecastDay {
    pub fn from_sample(date: NaiveDate, sample: &ForecastSample) -> Self {
        Self {
            date,
            observed_at: sample.observed_at,
            utc_offset_secs: sample.utc_offset_secs,
            temp: sample.temp,
            feels_like: sample.feels_like,
            temp_min: sample.temp_min,
            temp_max: sample.temp_max,
            humidity: sample.humidity,
            pressure: sample.pressure,
            wind_speed: sample.wind_speed,
            description: sample.description.clone(),
            icon_code: sample.icon_code.clone(),
        }
    }

    /// Re-express this day as the raw sample it was taken from.
    pub fn to_sample(&self) -> ForecastSample {
        ForecastSample {
            observed_at: self.observed_at,
            utc_offset_secs: self.utc_offset_secs,
            temp: self.temp,
            feels_like: self.feels_like,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            description: self.description.clone(),
            icon_code: self.icon_code.clone(),
        }
    }
}

/// Everything the dashboard knows about one searched city.
///
/// Entries are replaced wholesale; nothing mutates their fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub geolocation: GeoLocation,
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

impl HistoryEntry {
    pub fn name(&self) -> &str {
        &self.geolocation.name
    }
}
