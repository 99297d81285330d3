//! Plain-text rendering of the session's view-models.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use weatherdash_core::{CityFailure, CurrentWeather, ForecastDay, History, HistoryEntry, WeatherError};

fn full_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d %b %Y").to_string()
}

fn weekday(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%A").to_string()
}

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Card for the city currently on display.
pub fn today(entry: &HistoryEntry, icon_url: &str) -> String {
    let geo = &entry.geolocation;
    let w: &CurrentWeather = &entry.current;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}, {}  {} {}",
        geo.name,
        geo.country_code,
        full_date(w.observed_at),
        weekday(w.observed_at)
    );
    let _ = writeln!(out, "  {}  ({})", w.description, icon_url);
    let _ = writeln!(
        out,
        "  Temp {:.1} °C   Feels {:.1} °C   Min {:.1} °C   Max {:.1} °C",
        w.temp, w.feels_like, w.temp_min, w.temp_max
    );
    let _ = writeln!(
        out,
        "  Humidity {} %   Pressure {} hPa   Wind {:.1} m/s",
        w.humidity, w.pressure, w.wind_speed
    );
    let _ = writeln!(out, "  Sunrise {}   Sunset {}", clock(w.sunrise), clock(w.sunset));

    out
}

/// One line per forecast day.
pub fn forecast(days: &[ForecastDay], icon_url: impl Fn(&str) -> String) -> String {
    let mut out = String::new();

    for day in days {
        let _ = writeln!(
            out,
            "{} {}  {:>5.1} °C (feels {:.1})  {:.1}..{:.1} °C  {:>3} %  {} hPa  {:.1} m/s  {}  {}",
            day.date.format("%d %b %Y"),
            day.date.format("%a"),
            day.temp,
            day.feels_like,
            day.temp_min,
            day.temp_max,
            day.humidity,
            day.pressure,
            day.wind_speed,
            day.description,
            icon_url(&day.icon_code),
        );
    }

    out
}

/// The recency list, most recent first.
pub fn history(history: &History) -> String {
    if history.is_empty() {
        return "No search history yet.\n".to_string();
    }

    let mut out = String::new();
    for (i, entry) in history.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}, {}", i + 1, entry.name(), entry.geolocation.country_code);
    }
    out
}

pub fn failures(failures: &[CityFailure]) -> String {
    let mut out = String::new();
    for f in failures {
        let _ = writeln!(out, "warning: {}: {}", f.city, f.error.user_message());
    }
    out
}

/// Turn a core error into the notice shown to the user.
pub fn notice(err: WeatherError) -> anyhow::Error {
    match err {
        WeatherError::InvalidInput(_) | WeatherError::NotFound(_) => {
            anyhow::anyhow!("{}", err.user_message())
        }
        other => anyhow::anyhow!("{}\n  caused by: {}", other.user_message(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use weatherdash_core::GeoLocation;

    fn entry(name: &str) -> HistoryEntry {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        HistoryEntry {
            geolocation: GeoLocation {
                name: name.into(),
                lat: 51.5,
                lon: -0.12,
                country_code: "GB".into(),
            },
            current: CurrentWeather {
                temp: 11.24,
                feels_like: 10.1,
                temp_min: 9.0,
                temp_max: 12.5,
                sunrise: at,
                sunset: at,
                observed_at: at,
                humidity: 81,
                pressure: 1009,
                wind_speed: 4.6,
                description: "Rain".into(),
                icon_code: "10d".into(),
            },
            forecast: vec![ForecastDay {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                observed_at: at,
                utc_offset_secs: 0,
                temp: 6.0,
                feels_like: 4.5,
                temp_min: 5.0,
                temp_max: 7.0,
                humidity: 70,
                pressure: 1012,
                wind_speed: 3.1,
                description: "Clouds".into(),
                icon_code: "04d".into(),
            }],
        }
    }

    #[test]
    fn today_card_shows_measurements() {
        let card = today(&entry("London"), "http://icons/10d.png");

        assert!(card.starts_with("London, GB"));
        assert!(card.contains("Temp 11.2 °C"));
        assert!(card.contains("Pressure 1009 hPa"));
        assert!(card.contains("http://icons/10d.png"));
    }

    #[test]
    fn forecast_lines_show_date_and_weekday() {
        let out = forecast(&entry("London").forecast, |code| format!("<{code}>"));

        assert!(out.starts_with("02 Mar 2024 Sat"));
        assert!(out.contains("<04d>"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn history_list_is_numbered() {
        let h = History::from_ordered([entry("London"), entry("Paris")], 5);

        assert_eq!(history(&h), " 1. London, GB\n 2. Paris, GB\n");
        assert_eq!(history(&History::new()), "No search history yet.\n");
    }

    #[test]
    fn provider_notice_includes_cause() {
        let err = notice(WeatherError::Provider(anyhow::anyhow!("status 500")));
        let msg = err.to_string();

        assert!(msg.contains("Could not fetch weather data"));
        assert!(msg.contains("status 500"));

        let err = notice(WeatherError::NotFound("Atlantis".into()));
        assert!(err.to_string().contains("City not found"));
    }
}
