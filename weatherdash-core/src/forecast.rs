//! Reduce the provider's 3-hourly forecast timeline to one record per day.

use std::collections::HashSet;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::model::{ForecastDay, ForecastSample};

/// Provider-local calendar date of a sample.
///
/// Offsets outside the valid `FixedOffset` range fall back to UTC.
pub fn local_date(sample: &ForecastSample) -> NaiveDate {
    let offset = FixedOffset::east_opt(sample.utc_offset_secs).unwrap_or_else(|| Utc.fix());

    sample.observed_at.with_timezone(&offset).date_naive()
}

/// Keep the first sample seen for each date, in input order.
pub fn collapse(samples: &[ForecastSample]) -> Vec<ForecastDay> {
    let mut seen = HashSet::new();

    samples
        .iter()
        .filter_map(|sample| {
            let date = local_date(sample);
            seen.insert(date).then(|| ForecastDay::from_sample(date, sample))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(ts: &str, temp: f64) -> ForecastSample {
        let observed_at = chrono::DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc);
        ForecastSample {
            observed_at,
            utc_offset_secs: 0,
            temp,
            feels_like: temp,
            temp_min: temp - 1.0,
            temp_max: temp + 1.0,
            humidity: 70,
            pressure: 1012,
            wind_speed: 3.5,
            description: "Clouds".into(),
            icon_code: "04d".into(),
        }
    }

    #[test]
    fn keeps_first_sample_of_each_date() {
        let samples = vec![
            sample("2024-03-01T21:00:00Z", 8.0),
            sample("2024-03-02T00:00:00Z", 6.0),
            sample("2024-03-02T03:00:00Z", 5.0),
            sample("2024-03-03T00:00:00Z", 9.0),
        ];

        let days = collapse(&samples);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(days[1].temp, 6.0);
        assert_eq!(days[2].temp, 9.0);
    }

    #[test]
    fn input_order_decides_which_sample_survives() {
        let samples = vec![
            sample("2024-03-02T03:00:00Z", 5.0),
            sample("2024-03-02T00:00:00Z", 6.0),
        ];

        let days = collapse(&samples);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temp, 5.0);
    }

    #[test]
    fn date_follows_the_provider_offset() {
        // 23:00 UTC is already the next day at UTC+2.
        let mut s = sample("2024-03-01T23:00:00Z", 4.0);
        s.utc_offset_secs = 2 * 3600;

        assert_eq!(local_date(&s), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());

        s.utc_offset_secs = -5 * 3600;
        assert_eq!(local_date(&s), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn collapse_is_idempotent() {
        let samples: Vec<_> = (0..16)
            .map(|i| {
                let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(3 * i);
                sample(&ts.to_rfc3339(), i as f64)
            })
            .collect();

        let once = collapse(&samples);
        let resampled: Vec<_> = once.iter().map(ForecastDay::to_sample).collect();

        assert_eq!(collapse(&resampled), once);
    }

    #[test]
    fn empty_input_gives_empty_forecast() {
        assert!(collapse(&[]).is_empty());
    }
}
