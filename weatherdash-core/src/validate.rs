use crate::error::{Result, WeatherError};

/// Check a raw search string and return the trimmed city name.
///
/// Only ASCII letters and whitespace are accepted; anything else is rejected
/// before a request is ever built.
pub fn validate_city_name(raw: &str) -> Result<String> {
    let name = raw.trim();

    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace());

    if !valid {
        return Err(WeatherError::InvalidInput(raw.to_string()));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_and_spaces() {
        assert_eq!(validate_city_name("New York").unwrap(), "New York");
        assert_eq!(validate_city_name("  Sofia \t").unwrap(), "Sofia");
    }

    #[test]
    fn rejects_digits_and_punctuation() {
        for raw in ["123", "Paris1", "St. Louis", "Rio-de-Janeiro"] {
            let err = validate_city_name(raw).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidInput(_)), "{raw} should be rejected");
        }
    }

    #[test]
    fn rejects_empty_and_blank_input() {
        assert!(matches!(validate_city_name(""), Err(WeatherError::InvalidInput(_))));
        assert!(matches!(validate_city_name("   "), Err(WeatherError::InvalidInput(_))));
    }
}
