use thiserror::Error;

/// Errors surfaced by the dashboard core.
///
/// Provider and store internals build their failures with `anyhow` context
/// chains; those are wrapped here so callers can branch on the kind.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid city name '{0}': only letters and spaces are allowed")]
    InvalidInput(String),

    #[error("City '{0}' was not found by the weather provider")]
    NotFound(String),

    #[error("Weather provider request failed: {0:#}")]
    Provider(anyhow::Error),

    #[error("Failed to persist search history: {0:#}")]
    Persistence(anyhow::Error),
}

impl WeatherError {
    /// A short notice suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::InvalidInput(_) => {
                "Please enter a valid city name (letters and spaces only)."
            }
            WeatherError::NotFound(_) => "City not found. Check the spelling and try again.",
            WeatherError::Provider(_) => {
                "Could not fetch weather data right now. Please try again later."
            }
            WeatherError::Persistence(_) => {
                "Search history could not be saved. Your last change was not kept."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
