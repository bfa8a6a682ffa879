//! Weather data: the provider seam and the Open-Meteo client.

use serde_json::Value;
use tracing::debug;

use crate::config::{base_url, ClientConfig};
use crate::transport::{read_json, ProviderFailure};

/// Daily series requested with a forecast.
pub const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";
pub const FORECAST_DAYS: u8 = 7;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error(
        "coordinates out of range ({latitude}, {longitude}): latitude must be within -90..90 \
         and longitude within -180..180 degrees"
    )]
    InvalidRange { latitude: f64, longitude: f64 },
    #[error("weather provider failed: {0}")]
    Provider(#[from] ProviderFailure),
}

pub trait WeatherProvider {
    /// Current conditions, plus the daily forecast when `want_forecast` is set.
    ///
    /// The payload is passed through in the provider's own shape.
    fn fetch(&self, latitude: f64, longitude: f64, want_forecast: bool) -> Result<Value, WeatherError>;
}

impl<W: WeatherProvider + ?Sized> WeatherProvider for Box<W> {
    fn fetch(&self, latitude: f64, longitude: f64, want_forecast: bool) -> Result<Value, WeatherError> {
        (**self).fetch(latitude, longitude, want_forecast)
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeatherError> {
    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(WeatherError::InvalidRange { latitude, longitude })
    }
}

/// Open-Meteo forecast API client.
pub struct OpenMeteo {
    agent: ureq::Agent,
    base_url: String,
}

impl OpenMeteo {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.agent(),
            base_url: base_url(&config.weather_url),
        }
    }
}

impl WeatherProvider for OpenMeteo {
    fn fetch(&self, latitude: f64, longitude: f64, want_forecast: bool) -> Result<Value, WeatherError> {
        validate_coordinates(latitude, longitude)?;

        let url = format!("{}/v1/forecast", self.base_url);
        debug!(%url, latitude, longitude, want_forecast, "open-meteo fetch");

        let mut request = self
            .agent
            .get(&url)
            .query("latitude", &latitude.to_string())
            .query("longitude", &longitude.to_string())
            .query("current_weather", "true");
        if want_forecast {
            request = request
                .query("daily", DAILY_FIELDS)
                .query("forecast_days", &FORECAST_DAYS.to_string());
        }

        let response = request.call().map_err(ProviderFailure::from)?;
        Ok(read_json(response)?)
    }
}
