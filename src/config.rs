//! Client configuration injected into the providers.
//!
//! Built once by the caller (the CLI fills it from flags and `METEO_*`
//! environment variables) and passed to `Nominatim::new` / `OpenMeteo::new`.

use std::time::Duration;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by every outbound HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent as `User-Agent`. Nominatim's usage policy refuses anonymous clients.
    pub user_agent: String,
    pub timeout: Duration,
    pub geocoder_url: String,
    pub weather_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build a blocking HTTP agent carrying the user agent and timeout.
    pub(crate) fn agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
    }
}

pub fn default_user_agent() -> String {
    format!("meteo/{} (weather-lookup)", env!("CARGO_PKG_VERSION"))
}

/// Strip trailing slashes so endpoint paths can be appended with `/`.
pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_public_endpoints() {
        let config = ClientConfig::default();
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("meteo/"));
    }

    #[test]
    fn test_base_url_trims_slashes() {
        assert_eq!(base_url("http://localhost:8080//"), "http://localhost:8080");
        assert_eq!(base_url("https://example.org"), "https://example.org");
    }
}
