//! The weather lookup exposed as a model-callable tool.
//!
//! [`definition`] is the function declaration handed to a
//! language model; [`WeatherTool::invoke`] runs a call the model made and
//! returns JSON for the model to read. Failures are returned as
//! `{"error": ...}` rather than raised, so the model can explain them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::location::{
    Disambiguator, GeocodingProvider, LocationError, LocationResolver, Query, Resolution,
    ResolvedLocation, UnresolvedReason,
};
use crate::weather::{WeatherError, WeatherProvider};

pub const TOOL_NAME: &str = "get_weather_data";

/// Arguments a model passes to the tool.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherArgs {
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_forecast")]
    pub forecast: bool,
}

fn default_forecast() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub location: ResolvedLocation,
    pub weather: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("could not resolve '{query}': {reason}")]
    Unresolved { query: String, reason: UnresolvedReason },
    #[error(transparent)]
    Weather(#[from] WeatherError),
}

/// Function declaration in the JSON-schema shape tool-calling APIs accept.
pub fn definition() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Get current weather and a 7-day forecast for a city. \
                        Pass the country when the city name exists in several countries.",
        "parameters": {
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City or place name, e.g. \"Porto\" or \"Springfield\""
                },
                "country": {
                    "type": "string",
                    "description": "Country name used to pick between same-named places, e.g. \"Portugal\""
                },
                "forecast": {
                    "type": "boolean",
                    "description": "Include the daily forecast (default true)"
                }
            },
            "required": ["city"]
        }
    })
}

/// Place resolution plus weather fetch behind one call.
pub struct WeatherTool<G, W> {
    resolver: LocationResolver<G>,
    weather: W,
}

impl<G: GeocodingProvider, W: WeatherProvider> WeatherTool<G, W> {
    pub fn new(resolver: LocationResolver<G>, weather: W) -> Self {
        Self { resolver, weather }
    }

    pub fn resolver(&self) -> &LocationResolver<G> {
        &self.resolver
    }

    pub fn weather(&self) -> &W {
        &self.weather
    }

    /// Run a tool call. Always returns JSON; failures become `{"error": ...}`.
    pub fn invoke(&self, args: &Value, prompt: &mut dyn Disambiguator) -> Value {
        let outcome = WeatherArgs::deserialize(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
            .and_then(|args| self.lookup(&args, prompt));

        match outcome {
            Ok(report) => json!({ "location": report.location, "weather": report.weather }),
            Err(err) => {
                info!(tool = TOOL_NAME, %err, "tool call failed");
                json!({ "error": err.to_string() })
            }
        }
    }

    pub fn lookup(&self, args: &WeatherArgs, prompt: &mut dyn Disambiguator) -> Result<WeatherReport, ToolError> {
        let query = Query::new(&args.city)?.with_country(args.country.as_deref());
        let location = match self.resolver.resolve(&query, prompt) {
            Resolution::Resolved(location) => location,
            Resolution::Unresolved(reason) => {
                return Err(ToolError::Unresolved {
                    query: query.text().to_string(),
                    reason,
                })
            }
        };
        let weather = self
            .weather
            .fetch(location.latitude, location.longitude, args.forecast)?;
        Ok(WeatherReport { location, weather })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::location::testing::{paris, FakeGeocoder, ScriptedPrompt};
    use crate::location::Choice;
    use crate::weather::validate_coordinates;

    /// Echoes the coordinates back as a payload.
    pub(crate) struct EchoWeather;

    impl WeatherProvider for EchoWeather {
        fn fetch(&self, latitude: f64, longitude: f64, want_forecast: bool) -> Result<Value, WeatherError> {
            validate_coordinates(latitude, longitude)?;
            Ok(json!({
                "latitude": latitude,
                "longitude": longitude,
                "current_weather": {"temperature": 18.5, "weathercode": 2},
                "forecast": want_forecast,
            }))
        }
    }

    fn tool() -> WeatherTool<FakeGeocoder, EchoWeather> {
        WeatherTool::new(LocationResolver::new(FakeGeocoder::with(paris())), EchoWeather)
    }

    #[test]
    fn test_definition_shape() {
        let def = definition();
        assert_eq!(def["name"], TOOL_NAME);
        assert_eq!(def["parameters"]["required"], json!(["city"]));
        assert!(def["parameters"]["properties"]["country"].is_object());
    }

    #[test]
    fn test_invoke_with_country_hint() {
        let mut prompt = ScriptedPrompt::new();
        let out = tool().invoke(&json!({"city": "Paris", "country": "France"}), &mut prompt);

        assert_eq!(out["location"]["country"], "France");
        assert_eq!(out["weather"]["latitude"], 48.8566);
        assert_eq!(out["weather"]["forecast"], true);
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn test_invoke_asks_when_ambiguous() {
        let mut prompt = ScriptedPrompt::new().country(Choice::Selected("United States".into()));
        let out = tool().invoke(&json!({"city": "Paris", "forecast": false}), &mut prompt);
        assert_eq!(out["location"]["country"], "United States");
        assert_eq!(out["weather"]["forecast"], false);
    }

    #[test]
    fn test_invoke_reports_why() {
        let mut prompt = ScriptedPrompt::new().country(Choice::Cancel);
        let out = tool().invoke(&json!({"city": "Paris"}), &mut prompt);
        assert_eq!(out["error"], "could not resolve 'Paris': user cancelled");

        let out = tool().invoke(&json!({"city": "   "}), &mut ScriptedPrompt::new());
        assert_eq!(out["error"], "location must be a non-empty string");

        let out = tool().invoke(&json!({"town": "Paris"}), &mut ScriptedPrompt::new());
        assert!(out["error"].as_str().unwrap().starts_with("invalid arguments"));
    }

    #[test]
    fn test_lookup_not_found() {
        let tool = WeatherTool::new(LocationResolver::new(FakeGeocoder::with(vec![])), EchoWeather);
        let args = WeatherArgs { city: "Atlantis".into(), country: None, forecast: false };
        let err = tool.lookup(&args, &mut ScriptedPrompt::new()).unwrap_err();
        assert!(matches!(
            err,
            ToolError::Unresolved { reason: UnresolvedReason::NotFound, .. }
        ));
    }
}
