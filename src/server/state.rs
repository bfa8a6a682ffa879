use crate::location::GeocodingProvider;
use crate::tool::WeatherTool;
use crate::weather::WeatherProvider;

pub type DynGeocoder = Box<dyn GeocodingProvider + Send + Sync>;
pub type DynWeather = Box<dyn WeatherProvider + Send + Sync>;

pub struct AppState {
    pub tool: WeatherTool<DynGeocoder, DynWeather>,
}
