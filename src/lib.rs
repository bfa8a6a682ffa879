//! meteo — weather for free-text place names.
//!
//! A place name is geocoded through [`location::LocationResolver`], which asks
//! a [`location::Disambiguator`] whenever the name matches places in more
//! than one country. The resulting coordinates feed a
//! [`weather::WeatherProvider`]. [`tool::WeatherTool`] bundles both steps
//! behind the tool interface a language model can call.

pub mod config;
pub mod location;
pub mod server;
pub mod tool;
pub mod transport;
pub mod weather;
