//! Location subsystem.
//!
//! Resolves free-text place names to coordinates through a geocoding
//! provider, with interactive disambiguation when a name matches places in
//! several countries.

pub mod prompt;
pub mod providers;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use prompt::{Choice, Disambiguator, Pending, PresetChoices, PresetThenAsk, TerminalPrompt};
pub use providers::{GeocodingProvider, Nominatim};
pub use resolver::{LocationResolver, SEARCH_LIMIT};
pub use types::{
    format_coords, BoundingBox, Candidate, CandidateGroups, CountryOption, LocationDetails,
    LocationError, Query, Resolution, ResolvedLocation, UnresolvedReason,
};
