//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::transport::ProviderFailure;

/// A place-name lookup request.
///
/// The text is trimmed and guaranteed non-empty, so a `Query` that exists can
/// always be sent to the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    country_hint: Option<String>,
}

impl Query {
    pub fn new(text: &str) -> Result<Self, LocationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LocationError::InvalidInput);
        }
        Ok(Self {
            text: text.to_string(),
            country_hint: None,
        })
    }

    /// Attach a country name used to skip the country prompt. Blank hints are ignored.
    pub fn with_country(mut self, hint: Option<&str>) -> Self {
        self.country_hint = hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn country_hint(&self) -> Option<&str> {
        self.country_hint.as_deref()
    }
}

/// One geocoding result, exactly as the provider reported it.
///
/// Coordinates stay in provider-native text until a candidate is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub latitude: String,
    pub longitude: String,
    pub display_name: String,
    pub country: Option<String>,
    pub place_type: String,
}

impl Candidate {
    /// Parse the raw coordinates into degrees.
    pub fn coordinates(&self) -> Result<(f64, f64), LocationError> {
        let lat = parse_degrees(&self.latitude)
            .ok_or_else(|| LocationError::MalformedData(format!("latitude '{}'", self.latitude)))?;
        let lon = parse_degrees(&self.longitude)
            .ok_or_else(|| LocationError::MalformedData(format!("longitude '{}'", self.longitude)))?;
        Ok((lat, lon))
    }
}

fn parse_degrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A country offered during disambiguation, illustrated by its top result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryOption {
    pub country: String,
    pub example: String,
}

/// Candidates grouped by country, in the order the provider ranked them.
///
/// Keys appear in order of their first candidate; no key maps to an empty list.
#[derive(Debug, Clone, Default)]
pub struct CandidateGroups {
    groups: Vec<(String, Vec<Candidate>)>,
}

impl CandidateGroups {
    /// Group candidates by country. Candidates without a country are left out.
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let mut groups: Vec<(String, Vec<Candidate>)> = Vec::new();
        for candidate in candidates {
            let Some(country) = candidate.country.as_deref() else {
                continue;
            };
            match groups.iter_mut().find(|(key, _)| key == country) {
                Some((_, members)) => members.push(candidate.clone()),
                None => groups.push((country.to_string(), vec![candidate.clone()])),
            }
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    pub fn get(&self, country: &str) -> Option<&[Candidate]> {
        self.groups
            .iter()
            .find(|(key, _)| key == country)
            .map(|(_, members)| members.as_slice())
    }

    /// Top-ranked candidate of the first group.
    pub fn top(&self) -> Option<&Candidate> {
        self.groups.first().and_then(|(_, members)| members.first())
    }

    /// Keep only the group matching `hint` (trimmed, ASCII case-insensitive).
    ///
    /// Returns false and leaves the groups untouched when nothing matches.
    pub fn narrow_to(&mut self, hint: &str) -> bool {
        let hint = hint.trim();
        let Some(index) = self
            .groups
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(hint))
        else {
            return false;
        };
        let kept = self.groups.swap_remove(index);
        self.groups = vec![kept];
        true
    }

    /// One option per country, illustrated by that country's top result.
    pub fn options(&self) -> Vec<CountryOption> {
        self.groups
            .iter()
            .filter_map(|(country, members)| {
                members.first().map(|top| CountryOption {
                    country: country.clone(),
                    example: top.display_name.clone(),
                })
            })
            .collect()
    }
}

/// A successfully resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Whether a disambiguation prompt picked this place.
    #[serde(default)]
    pub disambiguated: bool,
}

impl ResolvedLocation {
    pub fn display_line(&self) -> String {
        let country_part = match &self.country {
            Some(country) => format!(" \u{2014} {}", country),
            None => String::new(),
        };
        format!(
            "\u{1F4CD} {}{}\n  \u{1F4D0} {}",
            self.display_name,
            country_part,
            format_coords(self.latitude, self.longitude)
        )
    }
}

/// Format coordinates as `48.8566°N, 2.3522°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

/// Outcome of a resolution. Every failure carries the reason it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedLocation),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Why a query could not be narrowed to one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    NotFound,
    Cancelled,
    /// The disambiguator answered with something that was not offered.
    NoSelection,
    MalformedData,
    Provider(ProviderFailure),
}

impl UnresolvedReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
            Self::NoSelection => "no_selection",
            Self::MalformedData => "malformed_data",
            Self::Provider(_) => "provider_error",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Cancelled => write!(f, "user cancelled"),
            Self::NoSelection => write!(f, "no valid selection"),
            Self::MalformedData => write!(f, "malformed provider data"),
            Self::Provider(failure) => write!(f, "{}", failure),
        }
    }
}

/// Full address record from a reverse lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDetails {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub address: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// Location errors surfaced to callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("location must be a non-empty string")]
    InvalidInput,
    #[error("location not found: '{0}'")]
    NotFound(String),
    #[error("geocoding provider failed: {0}")]
    Provider(#[from] ProviderFailure),
    #[error("malformed provider data: {0}")]
    MalformedData(String),
}
