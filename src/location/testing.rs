//! In-memory geocoder and scripted disambiguator for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::prompt::{Choice, Disambiguator};
use super::providers::GeocodingProvider;
use super::types::{Candidate, CountryOption, LocationDetails, LocationError};
use crate::transport::ProviderFailure;

pub fn candidate(lat: &str, lon: &str, name: &str, country: Option<&str>) -> Candidate {
    Candidate {
        latitude: lat.into(),
        longitude: lon.into(),
        display_name: name.into(),
        country: country.map(str::to_string),
        place_type: "city".into(),
    }
}

/// Paris in France plus Paris, Texas.
pub fn paris() -> Vec<Candidate> {
    vec![
        candidate("48.8566", "2.3522", "Paris, Île-de-France, France", Some("France")),
        candidate("33.6609", "-95.5555", "Paris, Lamar County, Texas, United States", Some("United States")),
    ]
}

/// Returns the same canned response to every search and counts the calls.
pub struct FakeGeocoder {
    response: Result<Vec<Candidate>, ProviderFailure>,
    searches: AtomicUsize,
}

impl FakeGeocoder {
    pub fn with(candidates: Vec<Candidate>) -> Self {
        Self {
            response: Ok(candidates),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn failing(failure: ProviderFailure) -> Self {
        Self {
            response: Err(failure),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl GeocodingProvider for FakeGeocoder {
    fn search(&self, _text: &str, limit: usize) -> Result<Vec<Candidate>, ProviderFailure> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map(|c| c.into_iter().take(limit).collect())
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, LocationError> {
        Ok(LocationDetails {
            latitude,
            longitude,
            display_name: format!("near {}, {}", latitude, longitude),
            address: [("country".to_string(), "Testland".to_string())].into(),
            bounding_box: None,
        })
    }
}

/// Which question a disambiguator was asked.
#[derive(Debug, Clone, PartialEq)]
pub enum Asked {
    Country(Vec<String>),
    Candidate(usize),
}

/// Replays scripted answers and records every question.
#[derive(Default)]
pub struct ScriptedPrompt {
    countries: VecDeque<Choice<String>>,
    candidates: VecDeque<Choice<usize>>,
    pub asked: Vec<Asked>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn country(mut self, choice: Choice<String>) -> Self {
        self.countries.push_back(choice);
        self
    }

    pub fn candidate(mut self, choice: Choice<usize>) -> Self {
        self.candidates.push_back(choice);
        self
    }
}

impl Disambiguator for ScriptedPrompt {
    fn choose_country(&mut self, options: &[CountryOption]) -> Choice<String> {
        self.asked
            .push(Asked::Country(options.iter().map(|o| o.country.clone()).collect()));
        self.countries.pop_front().unwrap_or(Choice::Cancel)
    }

    fn choose_candidate(&mut self, candidates: &[Candidate]) -> Choice<usize> {
        self.asked.push(Asked::Candidate(candidates.len()));
        self.candidates.pop_front().unwrap_or(Choice::Cancel)
    }
}
