//! Location resolver: turns free text into one coordinate pair.
//!
//! Flow:  search → group by country → (hint narrows) → country prompt if the
//! results span several countries → place prompt if that country has several
//! results → coerce coordinates.
//!
//! Ambiguity is judged per country only. When every result shares one
//! country the top-ranked result is taken without asking, even if that
//! country holds lower-ranked namesakes.

use tracing::{debug, info, warn};

use super::prompt::{Choice, Disambiguator};
use super::providers::GeocodingProvider;
use super::types::{
    Candidate, CandidateGroups, LocationDetails, LocationError, Query, Resolution,
    ResolvedLocation, UnresolvedReason,
};

/// Maximum candidates requested per search.
pub const SEARCH_LIMIT: usize = 10;

pub struct LocationResolver<P> {
    provider: P,
}

impl<P: GeocodingProvider> LocationResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve a query to a single place, asking `prompt` when the results are ambiguous.
    ///
    /// Provider and data failures come back as [`Resolution::Unresolved`].
    pub fn resolve(&self, query: &Query, prompt: &mut dyn Disambiguator) -> Resolution {
        let candidates = match self.provider.search(query.text(), SEARCH_LIMIT) {
            Ok(candidates) => candidates,
            Err(failure) => {
                warn!(query = query.text(), %failure, "geocoding search failed");
                return Resolution::Unresolved(UnresolvedReason::Provider(failure));
            }
        };

        let Some(first) = candidates.first() else {
            info!(query = query.text(), "no geocoding candidates");
            return Resolution::Unresolved(UnresolvedReason::NotFound);
        };

        let mut groups = CandidateGroups::from_candidates(&candidates);
        let hinted = match query.country_hint() {
            Some(hint) if groups.narrow_to(hint) => {
                debug!(query = query.text(), hint, "country hint selected group");
                true
            }
            Some(hint) => {
                debug!(query = query.text(), hint, "country hint matched no candidate");
                false
            }
            None => false,
        };

        let (selected, disambiguated) = if groups.len() > 1 {
            debug!(
                query = query.text(),
                countries = groups.len(),
                "results span several countries"
            );
            match disambiguate(&groups, prompt) {
                Ok(candidate) => (candidate, true),
                Err(reason) => {
                    info!(query = query.text(), %reason, "disambiguation ended without a place");
                    return Resolution::Unresolved(reason);
                }
            }
        } else if hinted {
            (groups.top().unwrap_or(first), false)
        } else {
            (first, false)
        };

        match selected.coordinates() {
            Ok((latitude, longitude)) => {
                debug!(
                    query = query.text(),
                    display_name = %selected.display_name,
                    latitude,
                    longitude,
                    "resolved"
                );
                Resolution::Resolved(ResolvedLocation {
                    latitude,
                    longitude,
                    display_name: selected.display_name.clone(),
                    country: selected.country.clone(),
                    disambiguated,
                })
            }
            Err(err) => {
                warn!(query = query.text(), %err, "selected candidate has bad coordinates");
                Resolution::Unresolved(UnresolvedReason::MalformedData)
            }
        }
    }

    /// Reverse-geocode a resolved place for its full address record.
    pub fn details(&self, location: &ResolvedLocation) -> Result<LocationDetails, LocationError> {
        self.provider.reverse(location.latitude, location.longitude)
    }
}

/// Country first, then place within the country.
fn disambiguate<'a>(
    groups: &'a CandidateGroups,
    prompt: &mut dyn Disambiguator,
) -> Result<&'a Candidate, UnresolvedReason> {
    let country = match prompt.choose_country(&groups.options()) {
        Choice::Selected(country) => country,
        Choice::Cancel => return Err(UnresolvedReason::Cancelled),
    };
    let group = groups.get(&country).ok_or(UnresolvedReason::NoSelection)?;

    match group {
        [only] => Ok(only),
        _ => match prompt.choose_candidate(group) {
            Choice::Selected(index) => group.get(index).ok_or(UnresolvedReason::NoSelection),
            Choice::Cancel => Err(UnresolvedReason::Cancelled),
        },
    }
}
