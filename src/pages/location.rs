//! Country -> state -> city cascade
//!
//! Each lookup is tagged with a generation number taken when the selection
//! changed. A response is applied only if its generation is still current, so
//! a slow answer for a previously selected country can never overwrite the
//! list for the country now selected.

use serde::Serialize;

use crate::services::{Location, ServiceError};

/// Ticket for one in-flight lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupTicket(u64);

#[derive(Clone, Debug, Default, Serialize)]
pub struct LocationCascade {
    pub countries: Vec<Location>,
    pub states: Vec<Location>,
    pub cities: Vec<Location>,
    pub loading_states: bool,
    pub loading_cities: bool,
    #[serde(skip)]
    states_generation: u64,
    #[serde(skip)]
    cities_generation: u64,
}

impl LocationCascade {
    pub fn new(countries: Vec<Location>) -> Self { Self { countries, ..Self::default() } }

    pub fn country(&self, id: u64) -> Option<&Location> { self.countries.iter().find(|c| c.id == id) }
    pub fn state(&self, id: u64) -> Option<&Location> { self.states.iter().find(|s| s.id == id) }
    pub fn city(&self, id: u64) -> Option<&Location> { self.cities.iter().find(|c| c.id == id) }

    /// Clears dependent lists and starts a state lookup.
    pub fn begin_states(&mut self) -> LookupTicket {
        self.states_generation += 1;
        self.cities_generation += 1;
        self.states.clear();
        self.cities.clear();
        self.loading_states = true;
        self.loading_cities = false;
        LookupTicket(self.states_generation)
    }

    /// Returns false when the response was stale and dropped.
    pub fn finish_states(&mut self, ticket: LookupTicket, result: Result<Vec<Location>, ServiceError>) -> bool {
        if ticket.0 != self.states_generation {
            tracing::debug!("Discarding stale state list");
            return false;
        }
        self.loading_states = false;
        self.states = swallow(result, "states");
        true
    }

    pub fn begin_cities(&mut self) -> LookupTicket {
        self.cities_generation += 1;
        self.cities.clear();
        self.loading_cities = true;
        LookupTicket(self.cities_generation)
    }

    pub fn finish_cities(&mut self, ticket: LookupTicket, result: Result<Vec<Location>, ServiceError>) -> bool {
        if ticket.0 != self.cities_generation {
            tracing::debug!("Discarding stale city list");
            return false;
        }
        self.loading_cities = false;
        self.cities = swallow(result, "cities");
        true
    }
}

/// Lookup failures leave an empty dropdown rather than an error.
fn swallow(result: Result<Vec<Location>, ServiceError>, what: &str) -> Vec<Location> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, what, "Location lookup failed");
        Vec::new()
    })
}
