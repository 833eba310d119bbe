use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{AttributeCatalog, Profile},
    design::{balanced, doptimal, factorial, seed},
    error::{SurveyError, catalog_mismatch},
};

/// Profiles already shown to the respondent, in presentation order. Only the
/// d-optimal strategy consumes it; the others ignore history entirely.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    pub shown: Vec<Profile>,
}

impl SessionHistory {
    pub fn push_pair(&mut self, profile_a: Profile, profile_b: Profile) {
        self.shown.push(profile_a);
        self.shown.push(profile_b);
    }
}

/// Closed set of interchangeable randomization strategies. Pure functions of
/// `(session_seed, round_number, catalog, history)`: no wall clock, no
/// ambient rng state, so regenerating a round always reproduces the pair the
/// respondent already saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Seeded,
    Balanced,
    FullFactorial,
    DOptimal,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Seeded => "seeded",
            Strategy::Balanced => "balanced",
            Strategy::FullFactorial => "full-factorial",
            Strategy::DOptimal => "d-optimal",
        }
    }

    /// Whether `generate_pair` reads `history`. Callers can skip the
    /// quadratic history rebuild for strategies that never look at it.
    pub fn uses_history(&self) -> bool {
        matches!(self, Strategy::DOptimal)
    }

    pub fn generate_pair(
        &self,
        session_seed: &str,
        round_number: u32,
        catalog: &AttributeCatalog,
        history: &SessionHistory,
    ) -> Result<(Profile, Profile), SurveyError> {
        ensure_history_matches_catalog(catalog, history)?;
        match self {
            Strategy::Seeded => {
                let mut rng = seed::draw_rng(session_seed, round_number, self.name(), 0);
                Ok(draw_profile_pair(&mut rng, catalog))
            }
            Strategy::Balanced => {
                balanced::generate_pair(session_seed, round_number, catalog)
            }
            Strategy::FullFactorial => factorial::generate_pair(round_number, catalog),
            Strategy::DOptimal => {
                doptimal::generate_pair(session_seed, round_number, catalog, history)
            }
        }
    }
}

/// History referencing attributes outside the active catalog means the
/// catalog changed under a live session. That is a configuration defect,
/// never something to paper over.
fn ensure_history_matches_catalog(
    catalog: &AttributeCatalog,
    history: &SessionHistory,
) -> Result<(), SurveyError> {
    for profile in &history.shown {
        for key in profile.keys() {
            if catalog.attribute(key).is_none() {
                return Err(catalog_mismatch(format!(
                    "session history references attribute '{}' absent from the active catalog",
                    key
                )));
            }
        }
    }
    Ok(())
}

/// Independent uniform draw of one level per attribute.
pub(crate) fn draw_profile(rng: &mut ChaCha8Rng, catalog: &AttributeCatalog) -> Profile {
    catalog
        .attributes()
        .iter()
        .map(|attribute| {
            let index = rng.gen_range(0..attribute.levels.len());
            (
                attribute.attribute_key.clone(),
                attribute.levels[index].level_id.clone(),
            )
        })
        .collect()
}

pub(crate) fn draw_profile_pair(
    rng: &mut ChaCha8Rng,
    catalog: &AttributeCatalog,
) -> (Profile, Profile) {
    let profile_a = draw_profile(rng, catalog);
    let profile_b = draw_profile(rng, catalog);
    (profile_a, profile_b)
}

/// Count of attributes at which the two profiles differ, in catalog order.
pub fn hamming_distance(
    catalog: &AttributeCatalog,
    profile_a: &Profile,
    profile_b: &Profile,
) -> usize {
    catalog
        .attributes()
        .iter()
        .filter(|attribute| {
            profile_a.get(&attribute.attribute_key) != profile_b.get(&attribute.attribute_key)
        })
        .count()
}
