use crate::{
    catalog::{AttributeCatalog, Profile},
    design::{
        seed,
        strategy::{draw_profile_pair, hamming_distance},
    },
    error::SurveyError,
};

const STRATEGY_NAME: &str = "balanced";
const RETRY_BUDGET: u64 = 20;

/// Seeded draws redone under an incrementing sub-seed until the pair differs
/// on at least `ceil(attribute_count / 2)` attributes. When the retry budget
/// runs out, the last draw is repaired deterministically instead: the
/// lowest-index attributes still equal on both cards get card B bumped to
/// the next level until the floor holds.
pub fn generate_pair(
    session_seed: &str,
    round_number: u32,
    catalog: &AttributeCatalog,
) -> Result<(Profile, Profile), SurveyError> {
    let required = required_distance(catalog);

    for attempt in 0..RETRY_BUDGET {
        let mut rng = seed::draw_rng(session_seed, round_number, STRATEGY_NAME, attempt);
        let (profile_a, profile_b) = draw_profile_pair(&mut rng, catalog);
        if hamming_distance(catalog, &profile_a, &profile_b) >= required {
            return Ok((profile_a, profile_b));
        }
    }

    // Budget exhausted: repair the final draw instead of drawing again.
    let mut rng = seed::draw_rng(session_seed, round_number, STRATEGY_NAME, RETRY_BUDGET - 1);
    let (profile_a, mut profile_b) = draw_profile_pair(&mut rng, catalog);
    force_minimum_distance(catalog, &profile_a, &mut profile_b, required);
    Ok((profile_a, profile_b))
}

/// Floor on the Hamming distance. Attributes with a single level can never
/// differ, so the floor is capped by the count of multi-level attributes.
fn required_distance(catalog: &AttributeCatalog) -> usize {
    let ceil_half = catalog.attribute_count().div_ceil(2);
    let mutable_attributes = catalog
        .attributes()
        .iter()
        .filter(|attribute| attribute.levels.len() > 1)
        .count();
    ceil_half.min(mutable_attributes)
}

fn force_minimum_distance(
    catalog: &AttributeCatalog,
    profile_a: &Profile,
    profile_b: &mut Profile,
    required: usize,
) {
    for attribute in catalog.attributes() {
        if hamming_distance(catalog, profile_a, profile_b) >= required {
            return;
        }
        if attribute.levels.len() < 2 {
            continue;
        }
        let key = &attribute.attribute_key;
        if profile_a.get(key) != profile_b.get(key) {
            continue;
        }
        let current = profile_b.get(key).cloned().unwrap_or_default();
        let position = attribute
            .levels
            .iter()
            .position(|level| level.level_id == current)
            .unwrap_or(0);
        let next = (position + 1) % attribute.levels.len();
        profile_b.insert(key.clone(), attribute.levels[next].level_id.clone());
    }
}
