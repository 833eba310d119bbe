use crate::{
    catalog::{AttributeCatalog, Profile},
    error::{SurveyError, internal_error},
};

/// Deterministic walk over the full enumeration of attribute-level
/// combinations, partitioned into disjoint (A, B) pairs. The first
/// `combination_count / 2` rounds show every combination exactly once.
/// Later rounds wrap: each new cycle rotates the pair index by the cycle
/// number so the pair at the wrap boundary is never an immediate repeat.
/// With two or fewer pairs the rotation is skipped, since there the plain
/// restart already avoids a repeat (or no arrangement can).
pub fn generate_pair(
    round_number: u32,
    catalog: &AttributeCatalog,
) -> Result<(Profile, Profile), SurveyError> {
    let combination_count = catalog.combination_count();
    let pair_count = combination_count / 2;
    if pair_count == 0 {
        return Err(internal_error(
            "full factorial pairing needs at least two attribute combinations",
        ));
    }

    let ordinal = (round_number.max(1) as usize) - 1;
    let cycle = ordinal / pair_count;
    let position = ordinal % pair_count;
    let offset = if pair_count > 2 { cycle % pair_count } else { 0 };
    let pair_index = (position + offset) % pair_count;

    let profile_a = combination_at(catalog, 2 * pair_index);
    let profile_b = combination_at(catalog, 2 * pair_index + 1);
    Ok((profile_a, profile_b))
}

/// Combination `index` of the mixed-radix enumeration, attributes in catalog
/// order with the last attribute varying fastest.
pub fn combination_at(catalog: &AttributeCatalog, index: usize) -> Profile {
    let mut remainder = index;
    let mut digits = vec![0usize; catalog.attribute_count()];
    for (slot, attribute) in catalog.attributes().iter().enumerate().rev() {
        let radix = attribute.levels.len();
        digits[slot] = remainder % radix;
        remainder /= radix;
    }

    catalog
        .attributes()
        .iter()
        .zip(digits)
        .map(|(attribute, digit)| {
            (
                attribute.attribute_key.clone(),
                attribute.levels[digit].level_id.clone(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::combination_at;
    use crate::catalog::{AttributeCatalog, AttributeDefinition};

    #[test]
    fn enumeration_varies_last_attribute_fastest() {
        let catalog = AttributeCatalog::new(vec![
            AttributeDefinition::new("first", "First", vec![("a", "A"), ("b", "B")]),
            AttributeDefinition::new("second", "Second", vec![("x", "X"), ("y", "Y")]),
        ])
        .expect("catalog should build");

        let combo_0 = combination_at(&catalog, 0);
        let combo_1 = combination_at(&catalog, 1);
        let combo_2 = combination_at(&catalog, 2);

        assert_eq!(combo_0["first"], "a");
        assert_eq!(combo_0["second"], "x");
        assert_eq!(combo_1["first"], "a");
        assert_eq!(combo_1["second"], "y");
        assert_eq!(combo_2["first"], "b");
        assert_eq!(combo_2["second"], "x");
    }
}
