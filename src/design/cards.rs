use serde::Serialize;

use crate::{
    catalog::{AttributeCatalog, Profile},
    design::strategy::{SessionHistory, Strategy},
    error::SurveyError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardAttribute {
    pub key: String,
    pub label: String,
    pub value: String,
    pub level_id: String,
}

/// One renderable profile, attributes ordered per the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub label: String,
    pub attributes: Vec<CardAttribute>,
    pub rendered_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round {
    pub round_number: u32,
    pub profile_a: Profile,
    pub profile_b: Profile,
    pub card_a: CardView,
    pub card_b: CardView,
}

/// Builds the round shown for `(session_seed, round_number)`: asks the
/// strategy for the pair, validates both profiles against the catalog, and
/// renders the labeled cards.
pub fn build_round(
    session_seed: &str,
    round_number: u32,
    catalog: &AttributeCatalog,
    strategy: Strategy,
) -> Result<Round, SurveyError> {
    let history = history_through(session_seed, round_number, catalog, strategy)?;
    let (profile_a, profile_b) =
        strategy.generate_pair(session_seed, round_number, catalog, &history)?;

    // A strategy handing back an out-of-catalog value is a defect, not a
    // recoverable condition; surface it loudly.
    if let Err(err) = catalog.validate(&profile_a).and_then(|_| catalog.validate(&profile_b)) {
        tracing::error!(
            target: "design",
            strategy = strategy.name(),
            round_number,
            error = %err,
            "strategy_produced_invalid_profile"
        );
        return Err(err);
    }

    let card_a = render_card("A", &profile_a, catalog);
    let card_b = render_card("B", &profile_b, catalog);
    Ok(Round {
        round_number,
        profile_a,
        profile_b,
        card_a,
        card_b,
    })
}

/// Regenerates the profiles of rounds `1..round_number` so history-aware
/// strategies see exactly what the respondent saw. Skipped entirely for
/// strategies that ignore history.
fn history_through(
    session_seed: &str,
    round_number: u32,
    catalog: &AttributeCatalog,
    strategy: Strategy,
) -> Result<SessionHistory, SurveyError> {
    let mut history = SessionHistory::default();
    if !strategy.uses_history() {
        return Ok(history);
    }
    for prior in 1..round_number {
        let (profile_a, profile_b) =
            strategy.generate_pair(session_seed, prior, catalog, &history)?;
        history.push_pair(profile_a, profile_b);
    }
    Ok(history)
}

fn render_card(label: &str, profile: &Profile, catalog: &AttributeCatalog) -> CardView {
    let mut attributes = Vec::with_capacity(catalog.attribute_count());
    let mut lines = Vec::with_capacity(catalog.attribute_count());

    for attribute in catalog.attributes() {
        let Some(level_id) = profile.get(&attribute.attribute_key) else {
            continue;
        };
        let value = attribute.level_text(level_id);
        lines.push(format!("**{}**: {}", attribute.display_name, value));
        attributes.push(CardAttribute {
            key: attribute.attribute_key.clone(),
            label: attribute.display_name.clone(),
            value: value.to_string(),
            level_id: level_id.clone(),
        });
    }

    CardView {
        label: label.to_string(),
        attributes,
        rendered_text: lines.join("\n"),
    }
}
