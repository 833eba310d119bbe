use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One complete assignment of a level id to every attribute key.
pub type Profile = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLevel {
    pub level_id: String,
    pub display_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub attribute_key: String,
    pub display_name: String,
    pub levels: Vec<AttributeLevel>,
}

impl AttributeDefinition {
    pub fn new(
        attribute_key: impl Into<String>,
        display_name: impl Into<String>,
        levels: Vec<(&str, &str)>,
    ) -> Self {
        Self {
            attribute_key: attribute_key.into(),
            display_name: display_name.into(),
            levels: levels
                .into_iter()
                .map(|(level_id, display_text)| AttributeLevel {
                    level_id: level_id.to_string(),
                    display_text: display_text.to_string(),
                })
                .collect(),
        }
    }

    /// Display text for a level id, falling back to the raw id when the
    /// level is unknown.
    pub fn level_text<'a>(&'a self, level_id: &'a str) -> &'a str {
        self.levels
            .iter()
            .find(|level| level.level_id == level_id)
            .map(|level| level.display_text.as_str())
            .unwrap_or(level_id)
    }

    pub fn has_level(&self, level_id: &str) -> bool {
        self.levels.iter().any(|level| level.level_id == level_id)
    }
}
