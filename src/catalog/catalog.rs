use std::{fs, path::Path};

use serde::Serialize;

use crate::{
    catalog::types::{AttributeDefinition, Profile},
    error::{SurveyError, internal_error, invalid_profile},
};

/// Process-wide registry of attributes and their ordered levels.
///
/// Built once at startup and never mutated afterward; live sessions rely on
/// a stable catalog for round reproducibility, so swapping attributes means
/// constructing a fresh catalog, never editing this one in place.
#[derive(Debug, Clone)]
pub struct AttributeCatalog {
    attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatistics {
    pub attribute_count: usize,
    pub total_possible_combinations: usize,
    pub level_counts: Vec<(String, usize)>,
}

impl AttributeCatalog {
    pub fn new(attributes: Vec<AttributeDefinition>) -> Result<Self, SurveyError> {
        if attributes.is_empty() {
            return Err(internal_error("attribute catalog cannot be empty"));
        }
        for attribute in &attributes {
            if attribute.levels.is_empty() {
                return Err(internal_error(format!(
                    "attribute '{}' has no levels",
                    attribute.attribute_key
                )));
            }
            let duplicated = attributes
                .iter()
                .filter(|other| other.attribute_key == attribute.attribute_key)
                .count();
            if duplicated > 1 {
                return Err(internal_error(format!(
                    "attribute key '{}' appears more than once",
                    attribute.attribute_key
                )));
            }
        }
        Ok(Self { attributes })
    }

    pub fn load(path: &Path) -> Result<Self, SurveyError> {
        let content = fs::read_to_string(path).map_err(|err| {
            internal_error(format!(
                "failed to read attribute catalog '{}': {err}",
                path.display()
            ))
        })?;
        let attributes: Vec<AttributeDefinition> =
            serde_json::from_str(&content).map_err(|err| {
                internal_error(format!(
                    "failed to parse attribute catalog '{}': {err}",
                    path.display()
                ))
            })?;
        Self::new(attributes)
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn attribute(&self, attribute_key: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|attribute| attribute.attribute_key == attribute_key)
    }

    pub fn levels_of(&self, attribute_key: &str) -> Option<&[crate::catalog::AttributeLevel]> {
        self.attribute(attribute_key)
            .map(|attribute| attribute.levels.as_slice())
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Size of the full factorial enumeration.
    pub fn combination_count(&self) -> usize {
        self.attributes
            .iter()
            .map(|attribute| attribute.levels.len())
            .product()
    }

    /// Checks that the profile assigns exactly one in-catalog level to every
    /// attribute of this catalog.
    pub fn validate(&self, profile: &Profile) -> Result<(), SurveyError> {
        for attribute in &self.attributes {
            let Some(level_id) = profile.get(&attribute.attribute_key) else {
                return Err(invalid_profile(format!(
                    "profile is missing attribute '{}'",
                    attribute.attribute_key
                )));
            };
            if !attribute.has_level(level_id) {
                return Err(invalid_profile(format!(
                    "level '{}' is not defined for attribute '{}'",
                    level_id, attribute.attribute_key
                )));
            }
        }
        for key in profile.keys() {
            if self.attribute(key).is_none() {
                return Err(invalid_profile(format!(
                    "profile carries unknown attribute '{}'",
                    key
                )));
            }
        }
        Ok(())
    }

    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics {
            attribute_count: self.attribute_count(),
            total_possible_combinations: self.combination_count(),
            level_counts: self
                .attributes
                .iter()
                .map(|attribute| (attribute.attribute_key.clone(), attribute.levels.len()))
                .collect(),
        }
    }

    /// Built-in job catalog used when the config names no catalog file.
    pub fn default_job_catalog() -> Self {
        let attributes = vec![
            AttributeDefinition::new(
                "company_description",
                "Company description",
                vec![
                    (
                        "tech_software",
                        "A technology company that develops software solutions to help organizations manage processes more efficiently and scale their operations.",
                    ),
                    (
                        "business_services",
                        "A business services firm that provides operational and advisory solutions to help organizations improve performance and manage complex projects.",
                    ),
                    (
                        "financial_services",
                        "A financial services company that provides investment management and advisory services to help clients grow and protect their wealth.",
                    ),
                    (
                        "healthcare_tech",
                        "A healthcare technology company that develops digital solutions to improve patient outcomes and streamline clinical operations.",
                    ),
                ],
            ),
            AttributeDefinition::new(
                "company_size",
                "Company size",
                vec![
                    ("small", "50-100 employees"),
                    ("medium", "100-500 employees"),
                    ("large", "500+ employees"),
                ],
            ),
            AttributeDefinition::new(
                "compensation",
                "Compensation",
                vec![
                    ("market_aligned", "Market-aligned"),
                    ("competitive", "Competitive for the market"),
                    ("above_market", "Above market rate"),
                ],
            ),
            AttributeDefinition::new(
                "location",
                "Location",
                vec![
                    ("remote", "Remote"),
                    ("mostly_office", "Mostly in office"),
                    ("hybrid", "Hybrid"),
                ],
            ),
            AttributeDefinition::new(
                "culture_values",
                "Recent updates on the company's culture and values",
                vec![
                    (
                        "dei_current",
                        "In the company's most recent annual public filing (10-K), it states: \"We know advancing equality takes all of us, so we're partnering with our ecosystem to design better diversity, equity, and inclusion (DEI) strategies and build more diverse workforces.\"",
                    ),
                    (
                        "dei_prior",
                        "In prior annual public filings (10-K), the company stated: \"We know advancing equality takes all of us, so we're partnering with our ecosystem to design better diversity, equity, and inclusion (DEI) strategies and build more diverse workforces.\" This language does not appear in the company's most recent filing.",
                    ),
                    (
                        "dei_none",
                        "The company has not made any public statements regarding diversity, equity, and inclusion (DEI) initiatives in their recent filings.",
                    ),
                ],
            ),
        ];

        Self::new(attributes).expect("built-in catalog is well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeCatalog;
    use crate::catalog::types::{AttributeDefinition, Profile};

    fn small_catalog() -> AttributeCatalog {
        AttributeCatalog::new(vec![
            AttributeDefinition::new("size", "Size", vec![("s", "Small"), ("l", "Large")]),
            AttributeDefinition::new("pay", "Pay", vec![("low", "Low"), ("high", "High")]),
        ])
        .expect("catalog should build")
    }

    #[test]
    fn validate_accepts_complete_in_catalog_profile() {
        let catalog = small_catalog();
        let profile: Profile = [("size", "s"), ("pay", "high")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        catalog.validate(&profile).expect("profile should validate");
    }

    #[test]
    fn validate_rejects_missing_attribute_and_unknown_level() {
        let catalog = small_catalog();

        let missing: Profile = [("size".to_string(), "s".to_string())].into_iter().collect();
        let err = catalog.validate(&missing).expect_err("missing key must fail");
        assert!(err.message.contains("missing attribute 'pay'"));

        let unknown: Profile = [("size", "s"), ("pay", "mid")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let err = catalog.validate(&unknown).expect_err("unknown level must fail");
        assert!(err.message.contains("not defined"));
    }

    #[test]
    fn combination_count_is_level_product() {
        assert_eq!(small_catalog().combination_count(), 4);
        assert_eq!(
            AttributeCatalog::default_job_catalog().combination_count(),
            4 * 3 * 3 * 3 * 3
        );
    }

    #[test]
    fn level_text_falls_back_to_raw_id() {
        let catalog = small_catalog();
        let attribute = catalog.attribute("size").expect("attribute exists");
        assert_eq!(attribute.level_text("s"), "Small");
        assert_eq!(attribute.level_text("xxl"), "xxl");
    }
}
