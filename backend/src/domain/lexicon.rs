//! Categorised trigger terms used by the threat detector.
//!
//! A `ThreatLexicon` is built once at start-up, either from the built-in
//! categories or from a YAML file, and shared read-only afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::{EducationalIntervention, ThreatSeverity};
use std::path::Path;

pub const CUSTOM_KEYWORD_CATEGORY: &str = "custom_keyword";

const INTERVENTION_OPTIONS: [&str; 3] = ["Ignore", "Block", "Tell a Parent"];

const GENERIC_INTERVENTION: &str =
    "Let's keep playing safe! If something doesn't feel right, you can always talk to a trusted adult.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LexiconCategory {
    pub name: String,
    pub severity: ThreatSeverity,
    pub terms: Vec<String>,
    /// Message shown to a child whose content hit this category
    #[serde(default)]
    pub intervention: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatLexicon {
    categories: Vec<LexiconCategory>,
}

/// Built-in terms that matched a piece of content
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconMatch {
    /// Matched terms, in lexicon order, without duplicates
    pub terms: Vec<String>,
    /// First category (in lexicon order) that produced a match
    pub first_category: String,
    /// Highest severity among the matched categories
    pub severity: ThreatSeverity,
}

impl ThreatLexicon {
    /// Terms are lowercased; blank terms and empty categories are rejected
    pub fn new(categories: Vec<LexiconCategory>) -> Result<Self> {
        if categories.is_empty() {
            anyhow::bail!("Threat lexicon must contain at least one category");
        }

        let mut normalized = Vec::with_capacity(categories.len());
        for mut category in categories {
            category.name = category.name.trim().to_string();
            if category.name.is_empty() {
                anyhow::bail!("Threat lexicon category names cannot be empty");
            }
            if category.name == CUSTOM_KEYWORD_CATEGORY {
                anyhow::bail!("'{}' is reserved for guardian keywords", CUSTOM_KEYWORD_CATEGORY);
            }
            category.terms = category
                .terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            if category.terms.is_empty() {
                anyhow::bail!("Threat lexicon category '{}' has no terms", category.name);
            }
            normalized.push(category);
        }

        Ok(Self {
            categories: normalized,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct LexiconFile {
            categories: Vec<LexiconCategory>,
        }

        let file: LexiconFile = serde_yaml::from_str(yaml)?;
        Self::new(file.categories)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
            .with_context(|| format!("Invalid lexicon file {}", path.display()))
    }

    pub fn built_in() -> Self {
        fn category(name: &str, severity: ThreatSeverity, terms: &[&str], intervention: &str) -> LexiconCategory {
            LexiconCategory {
                name: name.to_string(),
                severity,
                terms: terms.iter().map(|t| t.to_string()).collect(),
                intervention: Some(intervention.to_string()),
            }
        }

        Self {
            categories: vec![
                category(
                    "violence",
                    ThreatSeverity::High,
                    &["kill you", "hurt you", "beat you up", "punch", "stab", "weapon", "knife", "blood"],
                    "Words about hurting people can be scary. Being kind keeps the game fun for everyone.",
                ),
                category(
                    "inappropriate_content",
                    ThreatSeverity::Medium,
                    &["naked", "nude", "sexy", "porn", "drugs", "alcohol", "vape"],
                    "That topic isn't right for this space. Let's talk about something else!",
                ),
                category(
                    "harassment",
                    ThreatSeverity::High,
                    &["bully", "stupid", "ugly", "idiot", "dumb", "hate you", "shut up", "nobody likes you"],
                    "Words can hurt feelings. How would you feel if someone said that to you?",
                ),
                category(
                    "personal_information",
                    ThreatSeverity::Low,
                    &[
                        "my address",
                        "where do you live",
                        "phone number",
                        "my password",
                        "what school",
                        "home alone",
                        "send a photo",
                        "meet up",
                    ],
                    "Keep personal details like your address, school or phone number private online.",
                ),
            ],
        }
    }

    pub fn categories(&self) -> &[LexiconCategory] {
        &self.categories
    }

    /// Total number of built-in terms across every category
    pub fn term_count(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }

    /// Case-insensitive substring scan of `content` against every category
    pub fn scan(&self, content: &str) -> Option<LexiconMatch> {
        let haystack = content.to_lowercase();
        let mut terms: Vec<String> = Vec::new();
        let mut first_category: Option<&str> = None;
        let mut severity: Option<ThreatSeverity> = None;

        for category in &self.categories {
            let mut category_hit = false;
            for term in &category.terms {
                if haystack.contains(term.as_str()) {
                    category_hit = true;
                    if !terms.contains(term) {
                        terms.push(term.clone());
                    }
                }
            }
            if category_hit {
                first_category.get_or_insert(category.name.as_str());
                severity = Some(severity.map_or(category.severity, |s| s.max(category.severity)));
            }
        }

        Some(LexiconMatch {
            terms,
            first_category: first_category?.to_string(),
            severity: severity?,
        })
    }

    /// Guidance for a threat type, falling back to a generic safe-play message
    pub fn intervention_for(&self, threat_type: &str) -> EducationalIntervention {
        let message = self
            .categories
            .iter()
            .find(|c| c.name == threat_type)
            .and_then(|c| c.intervention.clone())
            .unwrap_or_else(|| GENERIC_INTERVENTION.to_string());

        EducationalIntervention {
            message,
            options: INTERVENTION_OPTIONS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl Default for ThreatLexicon {
    fn default() -> Self {
        Self::built_in()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_content_has_no_match() {
        let lexicon = ThreatLexicon::built_in();
        assert!(lexicon.scan("want to build a castle together?").is_none());
        assert!(lexicon.scan("").is_none());
    }

    #[test]
    fn test_scan_is_case_insensitive() {
        let lexicon = ThreatLexicon::built_in();
        let found = lexicon.scan("You are such a BULLY").unwrap();
        assert_eq!(found.terms, vec!["bully"]);
        assert_eq!(found.first_category, "harassment");
        assert_eq!(found.severity, ThreatSeverity::High);
    }

    #[test]
    fn test_first_category_follows_lexicon_order() {
        let lexicon = ThreatLexicon::built_in();
        // harassment term appears first in the text, violence is first in the lexicon
        let found = lexicon.scan("you idiot, I will punch").unwrap();
        assert_eq!(found.first_category, "violence");
        assert_eq!(found.terms, vec!["punch", "idiot"]);
    }

    #[test]
    fn test_severity_precedence() {
        let lexicon = ThreatLexicon::built_in();
        assert_eq!(lexicon.scan("got any drugs").unwrap().severity, ThreatSeverity::Medium);
        assert_eq!(lexicon.scan("what school do you go to").unwrap().severity, ThreatSeverity::Low);
        // inappropriate first in the text but harassment outranks it
        let mixed = lexicon.scan("drugs are for dumb people").unwrap();
        assert_eq!(mixed.first_category, "inappropriate_content");
        assert_eq!(mixed.severity, ThreatSeverity::High);
    }

    #[test]
    fn test_term_count() {
        assert_eq!(ThreatLexicon::built_in().term_count(), 31);
    }

    #[test]
    fn test_intervention_fallback() {
        let lexicon = ThreatLexicon::built_in();
        let violence = lexicon.intervention_for("violence");
        assert!(violence.message.contains("hurting"));
        assert_eq!(violence.options, vec!["Ignore", "Block", "Tell a Parent"]);

        let custom = lexicon.intervention_for(CUSTOM_KEYWORD_CATEGORY);
        assert_eq!(custom.message, GENERIC_INTERVENTION);
    }

    #[test]
    fn test_yaml_lexicon() {
        let yaml = r#"
categories:
  - name: self_harm
    severity: critical
    terms: ["  Hurt Myself ", ""]
    intervention: "You matter. Please talk to a trusted adult."
  - name: spam
    severity: low
    terms: ["free coins"]
"#;
        let lexicon = ThreatLexicon::from_yaml_str(yaml).unwrap();
        assert_eq!(lexicon.term_count(), 2);
        assert_eq!(lexicon.categories()[0].terms, vec!["hurt myself"]);

        let found = lexicon.scan("I want to HURT MYSELF").unwrap();
        assert_eq!(found.severity, ThreatSeverity::Critical);
        assert_eq!(found.first_category, "self_harm");
        assert!(lexicon.intervention_for("spam").message.contains("safe"));
    }

    #[test]
    fn test_invalid_lexicons_are_rejected() {
        assert!(ThreatLexicon::new(vec![]).is_err());
        assert!(ThreatLexicon::from_yaml_str("categories:\n  - name: empty\n    severity: low\n    terms: []\n").is_err());
        assert!(ThreatLexicon::from_yaml_str(
            "categories:\n  - name: custom_keyword\n    severity: low\n    terms: [x]\n"
        )
        .is_err());
    }
}
