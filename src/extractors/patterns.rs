// src/extractors/patterns.rs

use crate::utils::error::ExtractError;
use regex::{Regex, RegexBuilder};

/// Literal phrases, grouped by the role they play during a scan.
///
/// Phrases are matched as contiguous substrings, not word-bounded, so a
/// broad phrase like "FINANCIAL STATEMENTS" can over-trigger on unrelated
/// sections. That is an accepted tradeoff of the heuristic; tune the sets
/// rather than the matcher.
#[derive(Debug, Clone)]
pub struct PhraseSets {
    /// Phrases that mark a bold fragment as a plausible section title.
    pub title_triggers: Vec<String>,
    /// Phrases a body statement must contain.
    pub body_triggers: Vec<String>,
    /// Phrases marking an asset/valuation table as relevant.
    pub asset_triggers: Vec<String>,
    /// Phrases that disqualify an otherwise-matching body statement.
    pub body_excludes: Vec<String>,
    /// Phrases hinting that a table follows an acquisition statement.
    pub table_followup_triggers: Vec<String>,
}

impl Default for PhraseSets {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            title_triggers: owned(&[
                "Acquisition",
                "Goodwill",
                "Intangible Assets",
                "Purchase Price",
                "Initial Costs",
                "FINANCIAL STATEMENTS",
            ]),
            body_triggers: owned(&[
                "acquisition",
                "acquired",
                "purchase price",
                "purchased",
                "initial purchase",
                "was allocated",
            ]),
            asset_triggers: owned(&[
                "Intangible",
                "goodwill",
                "fair value of the asset",
                "Initial Cost",
            ]),
            body_excludes: owned(&[
                "acquisition will operate",
                "no later than",
                "in the future",
            ]),
            table_followup_triggers: owned(&["acquisition", "acquired"]),
        }
    }
}

/// Compiled matchers for one scan: the target-entity pattern plus one
/// alternation per phrase role. Built once at startup; a malformed entity
/// pattern is a configuration error, not a runtime condition.
#[derive(Debug)]
pub struct PatternRegistry {
    /// Target-entity pattern over parsed element text.
    pub entity: Regex,
    /// Same entity pattern, compiled for raw-byte scanning of files on disk.
    pub entity_bytes: regex::bytes::Regex,
    pub title_trigger: Regex,
    pub body_trigger: Regex,
    pub asset_trigger: Regex,
    pub body_exclude: Regex,
    #[allow(dead_code)] // role reserved for follow-up table detection
    pub table_followup_trigger: Regex,
}

impl PatternRegistry {
    /// Compiles the registry. `case_insensitive` governs entity and body
    /// matching; title and asset triggers always match case-insensitively
    /// because titles are frequently rendered in all caps.
    pub fn compile(
        sets: &PhraseSets,
        entity_pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            entity: build_regex(entity_pattern, case_insensitive)?,
            entity_bytes: regex::bytes::RegexBuilder::new(entity_pattern)
                .case_insensitive(case_insensitive)
                .build()?,
            title_trigger: build_regex(&alternation(&sets.title_triggers), true)?,
            body_trigger: build_regex(&alternation(&sets.body_triggers), case_insensitive)?,
            asset_trigger: build_regex(&alternation(&sets.asset_triggers), true)?,
            body_exclude: build_regex(&alternation(&sets.body_excludes), case_insensitive)?,
            table_followup_trigger: build_regex(
                &alternation(&sets.table_followup_triggers),
                case_insensitive,
            )?,
        })
    }
}

/// Joins escaped literal phrases into a single alternation.
fn alternation(phrases: &[String]) -> String {
    phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|")
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, ExtractError> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(case_insensitive: bool) -> PatternRegistry {
        PatternRegistry::compile(&PhraseSets::default(), "Sherman", case_insensitive)
            .expect("default phrase sets must compile")
    }

    #[test]
    fn default_sets_compile() {
        registry(false);
        registry(true);
    }

    #[test]
    fn title_trigger_ignores_case() {
        let reg = registry(false);
        assert!(reg.title_trigger.is_match("BUSINESS ACQUISITION"));
        assert!(reg.title_trigger.is_match("Goodwill and Intangible Assets"));
        assert!(!reg.title_trigger.is_match("Results of Operations"));
    }

    #[test]
    fn body_trigger_honors_case_flag() {
        let sensitive = registry(false);
        assert!(sensitive.body_trigger.is_match("the company acquired a business"));
        assert!(!sensitive.body_trigger.is_match("THE COMPANY ACQUIRED A BUSINESS"));

        let insensitive = registry(true);
        assert!(insensitive.body_trigger.is_match("THE COMPANY ACQUIRED A BUSINESS"));
    }

    #[test]
    fn entity_pattern_is_not_escaped() {
        // Entity names may carry regex syntax, e.g. to bridge HTML entity
        // encodings of "&".
        let reg = PatternRegistry::compile(&PhraseSets::default(), "G&.*L", false).unwrap();
        assert!(reg.entity.is_match("G&#038;L Realty"));
        assert!(reg.entity_bytes.is_match(b"G&#038;L Realty"));
    }

    #[test]
    fn phrases_match_as_literal_substrings() {
        let reg = registry(false);
        // "Purchase Price" is escaped, so the phrase matches literally even
        // inside a longer word run.
        assert!(reg.title_trigger.is_match("Allocation of Purchase Price"));
        assert!(reg.body_exclude.is_match("completed no later than year end"));
    }
}
