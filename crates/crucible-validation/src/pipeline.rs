//! Validation pipeline: configuration, ordering, and domain routing

use crate::anchors::AnchorSet;
use crate::checks;
use crucible_domain::traits::EntryStore;
use crucible_domain::{AggregateResult, DisplayId};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while configuring the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration content was not valid TOML
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Pipeline thresholds, immutable once the pipeline is built
///
/// Claims validated under one configuration stay comparable; to change a
/// threshold, build a new pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Position/conclusion overlap above which circular reasoning flags
    pub circular_flag_threshold: f64,

    /// Overlap above which circular reasoning warns
    pub circular_warning_threshold: f64,

    /// Shared content tokens required before a polarity disagreement counts
    /// as self-contradiction
    pub contradiction_shared_tokens: usize,

    /// Open interval around 100 in which a near-miss percentage sum warns
    pub percent_sum_window: (f64, f64),

    /// Minimum reasoning steps per archive tier, indexed by tier
    pub min_steps_by_tier: [usize; 6],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            circular_flag_threshold: 0.80,
            circular_warning_threshold: 0.60,
            contradiction_shared_tokens: 3,
            percent_sum_window: (95.0, 105.0),
            min_steps_by_tier: [2, 2, 3, 4, 5, 5],
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text; absent keys keep defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, PipelineError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

/// Runs every applicable check against a claim and aggregates the findings
///
/// Order is fixed: universal checks, then domain-routed heuristics, then
/// anchors. The aggregate carries every finding; nothing short-circuits, so
/// the judge always sees the complete picture.
pub struct ValidationPipeline {
    config: PipelineConfig,
    anchors: AnchorSet,
}

impl ValidationPipeline {
    /// Build a pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            anchors: AnchorSet::new(),
        }
    }

    /// The configuration this pipeline was built with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate one claim
    ///
    /// `known_ids` is the set of display ids currently in the archive;
    /// `state_tier` selects the reasoning-depth minimum for the submitting
    /// state.
    pub fn validate(
        &self,
        claim_text: &str,
        domain: &str,
        cited_ids: &[DisplayId],
        known_ids: &BTreeSet<DisplayId>,
        state_tier: u8,
    ) -> AggregateResult {
        let mut aggregate = AggregateResult::new();

        aggregate.absorb(checks::check_citation_validity(cited_ids, known_ids));
        aggregate.absorb(checks::check_self_contradiction(
            claim_text,
            self.config.contradiction_shared_tokens,
        ));
        aggregate.absorb(checks::check_circular_reasoning(
            claim_text,
            self.config.circular_flag_threshold,
            self.config.circular_warning_threshold,
        ));
        aggregate.absorb(checks::check_numeric_consistency(
            claim_text,
            self.config.percent_sum_window,
        ));
        aggregate.absorb(checks::check_reasoning_depth(
            claim_text,
            checks::min_steps_for_tier(state_tier, &self.config.min_steps_by_tier),
        ));

        for check in domain_checks(domain) {
            aggregate.absorb(check(claim_text));
        }

        for result in self.anchors.run(domain, claim_text) {
            aggregate.absorb(result);
        }

        aggregate
    }

    /// Validate one claim against a live store's citation set
    pub fn validate_against_store<S: EntryStore>(
        &self,
        claim_text: &str,
        domain: &str,
        cited_ids: &[DisplayId],
        store: &S,
        state_tier: u8,
    ) -> Result<AggregateResult, S::Error> {
        let known = store.known_display_ids()?;
        Ok(self.validate(claim_text, domain, cited_ids, &known, state_tier))
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Extra heuristics dispatched by knowledge domain
fn domain_checks(domain: &str) -> &'static [fn(&str) -> crucible_domain::ValidationResult] {
    match domain.to_lowercase().as_str() {
        "physics" | "biology" | "medicine" | "geography" | "technology" => {
            &[checks::check_empirical_testability]
        }
        "finance" | "economics" => &[checks::check_survivorship_bias],
        "history" => &[checks::check_monocausality, checks::check_source_attribution],
        "mathematics" | "math" => &[checks::check_theorem_scope],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_domain::{ArchiveEntry, EntryStatus};
    use std::collections::HashMap;

    fn id(seq: u32) -> DisplayId {
        DisplayId::from_seq(seq).unwrap()
    }

    fn known(seqs: &[u32]) -> BTreeSet<DisplayId> {
        seqs.iter().map(|s| id(*s)).collect()
    }

    const SOUND_CLAIM: &str = "POSITION: Coastal erosion rates respond to storm frequency.\n\
                               STEP 1: Measured erosion correlates with storm counts.\n\
                               STEP 2: The correlation is testable against tide-gauge records.\n\
                               CONCLUSION: Therefore storm frequency is a usable predictor.";

    #[test]
    fn test_sound_claim_passes() {
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(SOUND_CLAIM, "geography", &[id(1)], &known(&[1, 2]), 0);
        assert!(result.all_passed());
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_unknown_citation_fails_aggregate() {
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(SOUND_CLAIM, "geography", &[id(9)], &known(&[1, 2]), 0);
        assert!(!result.all_passed());
        assert!(result.flags.iter().any(|f| f.contains("#009")));
    }

    #[test]
    fn test_circular_claim_fails_aggregate() {
        let text = "POSITION: Market cycles repeat every seven years precisely.\n\
                    CONCLUSION: Market cycles repeat every seven years precisely.";
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(text, "finance", &[], &known(&[]), 0);
        assert!(!result.all_passed());
    }

    #[test]
    fn test_warnings_accumulate_without_failing() {
        // Shallow reasoning at a high tier plus an untestable empirical claim
        let text = "POSITION: Mountain air improves mood.\nCONCLUSION: People feel happy uphill.";
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(text, "physics", &[], &known(&[]), 5);
        assert!(result.all_passed());
        assert!(result.warnings.len() >= 2);
    }

    #[test]
    fn test_anchor_findings_reach_aggregate() {
        let text = "POSITION: The chronology is firm because World War II ended in 1952.\n\
                    STEP 1: Archives document the surrender.\n\
                    STEP 2: Therefore the recorded date stands.\n\
                    CONCLUSION: The timeline anchors on that year.";
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(text, "history", &[], &known(&[]), 0);
        assert!(!result.all_passed());
        assert!(result.flags.iter().any(|f| f.contains("1945")));
    }

    #[test]
    fn test_tier_raises_depth_requirement() {
        let text = "POSITION: Soil acidity is measurable and predicts yield.\n\
                    STEP 1: Samples because acidity varies.\n\
                    STEP 2: Therefore acidity maps to yield.\n\
                    CONCLUSION: Acidity predicts crop outcomes.";
        let pipeline = ValidationPipeline::default();

        let low = pipeline.validate(text, "biology", &[], &known(&[]), 0);
        let high = pipeline.validate(text, "biology", &[], &known(&[]), 5);
        assert!(low.warnings.len() < high.warnings.len() || !high.all_passed());
        assert!(high
            .warnings
            .iter()
            .any(|w| w.contains("tier minimum")));
    }

    #[test]
    fn test_config_from_toml_overrides() {
        let config = PipelineConfig::from_toml_str(
            "circular_flag_threshold = 0.9\nmin_steps_by_tier = [1, 1, 1, 1, 1, 1]\n",
        )
        .unwrap();
        assert_eq!(config.circular_flag_threshold, 0.9);
        assert_eq!(config.min_steps_by_tier, [1, 1, 1, 1, 1, 1]);
        // Unspecified keys keep their defaults
        assert_eq!(config.contradiction_shared_tokens, 3);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.toml");
        std::fs::write(&path, "contradiction_shared_tokens = 5\n").unwrap();
        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.contradiction_shared_tokens, 5);
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        assert!(PipelineConfig::from_toml_str("circular_flag_treshold = 0.9\n").is_err());
    }

    #[test]
    fn test_summary_line_shape() {
        let pipeline = ValidationPipeline::default();
        let result = pipeline.validate(SOUND_CLAIM, "geography", &[id(9)], &known(&[]), 0);
        assert!(result.summary().starts_with("1 flag(s)"));
    }

    /// Minimal in-memory store for exercising the store-backed entry point
    #[derive(Default)]
    struct MemoryStore {
        entries: HashMap<DisplayId, ArchiveEntry>,
        next_seq: u32,
    }

    impl EntryStore for MemoryStore {
        type Error = std::convert::Infallible;

        fn next_display_id(&mut self) -> Result<DisplayId, Self::Error> {
            self.next_seq += 1;
            Ok(DisplayId::from_seq(self.next_seq).unwrap())
        }

        fn save_entry(&mut self, entry: ArchiveEntry) -> Result<DisplayId, Self::Error> {
            let id = entry.display_id;
            self.entries.insert(id, entry);
            Ok(id)
        }

        fn get_entry(&self, id: DisplayId) -> Result<Option<ArchiveEntry>, Self::Error> {
            Ok(self.entries.get(&id).cloned())
        }

        fn update_status(&mut self, id: DisplayId, status: EntryStatus) -> Result<(), Self::Error> {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.status = status;
            }
            Ok(())
        }

        fn run_chain_collapse(
            &mut self,
            _origin: DisplayId,
        ) -> Result<BTreeSet<DisplayId>, Self::Error> {
            Ok(BTreeSet::new())
        }

        fn known_display_ids(&self) -> Result<BTreeSet<DisplayId>, Self::Error> {
            Ok(self.entries.keys().copied().collect())
        }
    }

    #[test]
    fn test_validate_against_store() {
        let mut store = MemoryStore::default();
        let display_id = store.next_display_id().unwrap();
        let entry = ArchiveEntry::new(
            display_id,
            crucible_domain::EntryType::Claim,
            "Meridian".to_string(),
            "state_meridian".to_string(),
            1,
            EntryStatus::Surviving,
            crucible_domain::ClaimType::Discovery,
            "Tide gauges record storm-driven erosion.".to_string(),
        );
        store.save_entry(entry).unwrap();

        let pipeline = ValidationPipeline::default();
        let ok = pipeline
            .validate_against_store(SOUND_CLAIM, "geography", &[display_id], &store, 0)
            .unwrap();
        assert!(ok.all_passed());

        let bad = pipeline
            .validate_against_store(SOUND_CLAIM, "geography", &[id(42)], &store, 0)
            .unwrap();
        assert!(!bad.all_passed());
    }
}
