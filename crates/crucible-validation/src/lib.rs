//! Crucible Validation Pipeline
//!
//! Objective, deterministic validation of claims before they reach the
//! downstream judge. Three layers run in order:
//!
//! 1. Universal checks: citation existence, self-contradiction, circular
//!    reasoning, numeric consistency, reasoning-depth sufficiency
//! 2. Domain-routed checks: extra heuristics keyed by knowledge domain
//! 3. Anchor checks: concrete computation and fact lookup (arithmetic,
//!    physical constants, dated events, financial formulas, fallacy
//!    patterns)
//!
//! Every check returns a `ValidationResult`; the pipeline merges them into
//! one `AggregateResult` where any flag-severity finding fails the whole
//! claim. None of this is natural-language understanding: checks are
//! pattern- and formula-driven, and a claim that passes here still faces the
//! judge.

#![warn(missing_docs)]

pub mod anchors;
pub mod checks;
pub mod pipeline;

pub use anchors::{AnchorSet, ANCHOR_VERSION};
pub use pipeline::{PipelineConfig, PipelineError, ValidationPipeline};
