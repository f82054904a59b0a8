//! Structured claim module - the normalizer's output

use crate::entry::{ClaimType, DisplayId};

/// Best-effort structured view of a raw claim text
///
/// Produced by the normalizer, consumed by validation. Normalization never
/// fails: when structured extraction is ambiguous the fields degrade to a
/// first-sentence position, last-sentence conclusion, and an empty reasoning
/// chain, so downstream checks always have something to inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredClaim {
    /// Declared claim type (defaults to discovery when undeclared)
    pub claim_type: ClaimType,

    /// The central position or hypothesis
    pub position: String,

    /// Ordered reasoning steps; empty under the heuristic fallback
    pub reasoning_chain: Vec<String>,

    /// The stated conclusion
    pub conclusion: String,

    /// Display ids cited by the claim, in citation order
    pub citations: Vec<DisplayId>,

    /// Topic keywords
    pub keywords: Vec<String>,
}

impl StructuredClaim {
    /// An empty structure with the given claim type
    pub fn empty(claim_type: ClaimType) -> Self {
        Self {
            claim_type,
            position: String::new(),
            reasoning_chain: Vec::new(),
            conclusion: String::new(),
            citations: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Whether extraction found neither a position nor a conclusion
    pub fn is_bare(&self) -> bool {
        self.position.is_empty() && self.conclusion.is_empty()
    }
}

impl Default for StructuredClaim {
    fn default() -> Self {
        Self::empty(ClaimType::Discovery)
    }
}
