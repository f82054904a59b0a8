//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{ArchiveEntry, DisplayId, EntryStatus};
use std::collections::BTreeSet;

/// Trait for storing and retrieving archive entries
///
/// Implemented by the infrastructure layer (crucible-store). The store is
/// single-writer: each operation must be internally atomic, and a chain
/// collapse must be applied as one logical unit.
pub trait EntryStore {
    /// Error type for store operations
    type Error;

    /// Allocate the next sequential display id (`#001`, `#002`, …)
    ///
    /// Monotonic and gap-free; an allocated id is never handed out twice.
    fn next_display_id(&mut self) -> Result<DisplayId, Self::Error>;

    /// Persist a new entry; fails if its display id already exists
    fn save_entry(&mut self, entry: ArchiveEntry) -> Result<DisplayId, Self::Error>;

    /// Get an entry by display id
    fn get_entry(&self, id: DisplayId) -> Result<Option<ArchiveEntry>, Self::Error>;

    /// Mutate an entry's status; the tier is derived, never stored separately
    fn update_status(&mut self, id: DisplayId, status: EntryStatus) -> Result<(), Self::Error>;

    /// Cascade `foundation_challenged` to all transitive citers of `origin`
    ///
    /// Breadth-first over back-references, no revisits, entries already in a
    /// graveyard status are left untouched. Returns every id whose status was
    /// changed. All-or-nothing: a failed cascade leaves the store unchanged.
    fn run_chain_collapse(&mut self, origin: DisplayId)
        -> Result<BTreeSet<DisplayId>, Self::Error>;

    /// All display ids currently present, in ascending order
    fn known_display_ids(&self) -> Result<BTreeSet<DisplayId>, Self::Error>;
}

/// A completion request sent across the LLM boundary
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt establishing the task
    pub system_prompt: String,

    /// User prompt carrying the content
    pub user_prompt: String,

    /// Output token cap
    pub max_output_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,
}

impl CompletionRequest {
    /// Build a request with the given prompts and conservative defaults
    /// (zero temperature, suitable for structured extraction)
    pub fn extraction(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_output_tokens: 1024,
            temperature: 0.0,
        }
    }
}

/// A completion response received across the LLM boundary
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text
    pub content: String,

    /// Total tokens consumed by the call (input + output)
    pub total_tokens: u32,
}

/// Trait for LLM completion operations
///
/// Implemented by the infrastructure layer (crucible-llm). Calls are
/// blocking and synchronous; retry classification and backoff belong to the
/// caller's retry policy, not to implementations.
pub trait CompletionProvider {
    /// Error type for completion operations
    type Error;

    /// Run one completion
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error>;
}
