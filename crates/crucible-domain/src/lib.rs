//! Crucible Domain Layer
//!
//! This crate contains the core business logic and domain model for Crucible,
//! an adversarial knowledge archive. It has no infrastructure dependencies and
//! defines the fundamental concepts, value objects, and trait interfaces that
//! all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **ArchiveEntry**: One persisted claim or founding note with identity,
//!   status, and citation links
//! - **DisplayId**: The sequential, human-facing `#NNN` identifier, distinct
//!   from the internal unique id
//! - **Status and Tier**: Lifecycle status drives a derived visibility tier
//!   (main / quarantine / graveyard); the tier is never stored independently
//! - **Severity**: Ordered verdict levels (info < warning < flag) with a pure
//!   merge into an aggregate validation result
//! - **StateBudget**: Per-jurisdiction token ledger and credibility counters
//!
//! ## Architecture
//!
//! - No infrastructure crate dependencies
//! - Pure business logic only
//! - Storage and provider implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod budget;
pub mod claim;
pub mod entry;
pub mod severity;
pub mod status;
pub mod traits;

// Re-exports for convenience
pub use budget::StateBudget;
pub use claim::StructuredClaim;
pub use entry::{ArchiveEntry, ClaimType, DisplayId, EntryId, EntryType};
pub use severity::{AggregateResult, Severity, ValidationResult};
pub use status::{ArchiveTier, EntryStatus};
