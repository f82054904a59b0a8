//! Archive entry module - the unit of knowledge in Crucible

use crate::status::{ArchiveTier, EntryStatus};
use std::fmt;
use std::str::FromStr;

/// Globally unique, opaque identifier for an archive entry, based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability for temporal queries
/// - 128-bit uniqueness
/// - RFC 9562-standard format with broad ecosystem support
/// - No coordination required for generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u128);

impl EntryId {
    /// Generate a new UUIDv7-based EntryId
    ///
    /// # Examples
    ///
    /// ```
    /// use crucible_domain::EntryId;
    ///
    /// let id = EntryId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EntryId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EntryId from a UUIDv7 string
    ///
    /// # Examples
    ///
    /// ```
    /// use crucible_domain::EntryId;
    ///
    /// let id = EntryId::new();
    /// let parsed = EntryId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Sequential, human-facing identifier of the form `#NNN`
///
/// Display ids are assigned strictly in creation order, zero-padded to a
/// minimum width of three digits (`#001` … `#999`, then `#1000`), and are
/// never reused or skipped. Ordering follows the underlying sequence number,
/// so `#1000` sorts after `#999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayId(u32);

impl DisplayId {
    /// Create a DisplayId from its sequence number (1-based)
    ///
    /// Returns `None` for zero, which is never a valid sequence number.
    pub fn from_seq(seq: u32) -> Option<Self> {
        if seq == 0 {
            None
        } else {
            Some(Self(seq))
        }
    }

    /// Get the underlying sequence number
    pub fn seq(&self) -> u32 {
        self.0
    }

    /// The display id that follows this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:03}", self.0)
    }
}

impl FromStr for DisplayId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| format!("Display id must start with '#': {}", s))?;
        let seq: u32 = digits
            .parse()
            .map_err(|_| format!("Invalid display id digits: {}", s))?;
        Self::from_seq(seq).ok_or_else(|| format!("Display id sequence must be >= 1: {}", s))
    }
}

/// What kind of archive entry this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// A judged claim produced by the generation process
    Claim,

    /// A founding-era deposit, stored without adversarial judging
    FoundingNote,
}

impl EntryType {
    /// Get the entry type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Claim => "claim",
            EntryType::FoundingNote => "founding_note",
        }
    }

    /// Parse an entry type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "claim" => Some(EntryType::Claim),
            "founding_note" => Some(EntryType::FoundingNote),
            _ => None,
        }
    }
}

/// The declared type of a claim
///
/// Discovery and foundation claims carry different structural requirements
/// downstream; unrecognized declared types are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimType {
    /// A new claim about previously unclaimed territory
    Discovery,

    /// A synthesis built on existing archive evidence
    Foundation,

    /// An attack on a specific prior claim
    Challenge,

    /// Any other domain-defined type, kept as written
    Other(String),
}

impl ClaimType {
    /// Get the claim type as a string
    pub fn as_str(&self) -> &str {
        match self {
            ClaimType::Discovery => "discovery",
            ClaimType::Foundation => "foundation",
            ClaimType::Challenge => "challenge",
            ClaimType::Other(s) => s.as_str(),
        }
    }

    /// Parse a claim type from a string; unknown values become `Other`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "discovery" => ClaimType::Discovery,
            "foundation" => ClaimType::Foundation,
            "challenge" => ClaimType::Challenge,
            other => ClaimType::Other(other.to_string()),
        }
    }
}

/// One persisted claim or founding note - the unit of knowledge
///
/// Entries are created once and never deleted; only `status` mutates after
/// creation, either through judging or through chain collapse. The visibility
/// tier is always derived from the current status via [`ArchiveEntry::tier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Globally unique opaque identifier, immutable
    pub entry_id: EntryId,

    /// Sequential human-facing identifier, assigned once
    pub display_id: DisplayId,

    /// Kind of entry
    pub entry_type: EntryType,

    /// Which jurisdiction produced this entry
    pub source_state: String,

    /// Which agent within the jurisdiction produced it
    pub source_entity: String,

    /// Cycle counter at creation time
    pub cycle_created: u32,

    /// Lifecycle status; drives the derived tier
    pub status: EntryStatus,

    /// Declared claim type
    pub claim_type: ClaimType,

    /// Full original text, stored verbatim, never truncated or normalized
    pub raw_claim_text: String,

    /// Display ids this entry claims to depend on, in citation order
    pub citations: Vec<DisplayId>,

    /// Display ids of entries that cite this one (back-reference for
    /// graph traversal, not an ownership relation)
    pub referenced_by: Vec<DisplayId>,

    /// Optional free text explaining a negative outcome
    pub outcome_reasoning: Option<String>,
}

impl ArchiveEntry {
    /// Create a new entry with no citations and no outcome reasoning
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        display_id: DisplayId,
        entry_type: EntryType,
        source_state: impl Into<String>,
        source_entity: impl Into<String>,
        cycle_created: u32,
        status: EntryStatus,
        claim_type: ClaimType,
        raw_claim_text: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: EntryId::new(),
            display_id,
            entry_type,
            source_state: source_state.into(),
            source_entity: source_entity.into(),
            cycle_created,
            status,
            claim_type,
            raw_claim_text: raw_claim_text.into(),
            citations: Vec::new(),
            referenced_by: Vec::new(),
            outcome_reasoning: None,
        }
    }

    /// Set the citation list
    pub fn with_citations(mut self, citations: Vec<DisplayId>) -> Self {
        self.citations = citations;
        self
    }

    /// Set the outcome reasoning text
    pub fn with_outcome_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.outcome_reasoning = Some(reasoning.into());
        self
    }

    /// The visibility tier derived from the current status
    ///
    /// Never stored independently; recompute after every status change.
    pub fn tier(&self) -> ArchiveTier {
        self.status.tier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_ordering() {
        let id1 = EntryId::from_value(1000);
        let id2 = EntryId::from_value(2000);

        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_entry_id_display_and_parse() {
        let id = EntryId::new();
        let id_str = id.to_string();

        // UUIDv7 strings are 36 characters (8-4-4-4-12 with hyphens)
        assert_eq!(id_str.len(), 36);

        let parsed = EntryId::from_string(&id_str).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_display_id_formatting() {
        assert_eq!(DisplayId::from_seq(1).unwrap().to_string(), "#001");
        assert_eq!(DisplayId::from_seq(42).unwrap().to_string(), "#042");
        assert_eq!(DisplayId::from_seq(999).unwrap().to_string(), "#999");
        // Width grows naturally past three digits
        assert_eq!(DisplayId::from_seq(1000).unwrap().to_string(), "#1000");
    }

    #[test]
    fn test_display_id_parse() {
        let id: DisplayId = "#007".parse().unwrap();
        assert_eq!(id.seq(), 7);
        assert_eq!("#1234".parse::<DisplayId>().unwrap().seq(), 1234);

        assert!("007".parse::<DisplayId>().is_err());
        assert!("#".parse::<DisplayId>().is_err());
        assert!("#000".parse::<DisplayId>().is_err());
        assert!("#abc".parse::<DisplayId>().is_err());
    }

    #[test]
    fn test_display_id_ordering_is_numeric() {
        let a: DisplayId = "#999".parse().unwrap();
        let b: DisplayId = "#1000".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_claim_type_parse_preserves_unknown() {
        assert_eq!(ClaimType::parse("Discovery"), ClaimType::Discovery);
        assert_eq!(ClaimType::parse("foundation"), ClaimType::Foundation);
        assert_eq!(
            ClaimType::parse("speculation"),
            ClaimType::Other("speculation".to_string())
        );
        assert_eq!(ClaimType::parse("speculation").as_str(), "speculation");
    }

    #[test]
    fn test_entry_tier_follows_status() {
        let mut entry = ArchiveEntry::new(
            DisplayId::from_seq(1).unwrap(),
            EntryType::Claim,
            "Axiom",
            "Researcher",
            1,
            EntryStatus::Surviving,
            ClaimType::Discovery,
            "base claim",
        );
        assert_eq!(entry.tier(), ArchiveTier::Main);

        entry.status = EntryStatus::Retracted;
        assert_eq!(entry.tier(), ArchiveTier::Graveyard);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: display id ordering matches sequence-number ordering
        #[test]
        fn test_display_id_ordering_property(a in 1u32..100_000, b in 1u32..100_000) {
            let id_a = DisplayId::from_seq(a).unwrap();
            let id_b = DisplayId::from_seq(b).unwrap();

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: round-trip through the `#NNN` string preserves the id
        #[test]
        fn test_display_id_string_roundtrip(seq in 1u32..100_000) {
            let id = DisplayId::from_seq(seq).unwrap();
            let parsed: DisplayId = id.to_string().parse().unwrap();
            prop_assert_eq!(id, parsed);
        }

        /// Property: formatted ids are at least four characters (`#` + 3 digits)
        #[test]
        fn test_display_id_min_width(seq in 1u32..100_000) {
            let rendered = DisplayId::from_seq(seq).unwrap().to_string();
            prop_assert!(rendered.len() >= 4);
        }
    }
}
