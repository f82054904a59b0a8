//! Status module - lifecycle statuses and the derived visibility tier

/// Lifecycle status of an archive entry
///
/// The status is the only mutable field of an entry after creation. It is set
/// by the judging step and may later be downgraded by chain collapse when a
/// cited foundation is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Founding-era deposit, not yet adversarially tested
    Founding,

    /// Claim currently standing in the main archive
    Surviving,

    /// Claim that survived with narrowed scope, under review
    Partial,

    /// Claim destroyed by a successful challenge
    Destroyed,

    /// Claim withdrawn by its own state
    Retracted,

    /// Claim whose cited foundation was invalidated by chain collapse
    FoundationChallenged,

    /// Claim that survived a completed challenge cycle
    Survived,
}

/// Coarse visibility bucket derived from status
///
/// Main entries are citable; quarantine entries are visible but not citable;
/// graveyard entries are retained for meta-learning only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveTier {
    /// Citable, surviving knowledge
    Main,

    /// Partial or untested entries, under review
    Quarantine,

    /// Destroyed, retracted, or foundation-challenged entries
    Graveyard,
}

impl EntryStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Founding => "founding",
            EntryStatus::Surviving => "surviving",
            EntryStatus::Partial => "partial",
            EntryStatus::Destroyed => "destroyed",
            EntryStatus::Retracted => "retracted",
            EntryStatus::FoundationChallenged => "foundation_challenged",
            EntryStatus::Survived => "survived",
        }
    }

    /// Parse a status from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "founding" => Some(EntryStatus::Founding),
            "surviving" => Some(EntryStatus::Surviving),
            "partial" => Some(EntryStatus::Partial),
            "destroyed" => Some(EntryStatus::Destroyed),
            "retracted" => Some(EntryStatus::Retracted),
            "foundation_challenged" => Some(EntryStatus::FoundationChallenged),
            "survived" => Some(EntryStatus::Survived),
            _ => None,
        }
    }

    /// The visibility tier this status maps to
    ///
    /// `surviving`/`survived` and `founding`/`partial` are kept as distinct
    /// statuses even though they share a tier; the export and the judging
    /// step rely on the distinction.
    pub fn tier(&self) -> ArchiveTier {
        match self {
            EntryStatus::Surviving | EntryStatus::Survived => ArchiveTier::Main,
            EntryStatus::Founding | EntryStatus::Partial => ArchiveTier::Quarantine,
            EntryStatus::Destroyed
            | EntryStatus::Retracted
            | EntryStatus::FoundationChallenged => ArchiveTier::Graveyard,
        }
    }

    /// Whether this status already lies in the graveyard tier
    ///
    /// Chain collapse skips such entries so repeated collapses are idempotent.
    pub fn is_graveyard(&self) -> bool {
        self.tier() == ArchiveTier::Graveyard
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid status: {}", s))
    }
}

impl ArchiveTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveTier::Main => "main",
            ArchiveTier::Quarantine => "quarantine",
            ArchiveTier::Graveyard => "graveyard",
        }
    }
}
