//! Severity module - ordered verdict levels and validation result merging

use std::fmt;

/// Severity of a validation finding
///
/// A total order holds: `Info < Warning < Flag`. Flags represent objective
/// falsity or structural violations and fail the aggregate; warnings and
/// info notes are advisory for the downstream judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note, no action required
    Info,

    /// Plausibility concern, surfaced to the judge
    Warning,

    /// Objective failure; the aggregate cannot pass
    Flag,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Flag => "flag",
        }
    }

    /// Pure merge: the more severe of the two
    pub fn merge(self, other: Severity) -> Severity {
        self.max(other)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single check function
///
/// Every universal, domain-routed, and anchor check produces one of these;
/// the pipeline folds them into an [`AggregateResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the check passed (flags never pass)
    pub passed: bool,

    /// Human-readable findings, in detection order
    pub notes: Vec<String>,

    /// Severity of the findings
    pub severity: Severity,
}

impl ValidationResult {
    /// A clean pass with no findings
    pub fn pass() -> Self {
        Self {
            passed: true,
            notes: Vec::new(),
            severity: Severity::Info,
        }
    }

    /// A passing result carrying an informational note
    pub fn info(note: impl Into<String>) -> Self {
        Self {
            passed: true,
            notes: vec![note.into()],
            severity: Severity::Info,
        }
    }

    /// A passing result carrying a plausibility warning
    pub fn warning(note: impl Into<String>) -> Self {
        Self {
            passed: true,
            notes: vec![note.into()],
            severity: Severity::Warning,
        }
    }

    /// A failing result: objective falsity or structural violation
    pub fn flag(note: impl Into<String>) -> Self {
        Self {
            passed: false,
            notes: vec![note.into()],
            severity: Severity::Flag,
        }
    }
}

/// Aggregate verdict over all checks for one claim
///
/// Notes are bucketed by severity; `all_passed` holds exactly when no check
/// produced a flag. Warnings and info never fail the aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    /// Flag-severity findings (objective failures)
    pub flags: Vec<String>,

    /// Warning-severity findings (plausibility concerns)
    pub warnings: Vec<String>,

    /// Informational findings
    pub info: Vec<String>,
}

impl AggregateResult {
    /// An empty aggregate (vacuously passing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every check passed (no flags present)
    pub fn all_passed(&self) -> bool {
        self.flags.is_empty()
    }

    /// Fold one check result into the aggregate
    pub fn absorb(&mut self, result: ValidationResult) {
        let bucket = match result.severity {
            Severity::Flag => &mut self.flags,
            Severity::Warning => &mut self.warnings,
            Severity::Info => &mut self.info,
        };
        bucket.extend(result.notes);
    }

    /// Pure merge of two aggregates
    pub fn merge(mut self, other: AggregateResult) -> AggregateResult {
        self.flags.extend(other.flags);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
        self
    }

    /// One-line human-readable summary for logs and judge prompts
    pub fn summary(&self) -> String {
        format!(
            "{} flag(s), {} warning(s), {} info note(s)",
            self.flags.len(),
            self.warnings.len(),
            self.info.len()
        )
    }
}
