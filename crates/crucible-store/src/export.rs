//! Tier-grouped export of the archive
//!
//! Produces the read view consumed by external reporting: three fixed
//! sections, each ordered by display id. Rendering is pure and read-only.

use crucible_domain::{ArchiveEntry, ArchiveTier};

/// Tier-partitioned read view of the archive
///
/// Each list preserves display-id order from the underlying scan.
#[derive(Debug, Clone, Default)]
pub struct GroupedExport {
    /// Entries whose status maps to the main tier
    pub main: Vec<ArchiveEntry>,

    /// Entries whose status maps to the quarantine tier
    pub quarantine: Vec<ArchiveEntry>,

    /// Entries whose status maps to the graveyard tier
    pub graveyard: Vec<ArchiveEntry>,
}

impl GroupedExport {
    /// Partition an ordered entry list by derived tier
    pub fn partition(entries: Vec<ArchiveEntry>) -> Self {
        let mut export = Self::default();
        for entry in entries {
            match entry.tier() {
                ArchiveTier::Main => export.main.push(entry),
                ArchiveTier::Quarantine => export.quarantine.push(entry),
                ArchiveTier::Graveyard => export.graveyard.push(entry),
            }
        }
        export
    }

    /// Total entry count across all tiers
    pub fn len(&self) -> usize {
        self.main.len() + self.quarantine.len() + self.graveyard.len()
    }

    /// Whether the archive is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render the grouped export as markdown
///
/// Section order and titles are fixed; downstream site generation keys on
/// them verbatim.
pub fn render_markdown(export: &GroupedExport, cycle: u32) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Knowledge Archive — Cycle {}\n\n", cycle));

    render_section(&mut out, "## Main Archive (Surviving)", &export.main);
    render_section(
        &mut out,
        "## Quarantine (Partial/Under Review)",
        &export.quarantine,
    );
    render_section(
        &mut out,
        "## Graveyard (Destroyed/Retracted)",
        &export.graveyard,
    );

    out
}

fn render_section(out: &mut String, title: &str, entries: &[ArchiveEntry]) {
    out.push_str(title);
    out.push('\n');
    if entries.is_empty() {
        out.push_str("\n_(empty)_\n\n");
        return;
    }
    for entry in entries {
        out.push_str(&format!(
            "\n### {} [{}] — {} ({})\n\n",
            entry.display_id,
            entry.status.as_str(),
            entry.source_state,
            entry.claim_type.as_str(),
        ));
        out.push_str(&entry.raw_claim_text);
        out.push('\n');
        if !entry.citations.is_empty() {
            let cites: Vec<String> = entry.citations.iter().map(ToString::to_string).collect();
            out.push_str(&format!("\nCites: {}\n", cites.join(", ")));
        }
        if let Some(reasoning) = &entry.outcome_reasoning {
            out.push_str(&format!("\nOutcome: {}\n", reasoning));
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_domain::{ClaimType, DisplayId, EntryStatus, EntryType};

    fn entry(seq: u32, status: EntryStatus) -> ArchiveEntry {
        ArchiveEntry::new(
            DisplayId::from_seq(seq).unwrap(),
            EntryType::Claim,
            "TestState",
            "Researcher",
            1,
            status,
            ClaimType::Discovery,
            format!("claim body {}", seq),
        )
    }

    #[test]
    fn test_partition_by_tier() {
        let export = GroupedExport::partition(vec![
            entry(1, EntryStatus::Surviving),
            entry(2, EntryStatus::Partial),
            entry(3, EntryStatus::Retracted),
            entry(4, EntryStatus::Survived),
        ]);
        assert_eq!(export.main.len(), 2);
        assert_eq!(export.quarantine.len(), 1);
        assert_eq!(export.graveyard.len(), 1);
        assert_eq!(export.len(), 4);
    }

    #[test]
    fn test_partition_preserves_order() {
        let export = GroupedExport::partition(vec![
            entry(1, EntryStatus::Surviving),
            entry(5, EntryStatus::Surviving),
            entry(9, EntryStatus::Surviving),
        ]);
        let seqs: Vec<u32> = export.main.iter().map(|e| e.display_id.seq()).collect();
        assert_eq!(seqs, vec![1, 5, 9]);
    }

    #[test]
    fn test_markdown_sections_fixed_order() {
        let export = GroupedExport::partition(vec![
            entry(1, EntryStatus::Surviving),
            entry(2, EntryStatus::Partial),
            entry(3, EntryStatus::Retracted),
        ]);
        let md = render_markdown(&export, 3);

        let main_pos = md.find("## Main Archive (Surviving)").unwrap();
        let quarantine_pos = md.find("## Quarantine (Partial/Under Review)").unwrap();
        let graveyard_pos = md.find("## Graveyard (Destroyed/Retracted)").unwrap();
        assert!(main_pos < quarantine_pos);
        assert!(quarantine_pos < graveyard_pos);
        assert!(md.contains("Cycle 3"));
    }

    #[test]
    fn test_markdown_empty_sections_render() {
        let md = render_markdown(&GroupedExport::default(), 1);
        assert!(md.contains("## Main Archive (Surviving)"));
        assert!(md.contains("## Quarantine (Partial/Under Review)"));
        assert!(md.contains("## Graveyard (Destroyed/Retracted)"));
    }
}
