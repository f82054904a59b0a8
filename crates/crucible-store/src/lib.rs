//! Crucible Storage Layer
//!
//! Implements the EntryStore trait using SQLite.
//!
//! # Architecture
//!
//! - SQLite for structured entry data (text, status, citation links)
//! - A single-row allocator table for sequential display ids
//! - A secondary table keyed by state name for budgets and credibility
//!
//! The store is single-writer. Every operation is internally atomic: display
//! id allocation, entry insertion with back-reference maintenance, and the
//! full chain-collapse cascade each run inside one transaction.
//!
//! # Examples
//!
//! ```no_run
//! use crucible_store::SqliteArchive;
//!
//! let store = SqliteArchive::new("crucible.db").unwrap();
//! // Store is now ready for archive operations
//! ```

#![warn(missing_docs)]

pub mod export;

use crucible_domain::traits::EntryStore;
use crucible_domain::{ArchiveEntry, ClaimType, DisplayId, EntryId, EntryStatus, EntryType, StateBudget};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use export::{render_markdown, GroupedExport};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Display id already exists
    #[error("Duplicate display id: {0}")]
    DuplicateId(String),
}

/// SQLite-based implementation of EntryStore
///
/// Provides persistent storage for archive entries and state budgets.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteArchive instance.
pub struct SqliteArchive {
    conn: Connection,
}

impl SqliteArchive {
    /// Create a new SqliteArchive with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crucible_store::SqliteArchive;
    ///
    /// let store = SqliteArchive::new("crucible.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // journal_mode returns a row, so it cannot go through execute_batch
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Serialize a display id list to its JSON column form
    fn ids_to_json(ids: &[DisplayId]) -> String {
        let strings: Vec<String> = ids.iter().map(DisplayId::to_string).collect();
        // Vec<String> to a JSON array cannot fail
        serde_json::to_string(&strings).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse a JSON column back into a display id list
    fn json_to_ids(json: &str) -> Result<Vec<DisplayId>, StoreError> {
        let strings: Vec<String> = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Bad citation JSON: {}", e)))?;
        strings
            .iter()
            .map(|s| {
                s.parse::<DisplayId>()
                    .map_err(|e| StoreError::InvalidData(e))
            })
            .collect()
    }

    /// Convert a raw row into an ArchiveEntry
    #[allow(clippy::too_many_arguments)]
    fn build_entry(
        display_id: String,
        entry_id: String,
        entry_type: String,
        source_state: String,
        source_entity: String,
        cycle_created: i64,
        status: String,
        claim_type: String,
        raw_claim_text: String,
        citations: String,
        referenced_by: String,
        outcome_reasoning: Option<String>,
    ) -> Result<ArchiveEntry, StoreError> {
        Ok(ArchiveEntry {
            entry_id: EntryId::from_string(&entry_id).map_err(StoreError::InvalidData)?,
            display_id: display_id
                .parse::<DisplayId>()
                .map_err(StoreError::InvalidData)?,
            entry_type: EntryType::parse(&entry_type)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown entry type: {}", entry_type)))?,
            source_state,
            source_entity,
            cycle_created: cycle_created as u32,
            status: EntryStatus::parse(&status)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown status: {}", status)))?,
            claim_type: ClaimType::parse(&claim_type),
            raw_claim_text,
            citations: Self::json_to_ids(&citations)?,
            referenced_by: Self::json_to_ids(&referenced_by)?,
            outcome_reasoning,
        })
    }

    /// All entries ordered by sequence number (display-id order)
    pub(crate) fn all_entries_ordered(&self) -> Result<Vec<ArchiveEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT display_id, entry_id, entry_type, source_state, source_entity,
                    cycle_created, status, claim_type, raw_claim_text, citations,
                    referenced_by, outcome_reasoning
             FROM entries ORDER BY seq",
        )?;
        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, Option<String>>(11)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|(d, e, t, ss, se, c, st, ct, raw, cit, refs, outcome)| {
                Self::build_entry(d, e, t, ss, se, c, st, ct, raw, cit, refs, outcome)
            })
            .collect()
    }

    /// Tier-partitioned read view ordered by display id
    ///
    /// Read-only; used by external reporting. See [`export::render_markdown`]
    /// for the fixed three-section text rendering.
    pub fn export_grouped(&self) -> Result<GroupedExport, StoreError> {
        Ok(GroupedExport::partition(self.all_entries_ordered()?))
    }

    // ─── State budgets ───

    /// Insert or replace a state's ledger row
    pub fn save_state_budget(&mut self, budget: &StateBudget) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO state_budgets
                 (state_name, domain, domain_type, token_budget, rival_name, cycle,
                  claims_survived, claims_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(state_name) DO UPDATE SET
                 domain = excluded.domain,
                 domain_type = excluded.domain_type,
                 token_budget = excluded.token_budget,
                 rival_name = excluded.rival_name,
                 cycle = excluded.cycle",
            params![
                &budget.state_name,
                &budget.domain,
                &budget.domain_type,
                budget.token_budget as i64,
                &budget.rival_name,
                budget.cycle as i64,
                budget.claims_survived as i64,
                budget.claims_total as i64,
            ],
        )?;
        Ok(())
    }

    /// Fetch a state's ledger row
    pub fn get_state_budget(&self, state_name: &str) -> Result<Option<StateBudget>, StoreError> {
        let budget = self
            .conn
            .query_row(
                "SELECT state_name, domain, domain_type, token_budget, rival_name, cycle,
                        claims_survived, claims_total
                 FROM state_budgets WHERE state_name = ?1",
                params![state_name],
                |row| {
                    Ok(StateBudget {
                        state_name: row.get(0)?,
                        domain: row.get(1)?,
                        domain_type: row.get(2)?,
                        token_budget: row.get::<_, i64>(3)?.max(0) as u64,
                        rival_name: row.get(4)?,
                        cycle: row.get::<_, i64>(5)? as u32,
                        claims_survived: row.get::<_, i64>(6)? as u32,
                        claims_total: row.get::<_, i64>(7)? as u32,
                    })
                },
            )
            .optional()?;
        Ok(budget)
    }

    /// Debit a state's token budget, floored at zero
    ///
    /// Oversized debits clamp; running out of tokens is a governance
    /// condition, not a storage fault.
    pub fn debit_budget(&mut self, state_name: &str, amount: u64) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE state_budgets
             SET token_budget = MAX(token_budget - ?1, 0)
             WHERE state_name = ?2",
            params![amount as i64, state_name],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(state_name.to_string()));
        }
        Ok(())
    }

    /// Record one pipeline outcome for a state
    pub fn record_outcome(&mut self, state_name: &str, survived: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE state_budgets
             SET claims_total = claims_total + 1,
                 claims_survived = claims_survived + ?1
             WHERE state_name = ?2",
            params![i64::from(survived), state_name],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(state_name.to_string()));
        }
        Ok(())
    }

    /// Survived-claim ratio for a state; zero while no claims recorded
    pub fn credibility(&self, state_name: &str) -> Result<f64, StoreError> {
        let (survived, total): (i64, i64) = self
            .conn
            .query_row(
                "SELECT claims_survived, claims_total FROM state_budgets WHERE state_name = ?1",
                params![state_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(state_name.to_string()))?;
        if total == 0 {
            Ok(0.0)
        } else {
            Ok(survived as f64 / total as f64)
        }
    }
}

impl EntryStore for SqliteArchive {
    type Error = StoreError;

    fn next_display_id(&mut self) -> Result<DisplayId, Self::Error> {
        // Allocation is its own transaction: read and bump together, so the
        // issued sequence is monotonic and gap-free
        let tx = self.conn.transaction()?;
        let seq: i64 = tx.query_row("SELECT next_value FROM display_id_seq WHERE id = 1", [], |row| {
            row.get(0)
        })?;
        tx.execute(
            "UPDATE display_id_seq SET next_value = next_value + 1 WHERE id = 1",
            [],
        )?;
        tx.commit()?;
        DisplayId::from_seq(seq as u32)
            .ok_or_else(|| StoreError::InvalidData(format!("Bad allocator value: {}", seq)))
    }

    fn save_entry(&mut self, entry: ArchiveEntry) -> Result<DisplayId, Self::Error> {
        let display_id = entry.display_id;
        let tx = self.conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM entries WHERE display_id = ?1",
                params![display_id.to_string()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::DuplicateId(display_id.to_string()));
        }

        tx.execute(
            "INSERT INTO entries
                 (display_id, seq, entry_id, entry_type, source_state, source_entity,
                  cycle_created, status, claim_type, raw_claim_text, citations,
                  referenced_by, outcome_reasoning)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                display_id.to_string(),
                display_id.seq() as i64,
                entry.entry_id.to_string(),
                entry.entry_type.as_str(),
                &entry.source_state,
                &entry.source_entity,
                entry.cycle_created as i64,
                entry.status.as_str(),
                entry.claim_type.as_str(),
                &entry.raw_claim_text,
                Self::ids_to_json(&entry.citations),
                Self::ids_to_json(&entry.referenced_by),
                entry.outcome_reasoning.as_deref(),
            ],
        )?;

        // Maintain back-references: every cited entry learns about its new
        // dependent. Unknown citations are validation's concern, not a
        // storage fault.
        for cited in &entry.citations {
            let current: Option<String> = tx
                .query_row(
                    "SELECT referenced_by FROM entries WHERE display_id = ?1",
                    params![cited.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            match current {
                Some(json) => {
                    let mut refs = Self::json_to_ids(&json)?;
                    if !refs.contains(&display_id) {
                        refs.push(display_id);
                        tx.execute(
                            "UPDATE entries SET referenced_by = ?1 WHERE display_id = ?2",
                            params![Self::ids_to_json(&refs), cited.to_string()],
                        )?;
                    }
                }
                None => {
                    warn!(citation = %cited, entry = %display_id, "citation target not in archive");
                }
            }
        }

        tx.commit()?;
        debug!(entry = %display_id, "entry saved");
        Ok(display_id)
    }

    fn get_entry(&self, id: DisplayId) -> Result<Option<ArchiveEntry>, Self::Error> {
        let raw = self
            .conn
            .query_row(
                "SELECT display_id, entry_id, entry_type, source_state, source_entity,
                        cycle_created, status, claim_type, raw_claim_text, citations,
                        referenced_by, outcome_reasoning
                 FROM entries WHERE display_id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, Option<String>>(11)?,
                    ))
                },
            )
            .optional()?;

        match raw {
            Some((d, e, t, ss, se, c, st, ct, text, cit, refs, outcome)) => Ok(Some(
                Self::build_entry(d, e, t, ss, se, c, st, ct, text, cit, refs, outcome)?,
            )),
            None => Ok(None),
        }
    }

    fn update_status(&mut self, id: DisplayId, status: EntryStatus) -> Result<(), Self::Error> {
        let changed = self.conn.execute(
            "UPDATE entries SET status = ?1 WHERE display_id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(entry = %id, status = status.as_str(), "status updated");
        Ok(())
    }

    fn run_chain_collapse(
        &mut self,
        origin: DisplayId,
    ) -> Result<BTreeSet<DisplayId>, Self::Error> {
        let tx = self.conn.transaction()?;

        // Snapshot the citation graph into an in-memory adjacency map
        // (id -> dependents) so the traversal never touches live rows
        let mut dependents: HashMap<DisplayId, Vec<DisplayId>> = HashMap::new();
        let mut statuses: HashMap<DisplayId, EntryStatus> = HashMap::new();
        {
            let mut stmt =
                tx.prepare("SELECT display_id, status, referenced_by FROM entries")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (id_str, status_str, refs_json) in rows {
                let id = id_str
                    .parse::<DisplayId>()
                    .map_err(StoreError::InvalidData)?;
                let status = EntryStatus::parse(&status_str).ok_or_else(|| {
                    StoreError::InvalidData(format!("Unknown status: {}", status_str))
                })?;
                statuses.insert(id, status);
                dependents.insert(id, Self::json_to_ids(&refs_json)?);
            }
        }

        if !statuses.contains_key(&origin) {
            return Err(StoreError::NotFound(origin.to_string()));
        }

        // Breadth-first over back-references, unbounded: every transitive
        // dependent is reached. The visited set terminates the walk even if
        // the citation graph somehow contains a cycle.
        let mut affected: BTreeSet<DisplayId> = BTreeSet::new();
        let mut visited: BTreeSet<DisplayId> = BTreeSet::new();
        let mut queue: VecDeque<DisplayId> = VecDeque::new();
        visited.insert(origin);
        queue.push_back(origin);

        while let Some(current) = queue.pop_front() {
            let Some(citers) = dependents.get(&current) else {
                continue;
            };
            for &citer in citers {
                if !visited.insert(citer) {
                    continue;
                }
                queue.push_back(citer);
                let Some(status) = statuses.get(&citer) else {
                    continue;
                };
                // Entries already buried stay as they are; repeat collapses
                // are idempotent
                if status.is_graveyard() {
                    continue;
                }
                affected.insert(citer);
            }
        }

        for id in &affected {
            tx.execute(
                "UPDATE entries SET status = ?1 WHERE display_id = ?2",
                params![EntryStatus::FoundationChallenged.as_str(), id.to_string()],
            )?;
        }
        tx.commit()?;

        info!(origin = %origin, touched = affected.len(), "chain collapse applied");
        Ok(affected)
    }

    fn known_display_ids(&self) -> Result<BTreeSet<DisplayId>, Self::Error> {
        let mut stmt = self.conn.prepare("SELECT seq FROM entries ORDER BY seq")?;
        let seqs = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        seqs.into_iter()
            .map(|seq| {
                DisplayId::from_seq(seq as u32)
                    .ok_or_else(|| StoreError::InvalidData(format!("Bad seq: {}", seq)))
            })
            .collect()
    }
}
