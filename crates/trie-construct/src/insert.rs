//! Trie Insert Engine (component E): walks/extends the trie for one read,
//! detecting duplicates and migrating across shards as the walk descends.

use trie_common::{Error, GlobalIndex, ReadId, Result, Symbol, ROOT_CELL};
use trie_transport::{Cluster, Tag};

use crate::dups::DuplicatesLog;

pub enum InsertOutcome {
    Inserted,
    Duplicate { existing_id: ReadId },
}

pub struct InsertEngine;

impl InsertEngine {
    /// Inserts `sequence` with identifier `read_id`, starting from the root.
    /// Asserts the "no backward migration" invariant as it walks: a cell
    /// whose owning shard id is lower than the previous step's is a
    /// programming bug, not a recoverable condition.
    pub fn insert_read(
        cluster: &mut Cluster,
        dups: &mut DuplicatesLog,
        read_id: ReadId,
        sequence: &[u8],
    ) -> Result<InsertOutcome> {
        assert!(!sequence.is_empty(), "reads are never empty");
        tracing::trace!(tag = Tag::AddRead.as_str(), read_id, "add_read");

        let mut anchor: GlobalIndex = ROOT_CELL;
        let mut last_shard = cluster.owner(anchor);

        for (i, &byte) in sequence.iter().enumerate() {
            let symbol = Symbol::from_byte(byte);
            let owner = cluster.owner(anchor);
            if owner < last_shard {
                return Err(Error::InvariantViolation(
                    "insert migrated to a lower-numbered shard",
                ));
            }
            last_shard = owner;

            let is_last_letter = i + 1 == sequence.len();
            let existing = cluster.read_cell(anchor)?.edge(symbol);

            if is_last_letter {
                if let Some(existing_id) = existing.leaf_id() {
                    tracing::debug!(existing_id, read_id, "duplicate read");
                    dups.record(existing_id, read_id)?;
                    return Ok(InsertOutcome::Duplicate { existing_id });
                }
                let leaf = trie_common::EdgeWord::make_leaf(read_id).map_err(|_| {
                    Error::InvariantViolation("read id exceeds the 63-bit payload space")
                })?;
                cluster.write_edge(anchor, symbol, leaf)?;
                return Ok(InsertOutcome::Inserted);
            }

            let child = if existing.is_empty() {
                let fresh = cluster.next_free(owner)?;
                cluster.write_edge(anchor, symbol, trie_common::EdgeWord::make_child(fresh))?;
                fresh
            } else {
                existing
                    .child_index()
                    .ok_or(Error::InvariantViolation("non-terminal edge carries a terminal payload"))?
            };
            anchor = child;
        }

        unreachable!("loop always returns on the last letter")
    }
}
