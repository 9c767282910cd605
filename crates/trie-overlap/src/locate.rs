//! Overlap Locator (component G): for every suffix of every read, descends
//! the trie to a terminal node and emits overlap records.

use trie_common::{GlobalIndex, ReadId, Result, Symbol, ROOT_CELL};
use trie_transport::{Cluster, Tag};

/// Output format selected on the CLI. `Anchors` defers expansion (default,
/// `.ovl` files); `Afg` expands each anchor's subtree into pairwise overlap
/// records (`.afg` files).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapFormat {
    Anchors,
    Afg,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapConfig {
    pub format: OverlapFormat,
    pub min_overlap: usize,
    pub max_overlaps: usize,
    /// Whether a read's suffix matching its own prefix should be reported.
    /// Defaults to `true`: a read is itself a valid anchor for its own
    /// suffixes, and callers that want self-matches excluded can turn
    /// this off explicitly.
    pub self_overlaps: bool,
}

impl OverlapConfig {
    pub fn default_for(format: OverlapFormat) -> OverlapConfig {
        match format {
            OverlapFormat::Afg => OverlapConfig {
                format,
                min_overlap: 14,
                max_overlaps: 8,
                self_overlaps: true,
            },
            OverlapFormat::Anchors => OverlapConfig {
                format,
                min_overlap: 1,
                max_overlaps: usize::MAX,
                self_overlaps: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OverlapRecord {
    /// `.ovl` line: the anchor node reached after consuming the suffix,
    /// expansion deferred to a downstream tool.
    Anchor {
        source_read_id: ReadId,
        offset: usize,
        cell_index: GlobalIndex,
    },
    /// `.afg` block: a fully expanded pairwise overlap.
    Pair {
        source_read_id: ReadId,
        other_read_id: ReadId,
        offset: usize,
    },
}

pub struct OverlapLocator;

impl OverlapLocator {
    /// Descends the trie letter by letter for `suffix`. Reads are fixed
    /// length, so a terminal edge can only occur at the full read length —
    /// strictly deeper than any suffix probed here — meaning a terminal
    /// edge encountered mid-descent indicates corrupt trie state, not a
    /// valid match; `locate` treats it as a dead end rather than panicking.
    pub fn locate(cluster: &Cluster, suffix: &[u8]) -> Result<Option<GlobalIndex>> {
        let mut cell = ROOT_CELL;
        for &byte in suffix {
            let symbol = Symbol::from_byte(byte);
            let edge = cluster.read_cell(cell)?.edge(symbol);
            if edge.is_empty() {
                return Ok(None); // dead
            }
            match edge.child_index() {
                Some(child) => {
                    tracing::trace!(tag = Tag::Locate.as_str(), peer = cluster.owner(child), "locate");
                    cell = child; // descending (same- or cross-shard transparently)
                }
                None => {
                    tracing::warn!("terminal edge encountered before full read length");
                    return Ok(None);
                }
            }
        }
        Ok(Some(cell)) // matched
    }

    /// Probes suffixes of `sequence` from length `read_len - 1` down to
    /// `config.min_overlap`, emitting one record per match per
    /// `config.format`. `min_overlap`/`max_overlaps` are only meaningful in
    /// `Afg` mode: `Anchors` is raw-pointer mode and reports every suffix
    /// length unfiltered, expansion (and thus the cap) deferred downstream.
    pub fn probe_read(
        cluster: &Cluster,
        source_read_id: ReadId,
        sequence: &[u8],
        config: &OverlapConfig,
    ) -> Result<Vec<OverlapRecord>> {
        let read_len = sequence.len();
        let mut records = Vec::new();

        let lo = match config.format {
            OverlapFormat::Afg => config.min_overlap.max(1),
            OverlapFormat::Anchors => 1,
        };
        for suffix_len in (lo..read_len).rev() {
            let offset = read_len - suffix_len;
            let suffix = &sequence[offset..];
            let Some(cell) = Self::locate(cluster, suffix)? else {
                continue;
            };
            match config.format {
                OverlapFormat::Anchors => {
                    records.push(OverlapRecord::Anchor {
                        source_read_id,
                        offset,
                        cell_index: cell,
                    });
                }
                OverlapFormat::Afg => {
                    let mut count = 0usize;
                    Self::collect_leaves(cluster, cell, config.max_overlaps, &mut count, &mut |other_id| {
                        if !config.self_overlaps && other_id == source_read_id {
                            return;
                        }
                        records.push(OverlapRecord::Pair {
                            source_read_id,
                            other_read_id: other_id,
                            offset,
                        });
                    })?;
                }
            }
        }
        Ok(records)
    }

    /// Enumerates every terminal leaf in the subtree beneath `cell`, in
    /// alphabet order, up to `cap` emissions; descent ceases once the cap
    /// is reached.
    fn collect_leaves(
        cluster: &Cluster,
        cell: GlobalIndex,
        cap: usize,
        emitted: &mut usize,
        sink: &mut impl FnMut(ReadId),
    ) -> Result<()> {
        if *emitted >= cap {
            return Ok(());
        }
        tracing::trace!(tag = Tag::Print.as_str(), peer = cluster.owner(cell), "print");
        let c = cluster.read_cell(cell)?;
        for symbol in Symbol::ALPHABET {
            if *emitted >= cap {
                return Ok(());
            }
            let edge = c.edge(symbol);
            if let Some(read_id) = edge.leaf_id() {
                sink(read_id);
                *emitted += 1;
            } else if let Some(child) = edge.child_index() {
                Self::collect_leaves(cluster, child, cap, emitted, sink)?;
            }
        }
        Ok(())
    }
}
