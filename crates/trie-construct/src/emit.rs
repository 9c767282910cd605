//! Sorted Emitter & Trie Serializer (component F): an in-order depth-first
//! walk of the trie that writes the sorted-unique-reads file, and a
//! flat-file serializer for the `-edges` trie image.

use std::io::Write;

use trie_common::{Error, GlobalIndex, Result, Symbol, ROOT_CELL};
use trie_transport::{Cluster, Tag};

pub struct SortedEmitter;

impl SortedEmitter {
    /// Walks the trie in alphabet order (A,C,G,T,N) from the root, writing
    /// one `<sequence> <id right-aligned in 12 columns>` line per unique
    /// read, in strict lexicographic order. Returns the number of reads
    /// emitted.
    pub fn emit_sorted(cluster: &Cluster, out: &mut impl Write) -> Result<usize> {
        let mut path = Vec::new();
        let mut count = 0usize;
        Self::walk(cluster, ROOT_CELL, &mut path, out, &mut count)?;
        Ok(count)
    }

    fn walk(
        cluster: &Cluster,
        cell_index: GlobalIndex,
        path: &mut Vec<u8>,
        out: &mut impl Write,
        count: &mut usize,
    ) -> Result<()> {
        let cell = cluster.read_cell(cell_index)?;
        for symbol in Symbol::ALPHABET {
            let edge = cell.edge(symbol);
            if edge.is_empty() {
                continue;
            }
            path.push(symbol.to_byte());
            if let Some(read_id) = edge.leaf_id() {
                tracing::trace!(tag = Tag::OutputRead.as_str(), read_id, "output_read");
                writeln!(
                    out,
                    "{} {:>12}",
                    String::from_utf8_lossy(path),
                    read_id
                )
                .map_err(|e| Error::io("write sorted-unique-reads file", e))?;
                *count += 1;
            } else if let Some(child) = edge.child_index() {
                tracing::trace!(tag = Tag::WalkTrie.as_str(), peer = cluster.owner(child), "walk_trie");
                Self::walk(cluster, child, path, out, count)?;
            }
            path.pop();
        }
        Ok(())
    }
}

/// Persists the trie to a single flat buffer: shards concatenated in index
/// order, each contributing only its used prefix (`last_used_local + 1`
/// cells).
pub struct TrieSerializer;

impl TrieSerializer {
    pub fn write_edges_file(cluster: &Cluster, out: &mut impl Write) -> Result<()> {
        for peer in 0..cluster.n_peers() {
            tracing::trace!(tag = Tag::DumpTrie.as_str(), peer, "dump_trie");
            let used = cluster.used_len(peer);
            let bytes = cluster.table(peer).serialize_prefix(used);
            tracing::trace!(tag = Tag::RawMem.as_str(), peer, bytes = bytes.len(), "raw_mem");
            out.write_all(&bytes)
                .map_err(|e| Error::io("write edges file", e))?;
        }
        Ok(())
    }
}

/// Records, for each read identifier in assignment order, the byte offset
/// of its record in the original input file (the `-index` file).
pub struct IndexWriter {
    out: std::io::BufWriter<std::fs::File>,
}

impl IndexWriter {
    pub fn create(path: &std::path::Path) -> Result<IndexWriter> {
        let file = std::fs::File::create(path).map_err(|e| Error::io("create index file", e))?;
        Ok(IndexWriter {
            out: std::io::BufWriter::new(file),
        })
    }

    pub fn append(&mut self, file_offset: u64) -> Result<()> {
        self.out
            .write_all(&file_offset.to_le_bytes())
            .map_err(|e| Error::io("write index file", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| Error::io("flush index file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dups::DuplicatesLog;
    use crate::insert::InsertEngine;

    #[test]
    fn emits_in_lexicographic_order_with_assigned_ids() {
        let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        let dir = tempfile::tempdir().unwrap();
        let mut dups = DuplicatesLog::create(&dir.path().join("dups")).unwrap();

        for (id, seq) in [(0u64, "AAAG"), (1, "AAAA"), (2, "AAAC")] {
            InsertEngine::insert_read(&mut cluster, &mut dups, id, seq.as_bytes()).unwrap();
        }

        let mut out = Vec::new();
        let count = SortedEmitter::emit_sorted(&cluster, &mut out).unwrap();
        assert_eq!(count, 3);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], format!("AAAA {:>12}", 1));
        assert_eq!(lines[1], format!("AAAC {:>12}", 2));
        assert_eq!(lines[2], format!("AAAG {:>12}", 0));
    }

    #[test]
    fn edges_file_length_matches_used_cells() {
        let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        let dir = tempfile::tempdir().unwrap();
        let mut dups = DuplicatesLog::create(&dir.path().join("dups")).unwrap();
        InsertEngine::insert_read(&mut cluster, &mut dups, 0, b"AAAA").unwrap();

        let mut out = Vec::new();
        TrieSerializer::write_edges_file(&cluster, &mut out).unwrap();
        let last_used_edge = cluster.used_len(0) - 1;
        assert_eq!(out.len() as u64, 40 * (last_used_edge + 1));
    }
}
