//! RPC Transport (component C) and the cross-peer half of the Distributed
//! Allocator (component D), combined into one in-process `Cluster`.
//!
//! Per the design notes, peers are modeled as single-threaded RPC servers
//! that block on one request at a time. Rather than standing up real
//! sockets, a `Cluster` holds every peer's state in one address space and
//! "sends" a message by calling directly into the target peer's method:
//! synchronous recursion is sufficient for a single-threaded test harness
//! where each peer services one request at a time. `Cluster`'s `&mut self`
//! methods make it
//! impossible to have two requests in flight against the same peer at once,
//! which is how the "one outstanding request per receiver" rule is upheld.

use trie_common::{Cell, Error, GlobalIndex, Result, Symbol};
use trie_shard::{LocalAllocator, ShardTable};

use crate::tag::Tag;

pub struct Peer {
    table: ShardTable,
    alloc: LocalAllocator,
    /// Cached shortcut to the peer this one last forwarded an allocation
    /// request to.
    next_guy: Option<usize>,
    exited: bool,
}

pub struct Cluster {
    shard_bits: u32,
    peers: Vec<Peer>,
}

impl Cluster {
    /// Builds a fresh cluster of `n_peers` peers, each with an empty
    /// `2^shard_bits`-cell shard. Peer 0's allocator starts past the root
    /// cell, matching `LocalAllocator::for_peer`.
    pub fn new(n_peers: usize, shard_bits: u32) -> Cluster {
        assert!(n_peers > 0, "a cluster needs at least one peer");
        let peers = (0..n_peers)
            .map(|i| Peer {
                table: ShardTable::new(shard_bits),
                alloc: LocalAllocator::for_peer(i as u64, 1 << shard_bits),
                next_guy: None,
                exited: false,
            })
            .collect();
        Cluster { shard_bits, peers }
    }

    /// Reconstructs a cluster from persisted `-edges` shard images, for the
    /// overlap phase. `used_lens[i]` is `last_used_local + 1` for peer `i`.
    pub fn from_shard_bytes(shard_bits: u32, shards: Vec<&[u8]>) -> Cluster {
        let peers = shards
            .into_iter()
            .enumerate()
            .map(|(peer, bytes)| {
                tracing::trace!(tag = Tag::RawMem.as_str(), peer, bytes = bytes.len(), "raw_mem");
                let last_used_local = (bytes.len() / Cell::BYTES) as i64 - 1;
                Peer {
                    table: ShardTable::load_from_bytes(shard_bits, bytes),
                    alloc: LocalAllocator::from_last_used(last_used_local, 1 << shard_bits),
                    next_guy: None,
                    exited: false,
                }
            })
            .collect::<Vec<_>>();
        Cluster { shard_bits, peers }
    }

    pub fn n_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn shard_bits(&self) -> u32 {
        self.shard_bits
    }

    pub fn owner(&self, index: GlobalIndex) -> usize {
        index.shard_id(self.shard_bits) as usize
    }

    pub fn read_cell(&self, index: GlobalIndex) -> Result<Cell> {
        let peer = self.owner(index);
        if peer >= self.peers.len() {
            return Err(Error::RpcMismatch {
                peer,
                index: index.get(),
            });
        }
        if self.peers[peer].exited {
            return Err(Error::InvariantViolation("rpc against a peer that already exited"));
        }
        tracing::trace!(tag = Tag::ReadCell.as_str(), peer, "read_cell");
        Ok(self.peers[peer]
            .table
            .read_cell(index.local_offset(self.shard_bits)))
    }

    pub fn write_edge(
        &mut self,
        index: GlobalIndex,
        symbol: Symbol,
        word: trie_common::EdgeWord,
    ) -> Result<()> {
        let peer = self.owner(index);
        if peer >= self.peers.len() {
            return Err(Error::RpcMismatch {
                peer,
                index: index.get(),
            });
        }
        if self.peers[peer].exited {
            return Err(Error::InvariantViolation("rpc against a peer that already exited"));
        }
        tracing::trace!(tag = Tag::WriteCell.as_str(), peer, "write_cell");
        self.peers[peer]
            .table
            .write_edge(index.local_offset(self.shard_bits), symbol, word);
        Ok(())
    }

    pub fn last_used_local(&self, peer: usize) -> i64 {
        self.peers[peer].alloc.last_used_local()
    }

    pub fn used_len(&self, peer: usize) -> u64 {
        self.peers[peer].alloc.used_len()
    }

    pub fn table(&self, peer: usize) -> &ShardTable {
        &self.peers[peer].table
    }

    /// `GET_NEXT_FREE`: allocates a fresh cell for `caller`, forwarding to
    /// another peer if `caller`'s own shard is full. The search only ever
    /// moves to higher peer indices: each peer's own allocations are
    /// already monotonic, and never searching backward keeps the forwarding
    /// chain (and thus global allocation order) a per-peer-chain property
    /// rather than a single global clock.
    pub fn next_free(&mut self, caller: usize) -> Result<GlobalIndex> {
        if self.peers[caller].exited {
            return Err(Error::InvariantViolation("rpc against a peer that already exited"));
        }
        if let Some(local) = self.peers[caller].alloc.try_allocate() {
            return Ok(GlobalIndex::from_parts(
                caller as u64,
                local,
                self.shard_bits,
            ));
        }

        tracing::debug!(peer = caller, tag = Tag::GetNextFree.as_str(), "shard full, forwarding");

        let n = self.peers.len();
        let mut chain = vec![caller];
        let mut probe = self.peers[caller].next_guy.unwrap_or(caller + 1);
        let mut hops = 0;
        loop {
            if probe >= n {
                return Err(Error::AllocExhausted);
            }
            if let Some(local) = self.peers[probe].alloc.try_allocate() {
                let index = GlobalIndex::from_parts(probe as u64, local, self.shard_bits);
                for p in chain {
                    self.peers[p].next_guy = Some(probe);
                }
                return Ok(index);
            }
            chain.push(probe);
            hops += 1;
            if hops > n {
                return Err(Error::AllocExhausted);
            }
            probe = self.peers[probe].next_guy.unwrap_or(probe + 1);
        }
    }

    /// `EXIT`: the driver broadcasts shutdown to every peer in its replica
    /// group on a fatal error.
    pub fn broadcast_exit(&mut self) {
        tracing::debug!(tag = Tag::Exit.as_str(), peers = self.peers.len(), "broadcast_exit");
        for peer in &mut self.peers {
            peer.exited = true;
        }
    }

    pub fn has_exited(&self, peer: usize) -> bool {
        self.peers[peer].exited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trie_common::{EdgeWord, ROOT_CELL};

    #[test]
    fn single_peer_allocates_locally() {
        let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        let idx = cluster.next_free(0).unwrap();
        assert_eq!(idx.get(), 2);
    }

    #[test]
    fn forwards_when_local_shard_is_full() {
        let shard_bits = 1; // S = 2 cells per shard
        let mut cluster = Cluster::new(2, shard_bits);
        // Peer 0 starts at last_used_local=1 (root), capacity 2 -> already full.
        let idx = cluster.next_free(0).unwrap();
        assert_eq!(cluster.owner(idx), 1);
    }

    #[test]
    fn exhausts_when_every_peer_is_full() {
        let shard_bits = 1;
        let mut cluster = Cluster::new(1, shard_bits);
        // capacity 2, peer 0 already at last_used_local=1 -> full immediately.
        assert!(matches!(cluster.next_free(0), Err(Error::AllocExhausted)));
    }

    #[test]
    fn allocated_indices_form_contiguous_prefix_per_shard() {
        let mut cluster = Cluster::new(2, trie_shard::MIN_SHARD_BITS);
        let a = cluster.next_free(0).unwrap();
        let b = cluster.next_free(0).unwrap();
        assert_eq!(b.get(), a.get() + 1);
    }

    #[test]
    fn read_write_round_trip_across_owner() {
        let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        cluster
            .write_edge(ROOT_CELL, Symbol::A, EdgeWord::make_leaf(0).unwrap())
            .unwrap();
        assert_eq!(
            cluster.read_cell(ROOT_CELL).unwrap().edge(Symbol::A).leaf_id(),
            Some(0)
        );
    }

    #[test]
    fn out_of_range_shard_returns_rpc_mismatch() {
        let cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        let bogus = GlobalIndex::from_parts(5, 0, trie_shard::MIN_SHARD_BITS);
        assert!(matches!(
            cluster.read_cell(bogus),
            Err(Error::RpcMismatch { peer: 5, .. })
        ));
    }

    #[test]
    fn rpcs_against_an_exited_peer_fail() {
        let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
        cluster.broadcast_exit();
        assert!(cluster.has_exited(0));
        assert!(matches!(
            cluster.read_cell(ROOT_CELL),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            cluster.write_edge(ROOT_CELL, Symbol::A, EdgeWord::make_leaf(0).unwrap()),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            cluster.next_free(0),
            Err(Error::InvariantViolation(_))
        ));
    }
}
