//! Per-peer half of the distributed allocator (component D): tracks
//! `last_used_local` and answers whether this peer's own shard still has
//! room. The cross-peer forwarding protocol (the `next_guy` shortcut and
//! `GET_NEXT_FREE` forwarding) lives in `trie-transport`, since it requires
//! knowledge of peer topology.

/// Local bookkeeping for one peer's shard allocation. `last_used_local`
/// starts at `-1` on every peer except peer 0, which starts at `1` (the
/// root cell occupies local offset 1 of shard 0).
pub struct LocalAllocator {
    last_used_local: i64,
    capacity: u64,
}

impl LocalAllocator {
    pub fn for_peer(peer_index: u64, capacity: u64) -> LocalAllocator {
        LocalAllocator {
            last_used_local: if peer_index == 0 { 1 } else { -1 },
            capacity,
        }
    }

    /// Rebuilds allocator state from a persisted `last_used_local`, e.g.
    /// when loading a shard image for the overlap phase.
    pub fn from_last_used(last_used_local: i64, capacity: u64) -> LocalAllocator {
        LocalAllocator {
            last_used_local,
            capacity,
        }
    }

    pub fn has_room(&self) -> bool {
        self.last_used_local + 1 < self.capacity as i64
    }

    /// Returns the next local offset and advances, or `None` if this shard
    /// is full.
    pub fn try_allocate(&mut self) -> Option<u64> {
        if !self.has_room() {
            return None;
        }
        self.last_used_local += 1;
        Some(self.last_used_local as u64)
    }

    pub fn last_used_local(&self) -> i64 {
        self.last_used_local
    }

    /// Number of cells actually in use, i.e. `last_used_local + 1`, or `0`
    /// if nothing has been allocated yet (peers other than 0 start at -1).
    pub fn used_len(&self) -> u64 {
        (self.last_used_local + 1).max(0) as u64
    }
}
