//! Replica Grouping & Work Partition (component H): partitions peers into
//! contiguous groups (one full trie replica per group) and assigns disjoint
//! input subsets to groups.

use trie_common::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Group driver: streams the sorted-unique reads and issues probes.
    Driver,
    /// Passive RPC server over its slice of the group's trie replica.
    Server,
}

#[derive(Debug, Clone, Copy)]
pub struct Partition {
    /// `G`: peers per replica group.
    pub group_size: usize,
    /// `R`: number of complete replica groups.
    pub replicas: usize,
}

impl Partition {
    /// `G = ceil(total_cells / shard_capacity)`, `R = floor(n_peers / G)`.
    /// Refuses to start when `n_peers < G`.
    pub fn compute(n_peers: usize, shard_capacity: u64, total_cells: u64) -> Result<Partition> {
        let group_size = total_cells.div_ceil(shard_capacity).max(1) as usize;
        if n_peers < group_size {
            return Err(Error::Oversubscribed {
                peers: n_peers,
                required: group_size,
            });
        }
        let replicas = n_peers / group_size;
        Ok(Partition {
            group_size,
            replicas,
        })
    }

    /// `None` for peers beyond `R*G` — released as idle surplus.
    pub fn group_of(&self, peer: usize) -> Option<usize> {
        if peer >= self.replicas * self.group_size {
            None
        } else {
            Some(peer / self.group_size)
        }
    }

    pub fn role_of(&self, peer: usize) -> Option<Role> {
        self.group_of(peer).map(|g| {
            if peer - g * self.group_size == 0 {
                Role::Driver
            } else {
                Role::Server
            }
        })
    }

    /// Sequential positions (in the sorted-unique-reads stream) assigned to
    /// group `g`: `position mod R == g`.
    pub fn positions_for_group(&self, group: usize, total_reads: usize) -> Vec<usize> {
        (0..total_reads)
            .filter(|pos| pos % self.replicas == group)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peer_is_one_replica() {
        let p = Partition::compute(1, 1 << 16, 1000).unwrap();
        assert_eq!(p.group_size, 1);
        assert_eq!(p.replicas, 1);
        assert_eq!(p.role_of(0), Some(Role::Driver));
    }

    #[test]
    fn two_groups_split_work_in_half() {
        // total_cells chosen so G=2, and n_peers=2G=4 -> R=2.
        let shard_capacity = 1 << 16;
        let total_cells = shard_capacity + 1; // forces G=2
        let p = Partition::compute(4, shard_capacity, total_cells).unwrap();
        assert_eq!(p.group_size, 2);
        assert_eq!(p.replicas, 2);
        let a = p.positions_for_group(0, 10);
        let b = p.positions_for_group(1, 10);
        assert_eq!(a, vec![0, 2, 4, 6, 8]);
        assert_eq!(b, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn refuses_when_cluster_smaller_than_one_replica() {
        let shard_capacity = 1 << 16;
        let total_cells = shard_capacity * 3;
        assert!(matches!(
            Partition::compute(2, shard_capacity, total_cells),
            Err(Error::Oversubscribed { .. })
        ));
    }

    #[test]
    fn surplus_peers_beyond_full_replicas_are_idle() {
        let p = Partition::compute(5, 1 << 16, (1 << 16) + 1).unwrap(); // G=2, R=2, surplus=1
        assert_eq!(p.group_of(4), None);
    }
}
