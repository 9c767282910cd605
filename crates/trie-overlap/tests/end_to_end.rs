//! Construction-then-overlap scenarios exercised against the public API of
//! `trie-construct` and `trie-overlap` together, without going through the
//! CLI binaries.

use trie_construct::{DuplicatesLog, InsertEngine};
use trie_overlap::{OverlapConfig, OverlapFormat, OverlapLocator, OverlapRecord};
use trie_transport::Cluster;

fn build(reads: &[(u64, &str)]) -> Cluster {
    let mut cluster = Cluster::new(1, trie_shard::MIN_SHARD_BITS);
    let dir = tempfile::tempdir().unwrap();
    let mut dups = DuplicatesLog::create(&dir.path().join("dups")).unwrap();
    for &(id, seq) in reads {
        InsertEngine::insert_read(&mut cluster, &mut dups, id, seq.as_bytes()).unwrap();
    }
    cluster
}

#[test]
fn scenario_one_three_reads_sharing_a_prefix() {
    let cluster = build(&[(0, "AAAA"), (1, "AAAC"), (2, "AAAG")]);

    let config = OverlapConfig {
        format: OverlapFormat::Anchors,
        min_overlap: 1,
        max_overlaps: usize::MAX,
        self_overlaps: true,
    };
    let records = OverlapLocator::probe_read(&cluster, 0, b"AAAA", &config).unwrap();

    // offset 1 probes the 3-letter suffix "AAA", a shared prefix of all
    // three reads (including the source read itself).
    let at_offset_1 = records
        .iter()
        .find(|r| matches!(r, OverlapRecord::Anchor { offset: 1, .. }));
    assert!(at_offset_1.is_some());
}

#[test]
fn scenario_six_overlap_expansion_caps_at_max_overlaps() {
    let alphabet = [b'A', b'C', b'G', b'T', b'N'];
    let reads: Vec<(u64, String)> = (0..20)
        .map(|i| {
            let a = alphabet[i / 5];
            let b = alphabet[i % 5];
            (i as u64, format!("AAAAAAAAAAAAAA{}{}", a as char, b as char))
        })
        .collect();
    let refs: Vec<(u64, &str)> = reads.iter().map(|(id, s)| (*id, s.as_str())).collect();
    let cluster = build(&refs);

    let config = OverlapConfig {
        format: OverlapFormat::Afg,
        min_overlap: 14,
        max_overlaps: 8,
        self_overlaps: true,
    };
    let records = OverlapLocator::probe_read(&cluster, 0, b"AAAAAAAAAAAAAAAA", &config).unwrap();
    let pairs_at_anchor = records
        .iter()
        .filter(|r| matches!(r, OverlapRecord::Pair { offset: 2, .. }))
        .count();
    assert_eq!(pairs_at_anchor, 8);
}
