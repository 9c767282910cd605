//! Construction phase driver: reads a FASTQ-like input file, inserts every
//! read into a distributed trie, and persists the `-edges`, `-sorted`, and
//! `-index` artifacts alongside a duplicates log.

use std::path::PathBuf;

use clap::Parser;
use trie_cli_common::LogArgs;
use trie_construct::{DuplicatesLog, IndexWriter, InsertEngine, InsertOutcome, ReadStream, SortedEmitter, TrieSerializer};
use trie_transport::Cluster;

#[derive(Debug, clap::Parser)]
#[command(about = "Builds a trie-of-reads from a FASTQ-like input file")]
struct Args {
    /// Path to the four-line-per-record input file.
    input: PathBuf,

    /// Per-shard cell-count exponent k (shard capacity is 2^k cells).
    /// Clamped to `trie_shard::MIN_SHARD_BITS` if set lower.
    #[arg(long = "shard-bits", default_value_t = trie_shard::DEFAULT_SHARD_BITS)]
    shard_bits: u32,

    /// Number of peers available to hold shards. Construction forwards
    /// allocation to later peers once an earlier one fills up.
    #[arg(long, default_value_t = 1)]
    peers: usize,

    #[command(flatten)]
    logging: LogArgs,
}

fn main() {
    let args = Args::parse();
    trie_cli_common::init_logging(&args.logging);
    tracing::debug!(?args.input, args.shard_bits, args.peers, "starting construction");

    if let Err((operation, err)) = run(&args) {
        tracing::error!(peer = 0, operation, error = %err, "construction failed");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> std::result::Result<(), (&'static str, trie_common::Error)> {
    let shard_bits = args.shard_bits.max(trie_shard::MIN_SHARD_BITS);
    let mut cluster = Cluster::new(args.peers, shard_bits);

    let result = construct(&mut cluster, args);
    if result.is_err() {
        cluster.broadcast_exit();
    }
    result
}

fn construct(
    cluster: &mut Cluster,
    args: &Args,
) -> std::result::Result<(), (&'static str, trie_common::Error)> {
    let edges_path = suffixed(&args.input, "-edges");
    let sorted_path = suffixed(&args.input, "-sorted");
    let index_path = suffixed(&args.input, "-index");
    let dups_path = suffixed(&args.input, "-dups");

    let reads = ReadStream::open(&args.input).map_err(|e| ("open input", e))?;

    let mut dups = DuplicatesLog::create(&dups_path).map_err(|e| ("create duplicates log", e))?;
    let mut index = IndexWriter::create(&index_path).map_err(|e| ("create index file", e))?;

    let mut inserted = 0usize;
    let mut duplicates = 0usize;
    for (read_id, read) in reads.enumerate() {
        let read_id = read_id as u64;
        index
            .append(read.file_offset)
            .map_err(|e| ("write index file", e))?;

        let outcome = InsertEngine::insert_read(cluster, &mut dups, read_id, &read.sequence)
            .map_err(|e| ("insert read", e))?;
        match outcome {
            InsertOutcome::Inserted => inserted += 1,
            InsertOutcome::Duplicate { .. } => duplicates += 1,
        }
    }

    dups.flush().map_err(|e| ("flush duplicates log", e))?;
    index.flush().map_err(|e| ("flush index file", e))?;

    let mut edges_file =
        std::fs::File::create(&edges_path).map_err(|e| ("create edges file", trie_common::Error::io("create edges file", e)))?;
    TrieSerializer::write_edges_file(cluster, &mut edges_file).map_err(|e| ("write edges file", e))?;

    let mut sorted_file =
        std::fs::File::create(&sorted_path).map_err(|e| ("create sorted file", trie_common::Error::io("create sorted file", e)))?;
    let unique = SortedEmitter::emit_sorted(cluster, &mut sorted_file).map_err(|e| ("write sorted file", e))?;

    tracing::info!(inserted, duplicates, unique, "construction complete");
    Ok(())
}

fn suffixed(input: &std::path::Path, suffix: &str) -> PathBuf {
    let mut s = input.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
