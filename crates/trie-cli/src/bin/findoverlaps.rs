//! Overlap phase driver: loads a persisted trie image, partitions peers
//! into replica groups, and probes every unique read's suffixes against
//! the trie, writing one overlap-record file per group.

use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use trie_cli_common::LogArgs;
use trie_common::{Error, ReadId};
use trie_overlap::{OverlapConfig, OverlapFormat, OverlapLocator, OverlapWriter, Partition};
use trie_transport::Cluster;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Anchors,
    Afg,
}

impl From<FormatArg> for OverlapFormat {
    fn from(f: FormatArg) -> OverlapFormat {
        match f {
            FormatArg::Anchors => OverlapFormat::Anchors,
            FormatArg::Afg => OverlapFormat::Afg,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(about = "Probes a trie-of-reads for suffix/prefix overlaps between reads")]
struct Args {
    /// Base input path; the trie image is read from `<input>-edges` and
    /// the unique-read stream from `<input>-sorted`.
    input: PathBuf,

    /// Per-shard cell-count exponent k, matching the value used by maketrie.
    /// Clamped to `trie_shard::MIN_SHARD_BITS` if set lower.
    #[arg(long = "shard-bits", default_value_t = trie_shard::DEFAULT_SHARD_BITS)]
    shard_bits: u32,

    /// Total peers available across all replica groups. Defaults to
    /// exactly the peers needed for one replica.
    #[arg(long)]
    peers: Option<usize>,

    #[arg(long = "output-format", value_enum, default_value_t = FormatArg::Anchors)]
    output_format: FormatArg,

    /// Minimum overlap length. Defaults to 14 in `afg` mode, 1 otherwise.
    #[arg(long = "min-overlap")]
    min_overlap: Option<usize>,

    /// Maximum overlap records emitted per anchor. Defaults to 8 in `afg`
    /// mode, unbounded otherwise.
    #[arg(long = "max-overlaps")]
    max_overlaps: Option<usize>,

    #[command(flatten)]
    logging: LogArgs,
}

fn main() {
    let args = Args::parse();
    trie_cli_common::init_logging(&args.logging);
    tracing::debug!(?args.input, args.shard_bits, ?args.output_format, "starting overlap phase");

    if let Err((operation, err)) = run(&args) {
        tracing::error!(peer = 0, operation, error = %err, "overlap phase failed");
        std::process::exit(1);
    }
}

type Step<T> = std::result::Result<T, (&'static str, Error)>;

fn run(args: &Args) -> Step<()> {
    let shard_bits = args.shard_bits.max(trie_shard::MIN_SHARD_BITS);
    let edges_path = suffixed(&args.input, "-edges");
    let sorted_path = suffixed(&args.input, "-sorted");

    let edges_bytes = std::fs::read(&edges_path)
        .map_err(|e| ("read edges file", Error::io("read edges file", e)))?;
    let (shard_slices, total_cells) = split_shards(&edges_bytes, shard_bits);
    let shard_capacity = 1u64 << shard_bits;
    let group_size = shard_slices.len();

    let n_peers = args.peers.unwrap_or(group_size);
    let partition = Partition::compute(n_peers, shard_capacity, total_cells)
        .map_err(|e| ("partition replica groups", e))?;

    let format: OverlapFormat = args.output_format.into();
    let mut config = OverlapConfig::default_for(format);
    if let Some(min_overlap) = args.min_overlap {
        config.min_overlap = min_overlap;
    }
    if let Some(max_overlaps) = args.max_overlaps {
        config.max_overlaps = max_overlaps;
    }

    let reads = read_sorted_file(&sorted_path)?;

    for group in 0..partition.replicas {
        let mut cluster = Cluster::from_shard_bytes(shard_bits, shard_slices.clone());
        let out_path = output_path(&args.input, group, format);
        let file = std::fs::File::create(&out_path)
            .map_err(|e| ("create overlap output file", Error::io("create overlap output file", e)))?;
        let mut writer = OverlapWriter::new(BufWriter::new(file));

        for pos in partition.positions_for_group(group, reads.len()) {
            let (sequence, read_id) = &reads[pos];
            let records = OverlapLocator::probe_read(&cluster, *read_id, sequence, &config)
                .map_err(|e| ("probe read for overlaps", e))?;
            for record in &records {
                writer.write(record).map_err(|e| ("write overlap output file", e))?;
            }
        }
        writer.flush().map_err(|e| ("flush overlap output file", e))?;
        cluster.broadcast_exit();
    }

    tracing::info!(group_size, replicas = partition.replicas, reads = reads.len(), "overlap phase complete");
    Ok(())
}

fn output_path(input: &Path, group: usize, format: OverlapFormat) -> PathBuf {
    let mut s = input.as_os_str().to_owned();
    match format {
        OverlapFormat::Anchors => s.push(format!("-{group}.ovl")),
        OverlapFormat::Afg => s.push(format!("-ovl-{group}.afg")),
    }
    PathBuf::from(s)
}

fn suffixed(input: &Path, suffix: &str) -> PathBuf {
    let mut s = input.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Splits a concatenated `-edges` image into per-shard byte slices. Every
/// shard below the last one actually touched is full (`shard_capacity`
/// cells); forward-only allocation guarantees a shard is never revisited
/// once the next one starts filling.
fn split_shards(bytes: &[u8], shard_bits: u32) -> (Vec<&[u8]>, u64) {
    const CELL_BYTES: usize = 40;
    let shard_capacity = 1u64 << shard_bits;
    let total_cells = (bytes.len() / CELL_BYTES) as u64;
    let group_size = total_cells.div_ceil(shard_capacity).max(1) as usize;

    let mut slices = Vec::with_capacity(group_size);
    let mut offset = 0usize;
    for i in 0..group_size {
        let cells_in_shard = if i + 1 < group_size {
            shard_capacity
        } else {
            total_cells - shard_capacity * (group_size as u64 - 1)
        };
        let len = cells_in_shard as usize * CELL_BYTES;
        slices.push(&bytes[offset..offset + len]);
        offset += len;
    }
    (slices, total_cells)
}

fn read_sorted_file(path: &Path) -> Step<Vec<(Vec<u8>, ReadId)>> {
    let mut text = String::new();
    std::fs::File::open(path)
        .map_err(|e| ("open sorted-unique-reads file", Error::io("open sorted-unique-reads file", e)))?
        .read_to_string(&mut text)
        .map_err(|e| ("read sorted-unique-reads file", Error::io("read sorted-unique-reads file", e)))?;

    let mut reads = Vec::new();
    for line in text.lines() {
        let (sequence, id) = line
            .rsplit_once(' ')
            .ok_or(("parse sorted-unique-reads file", Error::InputMalformed))?;
        let id: ReadId = id
            .trim()
            .parse()
            .map_err(|_| ("parse sorted-unique-reads file", Error::InputMalformed))?;
        reads.push((sequence.trim_end().as_bytes().to_vec(), id));
    }
    Ok(reads)
}
