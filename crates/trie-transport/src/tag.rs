/// Closed set of RPC message tags. Each tag names an opcode; the
/// accompanying scalar/data frames are carried by the call site rather than
/// this enum, so a tag plus its frames form one logical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Byte-buffer frame, used when forwarding a trie image.
    RawMem,
    /// Terminates a peer's receiver loop.
    Exit,
    /// Construction: insert a read's tail starting at a migrated anchor.
    AddRead,
    /// Construction: ask a peer for its next free cell.
    GetNextFree,
    /// Construction: forward a sorted-unique-read line to the top-shard peer.
    OutputRead,
    /// Construction: continue an in-order trie walk on another peer's shard.
    WalkTrie,
    /// Construction: continue a trie image dump on another peer's shard.
    DumpTrie,
    /// Overlap phase: continue a suffix descent on another peer's shard.
    Locate,
    /// Overlap phase: continue subtree enumeration on another peer's shard.
    Print,
    /// Diagnostic: read a single cell from another peer's shard.
    ReadCell,
    /// Diagnostic: write a single edge on another peer's shard.
    WriteCell,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::RawMem => "RAW_MEM",
            Tag::Exit => "EXIT",
            Tag::AddRead => "ADD_READ",
            Tag::GetNextFree => "GET_NEXT_FREE",
            Tag::OutputRead => "OUTPUT_READ",
            Tag::WalkTrie => "WALK_TRIE",
            Tag::DumpTrie => "DUMP_TRIE",
            Tag::Locate => "LOCATE",
            Tag::Print => "PRINT",
            Tag::ReadCell => "READ_CELL",
            Tag::WriteCell => "WRITE_CELL",
        }
    }
}
