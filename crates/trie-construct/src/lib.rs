pub mod dups;
pub mod emit;
pub mod insert;
pub mod reads;

pub use dups::DuplicatesLog;
pub use emit::{IndexWriter, SortedEmitter, TrieSerializer};
pub use insert::{InsertEngine, InsertOutcome};
pub use reads::{Read, ReadStream};
