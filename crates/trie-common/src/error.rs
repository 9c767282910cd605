/// Error kinds shared across the construction and overlap pipelines. All
/// variants are fatal: the detecting peer broadcasts `EXIT` to its replica
/// group, closes its files, and the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reads of differing lengths")]
    InputMalformed,
    #[error("io error during {operation}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("trie cannot grow further in any shard")]
    AllocExhausted,
    #[error("cluster of {peers} peers is too small for one full replica of {required} peers")]
    Oversubscribed { peers: usize, required: usize },
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
    #[error("shard index {index} out of range for peer {peer}")]
    RpcMismatch { peer: usize, index: u64 },
}

impl Error {
    pub fn io(operation: &'static str, source: std::io::Error) -> Error {
        Error::Io { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
