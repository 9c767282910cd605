//! Duplicates log: records `(existing_id, new_id)` whenever the insert
//! engine detects a read already present in the trie. Not an error — logged
//! and ingestion continues. I/O failure on this file is fatal.

use std::io::Write;

use trie_common::{Error, ReadId, Result};

pub struct DuplicatesLog {
    writer: std::io::BufWriter<std::fs::File>,
}

impl DuplicatesLog {
    pub fn create(path: &std::path::Path) -> Result<DuplicatesLog> {
        let file = std::fs::File::create(path).map_err(|e| Error::io("create dups log", e))?;
        Ok(DuplicatesLog {
            writer: std::io::BufWriter::new(file),
        })
    }

    pub fn record(&mut self, existing_id: ReadId, new_id: ReadId) -> Result<()> {
        writeln!(self.writer, "{existing_id}:0 {new_id}")
            .map_err(|e| Error::io("write dups log", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::io("flush dups log", e))
    }
}
