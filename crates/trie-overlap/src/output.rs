//! Record formatting for the two overlap output file conventions.

use std::io::Write;

use trie_common::{Error, Result};

use crate::locate::OverlapRecord;

pub struct OverlapWriter<W> {
    out: W,
}

impl<W: Write> OverlapWriter<W> {
    pub fn new(out: W) -> OverlapWriter<W> {
        OverlapWriter { out }
    }

    pub fn write(&mut self, record: &OverlapRecord) -> Result<()> {
        match *record {
            OverlapRecord::Anchor {
                source_read_id,
                offset,
                cell_index,
            } => writeln!(
                self.out,
                "{}:{} @{}",
                source_read_id,
                offset,
                cell_index.get()
            ),
            OverlapRecord::Pair {
                source_read_id,
                other_read_id,
                offset,
            } => writeln!(
                self.out,
                "{{OVL\nadj:N\nrds:{},{}\nscr:0\nahg:{}\nbhg:{}\n}}",
                source_read_id + 1,
                other_read_id + 1,
                offset,
                offset
            ),
        }
        .map_err(|e| Error::io("write overlap output file", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| Error::io("flush overlap output file", e))
    }
}
