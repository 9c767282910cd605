//! Input file parsing. Out of scope per the design (a trivial four-line-per-
//! record textual format), kept minimal and not treated as a core component.

use std::io::{BufRead, BufReader, Read as _};

use trie_common::{Error, Result, MAX_READ_LEN};

/// One parsed read: its sequence bytes and the byte offset of its record's
/// header line in the original input file.
pub struct Read {
    pub sequence: Vec<u8>,
    pub file_offset: u64,
}

pub struct ReadStream {
    reads: std::vec::IntoIter<Read>,
}

impl ReadStream {
    /// Parses `path` as four-lines-per-record text (header, sequence,
    /// `+`-prefixed separator, quality). Fails with `InputMalformed` if any
    /// two sequences differ in length.
    pub fn open(path: &std::path::Path) -> Result<ReadStream> {
        let file = std::fs::File::open(path).map_err(|e| Error::io("open input", e))?;
        let mut reader = BufReader::new(file);

        let mut reads = Vec::new();
        let mut expected_len: Option<usize> = None;
        let mut offset: u64 = 0;

        loop {
            let mut header = String::new();
            let header_offset = offset;
            let header_len = reader
                .read_line(&mut header)
                .map_err(|e| Error::io("read header line", e))?;
            if header_len == 0 {
                break; // clean EOF between records
            }
            offset += header_len as u64;

            let mut sequence = String::new();
            offset += reader
                .read_line(&mut sequence)
                .map_err(|e| Error::io("read sequence line", e))? as u64;
            let mut sep = String::new();
            offset += reader
                .read_line(&mut sep)
                .map_err(|e| Error::io("read separator line", e))? as u64;
            let mut quality = String::new();
            offset += reader
                .read_line(&mut quality)
                .map_err(|e| Error::io("read quality line", e))? as u64;

            if !sep.trim_start().starts_with('+') || quality.is_empty() {
                return Err(Error::InputMalformed);
            }

            let sequence = sequence.trim_end().as_bytes().to_vec();
            match expected_len {
                None => expected_len = Some(sequence.len()),
                Some(len) if len != sequence.len() => return Err(Error::InputMalformed),
                Some(_) => {}
            }
            if sequence.len() > MAX_READ_LEN {
                return Err(Error::InputMalformed);
            }

            reads.push(Read {
                sequence,
                file_offset: header_offset,
            });
        }

        // Confirm the reader reached true EOF rather than stopping mid-record.
        let mut probe = [0u8; 1];
        if reader.read(&mut probe).map_err(|e| Error::io("probe eof", e))? != 0 {
            return Err(Error::InputMalformed);
        }

        Ok(ReadStream {
            reads: reads.into_iter(),
        })
    }
}

impl Iterator for ReadStream {
    type Item = Read;

    fn next(&mut self) -> Option<Read> {
        self.reads.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fastq(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        f
    }

    #[test]
    fn parses_uniform_length_records() {
        let f = write_fastq(&[
            "@r1", "AAAA", "+", "!!!!", "@r2", "AAAC", "+", "!!!!", "@r3", "AAAG", "+", "!!!!",
        ]);
        let reads: Vec<_> = ReadStream::open(f.path()).unwrap().collect();
        assert_eq!(reads.len(), 3);
        assert_eq!(reads[0].sequence, b"AAAA");
        assert_eq!(reads[1].sequence, b"AAAC");
    }

    #[test]
    fn rejects_mixed_lengths() {
        let f = write_fastq(&["@r1", "A".repeat(36).as_str(), "+", "!", "@r2", "A".repeat(37).as_str(), "+", "!"]);
        assert!(matches!(
            ReadStream::open(f.path()),
            Err(Error::InputMalformed)
        ));
    }
}
