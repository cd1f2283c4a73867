//! Cross-reference section accounting shared by the table and stream
//! flavors of the writer.

use std::collections::BTreeMap;

/// One cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XRefEntry {
    /// A free slot: the number of the next free object and the generation
    /// a reused slot would get.
    Free { next_free: u32, generation: u16 },
    /// A live object at a byte offset from the start of the file.
    InUse { offset: u64, generation: u16 },
}

/// Collects entries for one cross-reference section and renders them as
/// either a classic table or the packed rows of a cross-reference stream.
///
/// Entries are keyed by object number; contiguous runs become subsections.
#[derive(Debug, Default)]
pub(crate) struct XRefBuilder {
    entries: BTreeMap<u32, XRefEntry>,
}

impl XRefBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_in_use(&mut self, number: u32, generation: u16, offset: u64) {
        self.entries
            .insert(number, XRefEntry::InUse { offset, generation });
    }

    pub fn add_free(&mut self, number: u32, next_free: u32, generation: u16) {
        self.entries.insert(
            number,
            XRefEntry::Free {
                next_free,
                generation,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn max_number(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Contiguous runs of object numbers, each with its starting number.
    fn subsections(&self) -> Vec<(u32, Vec<XRefEntry>)> {
        let mut result: Vec<(u32, Vec<XRefEntry>)> = Vec::new();
        for (&number, &entry) in &self.entries {
            match result.last_mut() {
                Some((start, run)) if *start + run.len() as u32 == number => run.push(entry),
                _ => result.push((number, vec![entry])),
            }
        }
        result
    }

    /// Render as a classic `xref` table. Every entry is exactly twenty
    /// bytes: ten-digit offset, space, five-digit generation, space, `n`
    /// or `f`, space, line feed.
    pub fn write_table(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"xref\n");
        for (start, run) in self.subsections() {
            out.extend_from_slice(format!("{} {}\n", start, run.len()).as_bytes());
            for entry in run {
                let line = match entry {
                    XRefEntry::Free {
                        next_free,
                        generation,
                    } => format!("{next_free:010} {generation:05} f \n"),
                    XRefEntry::InUse { offset, generation } => {
                        format!("{offset:010} {generation:05} n \n")
                    }
                };
                debug_assert_eq!(line.len(), 20);
                out.extend_from_slice(line.as_bytes());
            }
        }
    }

    /// Pack the entries into cross-reference stream rows.
    ///
    /// Returns the row bytes, the three `/W` field widths and the `/Index`
    /// pairs. Field one is the entry type, field two the offset or next
    /// free number, field three the generation.
    pub fn encode_stream_rows(&self) -> (Vec<u8>, [usize; 3], Vec<i64>) {
        let mut max_second = 0u64;
        let mut max_third = 0u64;
        for entry in self.entries.values() {
            match *entry {
                XRefEntry::Free {
                    next_free,
                    generation,
                } => {
                    max_second = max_second.max(next_free as u64);
                    max_third = max_third.max(generation as u64);
                }
                XRefEntry::InUse { offset, generation } => {
                    max_second = max_second.max(offset);
                    max_third = max_third.max(generation as u64);
                }
            }
        }
        let widths = [1, bytes_needed(max_second), bytes_needed(max_third)];

        let mut rows = Vec::with_capacity(self.len() * (widths[0] + widths[1] + widths[2]));
        let mut index = Vec::new();
        for (start, run) in self.subsections() {
            index.push(start as i64);
            index.push(run.len() as i64);
            for entry in run {
                let (kind, second, third) = match entry {
                    XRefEntry::Free {
                        next_free,
                        generation,
                    } => (0u64, next_free as u64, generation as u64),
                    XRefEntry::InUse { offset, generation } => (1, offset, generation as u64),
                };
                push_field(&mut rows, kind, widths[0]);
                push_field(&mut rows, second, widths[1]);
                push_field(&mut rows, third, widths[2]);
            }
        }
        (rows, widths, index)
    }
}

/// Big-endian encoding of `value` in exactly `width` bytes.
fn push_field(out: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

/// The minimum number of bytes that can hold `value`, never zero.
fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}
