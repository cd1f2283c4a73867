//! Whole-file loading: header, cross-reference chain and trailer.
//!
//! Loading reads only the cross-reference sections and the trailer; every
//! object stays on disk until the store is asked for it. Update chains are
//! walked newest to oldest, and the first entry seen for an object number
//! wins, so the latest revision of each object shadows the older ones.

use super::lexer::{Lexer, Token};
use super::object_parser::parse_value_from_token;
use super::parser_object::{load_header, ParseSource};
use crate::encryption::Encryptor;
use crate::error::{PdfError, Result};
use crate::object::{Dictionary, Object, ObjectRef, Value};
use crate::store::ObjectStore;
use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use tracing::warn;

/// A parsed document: the object store plus the file-level pieces an
/// incremental update needs to chain onto.
pub struct Document<R> {
    store: ObjectStore<R>,
    trailer: Dictionary,
    version: String,
    startxref: u64,
    length: u64,
}

impl<R: Read + Seek> Document<R> {
    /// Load a document, trying the empty user password if it turns out to
    /// be encrypted.
    pub fn load(reader: R) -> Result<Self> {
        Self::load_with_password(reader, "")
    }

    /// Load a document, authenticating with `password` if an encryption
    /// dictionary is present.
    pub fn load_with_password(mut reader: R, password: &str) -> Result<Self> {
        let length = reader.seek(SeekFrom::End(0))?;
        let version = read_version(&mut reader)?;
        let startxref = find_startxref(&mut reader, length)?;

        let mut seen: HashSet<u32> = HashSet::new();
        let mut registrations: Vec<(ObjectRef, u64)> = Vec::new();
        let mut trailer: Option<Dictionary> = None;
        let mut visited: HashSet<u64> = HashSet::new();
        let mut next = Some(startxref);

        while let Some(offset) = next {
            if !visited.insert(offset) {
                warn!(offset, "cross-reference chain loops; stopping");
                break;
            }
            let section = read_section(&mut reader, offset)?;
            if trailer.is_none() {
                trailer = Some(section.dict.clone());
            }
            // Hybrid files carry a stream section whose entries take
            // precedence over the table they accompany
            if let Some(stream_offset) = section.dict.get_integer("XRefStm") {
                if stream_offset >= 0 && visited.insert(stream_offset as u64) {
                    let sub = read_section(&mut reader, stream_offset as u64)?;
                    apply_entries(&mut seen, &mut registrations, sub.entries);
                }
            }
            apply_entries(&mut seen, &mut registrations, section.entries);

            next = match section.dict.get_integer("Prev") {
                None => None,
                Some(prev) if prev >= 0 => Some(prev as u64),
                Some(prev) => {
                    return Err(PdfError::InvalidXref(format!(
                        "negative /Prev offset {prev}"
                    )))
                }
            };
        }

        let mut store = ObjectStore::with_reader(reader);
        for (reference, offset) in registrations {
            store.register_parsed(reference, offset);
        }
        let trailer = trailer.unwrap_or_default();

        if let Some(encrypt) = trailer.get("Encrypt") {
            let file_id = trailer
                .get("ID")
                .and_then(|o| o.value().as_array())
                .and_then(|items| items.first())
                .and_then(|o| o.try_get_string())
                .map(|s| s.as_bytes().to_vec())
                .unwrap_or_default();
            let (dict, encrypt_ref) = match encrypt.value() {
                Value::Reference(r) => {
                    let object = store.resolve(*r)?.ok_or_else(|| {
                        PdfError::Encryption("encryption dictionary not in file".to_string())
                    })?;
                    (object.get_dictionary()?.clone(), Some(*r))
                }
                Value::Dictionary(d) => (d.clone(), None),
                other => {
                    return Err(PdfError::Encryption(format!(
                        "/Encrypt is a {}",
                        other.type_name()
                    )))
                }
            };
            let encryptor = Encryptor::from_existing(&dict, &file_id, password)?;
            store.set_encryptor(encryptor, encrypt_ref);
        }

        Ok(Self {
            store,
            trailer,
            version,
            startxref,
            length,
        })
    }

    pub fn store(&self) -> &ObjectStore<R> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore<R> {
        &mut self.store
    }

    /// The newest trailer dictionary of the update chain.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Version string from the `%PDF-` header line.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Offset of the newest cross-reference section, the `/Prev` target
    /// for the next incremental update.
    pub fn startxref(&self) -> u64 {
        self.startxref
    }

    /// Length of the file in bytes, where appended update bytes begin.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_encrypted(&self) -> bool {
        self.trailer.contains_key("Encrypt")
    }

    /// The document catalog reference from `/Root`.
    pub fn root(&self) -> Option<ObjectRef> {
        self.trailer.get("Root").and_then(|o| o.try_get_reference())
    }
}

impl<R> fmt::Debug for Document<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version)
            .field("startxref", &self.startxref)
            .field("length", &self.length)
            .field("objects", &self.store.len())
            .finish()
    }
}

enum SectionEntry {
    InUse { reference: ObjectRef, offset: u64 },
    /// Free slot or an entry kind the loader cannot resolve; either way
    /// the number is spoken for and older sections must not supply it.
    Absent { number: u32 },
}

struct Section {
    entries: Vec<SectionEntry>,
    dict: Dictionary,
}

fn apply_entries(
    seen: &mut HashSet<u32>,
    registrations: &mut Vec<(ObjectRef, u64)>,
    entries: Vec<SectionEntry>,
) {
    for entry in entries {
        match entry {
            SectionEntry::InUse { reference, offset } => {
                if seen.insert(reference.number()) {
                    registrations.push((reference, offset));
                }
            }
            SectionEntry::Absent { number } => {
                seen.insert(number);
            }
        }
    }
}

/// Parse one cross-reference section, table or stream.
fn read_section<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Section> {
    let mut lexer = Lexer::new(&mut *reader)?;
    lexer.seek(offset)?;
    let (token, position) = lexer.next_token_at()?;
    match token {
        Token::Xref => read_table_section(lexer),
        Token::Integer(number) => read_stream_section(lexer, number),
        other => Err(PdfError::InvalidXref(format!(
            "expected a cross-reference section at offset {position}, found {}",
            other.describe()
        ))),
    }
}

fn read_table_section<R: Read + Seek>(mut lexer: Lexer<R>) -> Result<Section> {
    let mut entries = Vec::new();
    loop {
        let (token, position) = lexer.next_token_at()?;
        match token {
            Token::Integer(start) => {
                let start = non_negative(start, "subsection start", position)?;
                let (count_token, count_pos) = lexer.next_token_at()?;
                let count = match count_token {
                    Token::Integer(count) => non_negative(count, "subsection count", count_pos)?,
                    other => {
                        return Err(PdfError::InvalidXref(format!(
                            "expected entry count, found {}",
                            other.describe()
                        )))
                    }
                };
                for i in 0..count {
                    entries.push(read_table_entry(&mut lexer, (start + i) as u32)?);
                }
            }
            Token::Trailer => {
                // The trailer dictionary is a headerless parser object
                let mut holder = Object::from_parse_source(ParseSource::trailer(lexer.position()));
                load_header(lexer.into_inner(), &mut holder)?;
                let dict = match holder.value() {
                    Value::Dictionary(dict) => dict.clone(),
                    other => {
                        return Err(PdfError::InvalidXref(format!(
                            "trailer is a {}",
                            other.type_name()
                        )))
                    }
                };
                return Ok(Section { entries, dict });
            }
            other => {
                return Err(PdfError::InvalidXref(format!(
                    "unexpected {} in cross-reference table at offset {position}",
                    other.describe()
                )))
            }
        }
    }
}

fn non_negative(value: i64, what: &str, position: u64) -> Result<i64> {
    if value < 0 {
        return Err(PdfError::InvalidXref(format!(
            "negative {what} {value} at offset {position}"
        )));
    }
    Ok(value)
}

fn read_table_entry<R: Read + Seek>(lexer: &mut Lexer<R>, number: u32) -> Result<SectionEntry> {
    let offset = match lexer.next_token_at()? {
        (Token::Integer(v), pos) => non_negative(v, "entry offset", pos)? as u64,
        (other, _) => {
            return Err(PdfError::InvalidXref(format!(
                "expected entry offset, found {}",
                other.describe()
            )))
        }
    };
    let generation = match lexer.next_token_at()? {
        (Token::Integer(v), pos) => u16::try_from(v).map_err(|_| {
            PdfError::InvalidXref(format!("generation {v} out of range at offset {pos}"))
        })?,
        (other, _) => {
            return Err(PdfError::InvalidXref(format!(
                "expected entry generation, found {}",
                other.describe()
            )))
        }
    };
    match lexer.next_token_at()? {
        (Token::Keyword(ref kind), _) if kind == "n" => Ok(SectionEntry::InUse {
            reference: ObjectRef::new(number, generation),
            offset,
        }),
        (Token::Keyword(ref kind), _) if kind == "f" => Ok(SectionEntry::Absent { number }),
        (other, pos) => Err(PdfError::InvalidXref(format!(
            "expected entry type at offset {pos}, found {}",
            other.describe()
        ))),
    }
}

/// A cross-reference stream: `N G obj` carrying packed binary rows.
fn read_stream_section<R: Read + Seek>(mut lexer: Lexer<R>, _number: i64) -> Result<Section> {
    // Generation and obj keyword of the header line
    for expected in ["generation", "'obj'"] {
        let (token, position) = lexer.next_token_at()?;
        let ok = matches!(
            (&token, expected),
            (Token::Integer(_), "generation") | (Token::Obj, "'obj'")
        );
        if !ok {
            return Err(PdfError::InvalidXref(format!(
                "expected {expected} at offset {position}, found {}",
                token.describe()
            )));
        }
    }

    let (token, position) = lexer.next_token_at()?;
    let dict = match parse_value_from_token(&mut lexer, token, position)? {
        Value::Dictionary(dict) => dict,
        other => {
            return Err(PdfError::InvalidXref(format!(
                "cross-reference stream value is a {}",
                other.type_name()
            )))
        }
    };

    let (token, position) = lexer.next_token_at()?;
    if token != Token::Stream {
        return Err(PdfError::InvalidXref(format!(
            "cross-reference object without stream at offset {position}"
        )));
    }
    lexer.read_stream_eol()?;

    let length = dict.get_integer("Length").ok_or_else(|| {
        PdfError::InvalidXref("cross-reference stream needs a direct /Length".to_string())
    })?;
    let length = usize::try_from(length)
        .map_err(|_| PdfError::InvalidXref(format!("bad stream length {length}")))?;
    let raw = lexer.read_bytes(length)?;
    let rows = decode_stream_payload(&dict, raw)?;

    let widths = read_widths(&dict)?;
    let row_len: usize = widths.iter().sum();
    if row_len == 0 || rows.len() % row_len != 0 {
        return Err(PdfError::InvalidXref(format!(
            "row size {row_len} does not divide {} payload bytes",
            rows.len()
        )));
    }

    let index = read_index(&dict)?;
    let mut entries = Vec::new();
    let mut chunks = rows.chunks(row_len);
    for (start, count) in index {
        for number in start..start + count {
            let Some(row) = chunks.next() else {
                return Err(PdfError::InvalidXref(
                    "cross-reference stream shorter than /Index".to_string(),
                ));
            };
            let mut fields = [1u64, 0, 0];
            let mut at = 0;
            for (field, &width) in fields.iter_mut().zip(&widths) {
                if width > 0 {
                    *field = be_field(&row[at..at + width]);
                    at += width;
                }
            }
            match fields[0] {
                0 => entries.push(SectionEntry::Absent { number }),
                1 => {
                    let generation = u16::try_from(fields[2]).map_err(|_| {
                        PdfError::InvalidXref(format!("generation {} out of range", fields[2]))
                    })?;
                    entries.push(SectionEntry::InUse {
                        reference: ObjectRef::new(number, generation),
                        offset: fields[1],
                    });
                }
                2 => {
                    warn!(number, "object {} lives in an object stream; skipping", number);
                    entries.push(SectionEntry::Absent { number });
                }
                other => {
                    return Err(PdfError::InvalidXref(format!(
                        "unknown entry type {other}"
                    )))
                }
            }
        }
    }
    Ok(Section { entries, dict })
}

fn read_widths(dict: &Dictionary) -> Result<Vec<usize>> {
    let widths = dict
        .get("W")
        .and_then(|o| o.value().as_array())
        .ok_or_else(|| PdfError::InvalidXref("missing /W array".to_string()))?;
    if widths.len() != 3 {
        return Err(PdfError::InvalidXref(format!(
            "/W has {} fields, expected 3",
            widths.len()
        )));
    }
    widths
        .iter()
        .map(|o| {
            o.try_get_integer()
                .and_then(|w| usize::try_from(w).ok())
                .filter(|&w| w <= 8)
                .ok_or_else(|| PdfError::InvalidXref("bad /W field width".to_string()))
        })
        .collect()
}

fn read_index(dict: &Dictionary) -> Result<Vec<(u32, u32)>> {
    match dict.get("Index").map(|o| o.value()) {
        None => {
            let size = dict.get_integer("Size").ok_or_else(|| {
                PdfError::InvalidXref("cross-reference stream without /Size".to_string())
            })?;
            let size = u32::try_from(size)
                .map_err(|_| PdfError::InvalidXref(format!("bad /Size {size}")))?;
            Ok(vec![(0, size)])
        }
        Some(Value::Array(items)) if items.len() % 2 == 0 => items
            .chunks(2)
            .map(|pair| {
                let start = pair[0].try_get_integer().and_then(|v| u32::try_from(v).ok());
                let count = pair[1].try_get_integer().and_then(|v| u32::try_from(v).ok());
                match (start, count) {
                    (Some(start), Some(count)) => Ok((start, count)),
                    _ => Err(PdfError::InvalidXref("bad /Index pair".to_string())),
                }
            })
            .collect(),
        Some(_) => Err(PdfError::InvalidXref("malformed /Index".to_string())),
    }
}

fn decode_stream_payload(dict: &Dictionary, raw: Vec<u8>) -> Result<Vec<u8>> {
    let filter = match dict.get("Filter").map(|o| o.value()) {
        None => None,
        Some(Value::Name(name)) => Some(name.as_str()),
        Some(Value::Array(items)) if items.len() == 1 => {
            Some(items[0].try_get_name().unwrap_or(""))
        }
        Some(_) => Some(""),
    };
    let data = match filter {
        None => raw,
        Some("FlateDecode") => inflate(&raw)?,
        Some(other) => {
            return Err(PdfError::InvalidXref(format!(
                "unsupported cross-reference stream filter '{other}'"
            )))
        }
    };
    match dict.get_dict("DecodeParms") {
        Some(parms) => {
            let predictor = parms.get_integer("Predictor").unwrap_or(1);
            if predictor <= 1 {
                return Ok(data);
            }
            let columns = parms
                .get_integer("Columns")
                .and_then(|c| usize::try_from(c).ok())
                .filter(|&c| c > 0)
                .ok_or_else(|| PdfError::InvalidXref("predictor without /Columns".to_string()))?;
            undo_png_predictor(&data, columns)
        }
        None => Ok(data),
    }
}

/// Reverse the PNG row predictor the common generators apply to
/// cross-reference streams. Fields are single-byte columns, so the pixel
/// width is one.
fn undo_png_predictor(data: &[u8], columns: usize) -> Result<Vec<u8>> {
    let row_len = columns + 1;
    if data.len() % row_len != 0 {
        return Err(PdfError::InvalidXref(format!(
            "predicted data length {} does not fit rows of {columns}",
            data.len()
        )));
    }
    let mut out = Vec::with_capacity(data.len() / row_len * columns);
    let mut prev = vec![0u8; columns];
    for row in data.chunks(row_len) {
        let tag = row[0];
        let mut current = row[1..].to_vec();
        match tag {
            0 => {}
            1 => {
                for i in 1..columns {
                    current[i] = current[i].wrapping_add(current[i - 1]);
                }
            }
            2 => {
                for i in 0..columns {
                    current[i] = current[i].wrapping_add(prev[i]);
                }
            }
            other => {
                return Err(PdfError::InvalidXref(format!(
                    "unsupported predictor row tag {other}"
                )))
            }
        }
        out.extend_from_slice(&current);
        prev = current;
    }
    Ok(out)
}

fn be_field(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(feature = "compression")]
fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| PdfError::InvalidXref(format!("corrupt FlateDecode data: {e}")))?;
    Ok(out)
}

#[cfg(not(feature = "compression"))]
fn inflate(_data: &[u8]) -> Result<Vec<u8>> {
    Err(PdfError::InvalidXref(
        "FlateDecode support not compiled in".to_string(),
    ))
}

fn read_version<R: Read + Seek>(reader: &mut R) -> Result<String> {
    reader.seek(SeekFrom::Start(0))?;
    let mut head = Vec::new();
    (&mut *reader).take(16).read_to_end(&mut head)?;
    if !head.starts_with(b"%PDF-") {
        return Err(PdfError::InvalidHeader);
    }
    let version: String = head[5..]
        .iter()
        .take_while(|b| !b.is_ascii_whitespace())
        .map(|&b| b as char)
        .collect();
    let well_formed = version.len() == 3
        && version.as_bytes()[0].is_ascii_digit()
        && version.as_bytes()[1] == b'.'
        && version.as_bytes()[2].is_ascii_digit();
    if !well_formed {
        return Err(PdfError::InvalidHeader);
    }
    Ok(version)
}

/// Scan the file tail for the last `startxref` keyword and the offset
/// after it.
fn find_startxref<R: Read + Seek>(reader: &mut R, length: u64) -> Result<u64> {
    let tail_len = length.min(1024);
    reader.seek(SeekFrom::Start(length - tail_len))?;
    let mut tail = vec![0u8; tail_len as usize];
    reader.read_exact(&mut tail)?;

    let keyword = b"startxref";
    let at = tail
        .windows(keyword.len())
        .rposition(|window| window == keyword)
        .ok_or_else(|| PdfError::InvalidXref("no startxref in file tail".to_string()))?;

    let mut digits = tail[at + keyword.len()..]
        .iter()
        .skip_while(|b| b.is_ascii_whitespace());
    let mut value: u64 = 0;
    let mut any = false;
    for &b in digits.by_ref().take_while(|b| b.is_ascii_digit()) {
        value = value * 10 + (b - b'0') as u64;
        any = true;
    }
    if !any {
        return Err(PdfError::InvalidXref(
            "startxref not followed by an offset".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A two-object file with exact offsets, assembled piecewise.
    fn fixture() -> Vec<u8> {
        let mut data: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let off1 = data.len();
        data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        let off2 = data.len();
        data.extend_from_slice(b"2 0 obj\n(hello)\nendobj\n");
        let xref = data.len();
        data.extend_from_slice(b"xref\n0 3\n");
        data.extend_from_slice(b"0000000000 65535 f \n");
        data.extend_from_slice(format!("{off1:010} 00000 n \n").as_bytes());
        data.extend_from_slice(format!("{off2:010} 00000 n \n").as_bytes());
        data.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());
        data
    }

    #[test]
    fn test_load_classic_table() {
        let mut doc = Document::load(Cursor::new(fixture())).unwrap();
        assert_eq!(doc.version(), "1.4");
        assert_eq!(doc.root(), Some(ObjectRef::new(1, 0)));
        assert!(!doc.is_encrypted());

        let object = doc
            .store_mut()
            .get(ObjectRef::new(2, 0))
            .unwrap()
            .unwrap();
        assert_eq!(object.try_get_string().unwrap().as_bytes(), b"hello");
    }

    #[test]
    fn test_objects_load_lazily() {
        let doc = Document::load(Cursor::new(fixture())).unwrap();
        // Both objects are registered, neither has been parsed
        assert_eq!(doc.store().len(), 2);
        assert_eq!(doc.store().references().len(), 2);
    }

    #[test]
    fn test_update_chain_newest_entry_wins() {
        let mut data = fixture();
        let prev_xref = data
            .windows(9)
            .rposition(|w| w == b"startxref")
            .map(|at| {
                String::from_utf8_lossy(&data[at + 10..])
                    .lines()
                    .next()
                    .unwrap()
                    .parse::<u64>()
                    .unwrap()
            })
            .unwrap();

        let off2 = data.len();
        data.extend_from_slice(b"2 0 obj\n(patched)\nendobj\n");
        let xref = data.len();
        data.extend_from_slice(b"xref\n2 1\n");
        data.extend_from_slice(format!("{off2:010} 00000 n \n").as_bytes());
        data.extend_from_slice(
            format!("trailer\n<< /Size 3 /Root 1 0 R /Prev {prev_xref} >>\n").as_bytes(),
        );
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());

        let mut doc = Document::load(Cursor::new(data)).unwrap();
        assert_eq!(doc.startxref(), xref as u64);
        let object = doc
            .store_mut()
            .get(ObjectRef::new(2, 0))
            .unwrap()
            .unwrap();
        assert_eq!(object.try_get_string().unwrap().as_bytes(), b"patched");
        // Object 1 still resolves through the previous section
        assert!(doc.store_mut().get(ObjectRef::new(1, 0)).unwrap().is_some());
    }

    #[test]
    fn test_freed_object_is_absent() {
        let mut data = fixture();
        let prev_xref = doc_startxref(&data);
        let xref = data.len();
        data.extend_from_slice(b"xref\n2 1\n");
        data.extend_from_slice(b"0000000000 00001 f \n");
        data.extend_from_slice(
            format!("trailer\n<< /Size 3 /Root 1 0 R /Prev {prev_xref} >>\n").as_bytes(),
        );
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());

        let mut doc = Document::load(Cursor::new(data)).unwrap();
        assert!(doc.store_mut().get(ObjectRef::new(2, 0)).unwrap().is_none());
    }

    fn doc_startxref(data: &[u8]) -> u64 {
        let at = data.windows(9).rposition(|w| w == b"startxref").unwrap();
        String::from_utf8_lossy(&data[at + 10..])
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_negative_table_field_is_rejected() {
        let mut data: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let xref = data.len();
        data.extend_from_slice(b"xref\n-1 1\n0000000000 00000 n \n");
        data.extend_from_slice(b"trailer\n<< /Size 1 >>\n");
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());

        let err = Document::load(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, PdfError::InvalidXref(_)));
    }

    #[test]
    fn test_non_dictionary_trailer_is_rejected() {
        let mut data: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let xref = data.len();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        data.extend_from_slice(b"trailer\n42\n");
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());

        let err = Document::load(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, PdfError::InvalidXref(_)));
    }

    #[test]
    fn test_debug_shows_a_summary() {
        let doc = Document::load(Cursor::new(fixture())).unwrap();
        let text = format!("{doc:?}");
        assert!(text.contains("version: \"1.4\""));
        assert!(text.contains("objects: 2"));
    }

    #[test]
    fn test_missing_header_fails() {
        let err = Document::load(Cursor::new(b"not a pdf at all".to_vec())).unwrap_err();
        assert!(matches!(err, PdfError::InvalidHeader));
    }

    #[test]
    fn test_missing_startxref_fails() {
        let err = Document::load(Cursor::new(b"%PDF-1.4\nnothing else here\n".to_vec()))
            .unwrap_err();
        assert!(matches!(err, PdfError::InvalidXref(_)));
    }

    #[test]
    fn test_xref_cycle_is_broken() {
        let mut data: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let xref = data.len();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        data.extend_from_slice(format!("trailer\n<< /Size 1 /Prev {xref} >>\n").as_bytes());
        data.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());

        // A self-referencing /Prev must not hang the loader
        let doc = Document::load(Cursor::new(data)).unwrap();
        assert_eq!(doc.store().len(), 0);
    }

    #[test]
    fn test_roundtrip_through_writer() {
        use crate::writer::DocumentWriter;

        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        let root = store.insert(Object::dictionary(catalog));
        let mut payload = Object::null();
        payload
            .get_or_create_stream()
            .unwrap()
            .set_raw_data(b"stream body".to_vec());
        let data_ref = store.insert(payload);

        let mut trailer = Dictionary::new();
        trailer.set("Root", Object::reference(root));

        let mut writer = DocumentWriter::new(Vec::new());
        writer.write_document(&mut store, &trailer).unwrap();
        let bytes = writer.into_inner();

        let mut doc = Document::load(Cursor::new(bytes)).unwrap();
        assert_eq!(doc.root(), Some(root));
        let object = doc.store_mut().get(data_ref).unwrap().unwrap();
        assert_eq!(object.get_stream().unwrap().data(), b"stream body");
    }

    #[test]
    fn test_roundtrip_xref_stream_mode() {
        use crate::writer::{DocumentWriter, WriterConfig, XrefMode};

        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let r = store.insert(Object::integer(99));

        let config = WriterConfig {
            xref_mode: XrefMode::Stream,
            ..WriterConfig::default()
        };
        let mut writer = DocumentWriter::with_config(Vec::new(), config);
        writer.write_document(&mut store, &Dictionary::new()).unwrap();
        let bytes = writer.into_inner();

        let mut doc = Document::load(Cursor::new(bytes)).unwrap();
        let object = doc.store_mut().get(r).unwrap().unwrap();
        assert_eq!(object.try_get_integer(), Some(99));
    }
}
