//! Serialization of a document to PDF syntax.
//!
//! [`DocumentWriter`] tracks the byte position of everything it emits, so
//! cross-reference offsets fall out of the write itself. Both full writes
//! and incremental updates are supported; an update appends only dirty
//! objects after the unchanged original bytes and chains the new
//! cross-reference section to the previous one via `/Prev`.

mod xref;

use crate::encryption::Encryptor;
use crate::error::{PdfError, Result};
use crate::object::{Dictionary, Object, ObjectRef, PdfString, Value};
use crate::store::{has_crypt_filter, ObjectStore};
use std::io::{Read, Seek, Write};
use tracing::debug;
use xref::XRefBuilder;

/// Version advertised in the `%PDF-` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfVersion {
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    #[default]
    V1_7,
}

impl PdfVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

/// How the cross-reference section is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XrefMode {
    /// Classic `xref` table with twenty-byte text entries.
    #[default]
    Table,
    /// Cross-reference stream object. Requires PDF 1.5 readers.
    Stream,
}

/// Whitespace style for dictionaries and arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Single spaces only.
    #[default]
    Compact,
    /// One dictionary entry per line, for files meant to be read by
    /// people.
    Pretty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriterConfig {
    pub version: PdfVersion,
    pub xref_mode: XrefMode,
    pub write_mode: WriteMode,
}

/// Streams a document to any `Write` sink while keeping an exact count of
/// bytes written.
pub struct DocumentWriter<W: Write> {
    writer: W,
    position: u64,
    config: WriterConfig,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, WriterConfig::default())
    }

    pub fn with_config(writer: W, config: WriterConfig) -> Self {
        Self {
            writer,
            position: 0,
            config,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write the whole document: header, every object, the
    /// cross-reference section and the trailer. Returns the byte offset
    /// of the cross-reference section, which a later
    /// [`DocumentWriter::write_update`] takes as its previous offset.
    pub fn write_document<R: Read + Seek>(
        &mut self,
        store: &mut ObjectStore<R>,
        trailer: &Dictionary,
    ) -> Result<u64> {
        self.write_bytes(format!("%PDF-{}\n", self.config.version.as_str()).as_bytes())?;
        // Binary comment so transfer tools treat the file as binary
        self.write_bytes(b"%\xE2\xE3\xCF\xD3\n")?;

        let encryption = self.prepare_encryption(store);
        let mut builder = XRefBuilder::new();
        builder.add_free(0, 0, 65535);

        for reference in store.references() {
            builder.add_in_use(reference.number(), reference.generation(), self.position);
            self.write_object(store, reference, &encryption)?;
        }

        let size = store.max_object_number() as i64 + 1;
        // The /ID must match what the file key was derived from
        let id = match &encryption {
            Some((encryptor, _)) => {
                let file_id = encryptor.file_id().to_vec();
                (file_id.clone(), file_id)
            }
            None => {
                let seed = info_seed(store, trailer)?;
                document_id_pair(trailer, &seed, self.position, false)
            }
        };
        let encrypt_ref = encryption.as_ref().map(|(_, r)| *r);
        let xref_offset =
            self.write_xref_and_trailer(builder, trailer, size, encrypt_ref, None, id)?;

        store.mark_all_clean();
        self.writer.flush()?;
        Ok(xref_offset)
    }

    /// Append an incremental update: only dirty objects, a
    /// cross-reference section covering them, and a trailer chained to
    /// `prev_xref_offset`. The writer must be positioned at the end of
    /// the existing file, whose length is `base_length`.
    pub fn write_update<R: Read + Seek>(
        &mut self,
        store: &mut ObjectStore<R>,
        trailer: &Dictionary,
        prev_xref_offset: u64,
        base_length: u64,
    ) -> Result<u64> {
        debug_assert_eq!(self.position, 0, "update must start on a fresh writer");
        self.position = base_length;

        let encryption = self.prepare_encryption(store);
        let mut builder = XRefBuilder::new();

        let dirty: Vec<ObjectRef> = store
            .references()
            .into_iter()
            .filter(|&r| store.is_dirty(r))
            .collect();
        debug!(objects = dirty.len(), "writing incremental update");

        for reference in dirty {
            builder.add_in_use(reference.number(), reference.generation(), self.position);
            self.write_object(store, reference, &encryption)?;
        }

        let size = store.max_object_number() as i64 + 1;
        let seed = info_seed(store, trailer)?;
        let id = match &encryption {
            Some((encryptor, _)) => {
                let (_, fresh) = document_id_pair(trailer, &seed, self.position, true);
                (encryptor.file_id().to_vec(), fresh)
            }
            None => document_id_pair(trailer, &seed, self.position, true),
        };
        let encrypt_ref = encryption.as_ref().map(|(_, r)| *r);
        let xref_offset = self.write_xref_and_trailer(
            builder,
            trailer,
            size,
            encrypt_ref,
            Some(prev_xref_offset),
            id,
        )?;

        store.mark_all_clean();
        self.writer.flush()?;
        Ok(xref_offset)
    }

    /// Make sure an encrypted document has its encryption dictionary as a
    /// real object, allocating one if the encryptor was installed after
    /// the fact.
    fn prepare_encryption<R>(
        &self,
        store: &mut ObjectStore<R>,
    ) -> Option<(Encryptor, ObjectRef)> {
        let encryptor = store.encryptor()?.clone();
        let reference = match store.encrypt_ref() {
            Some(r) => r,
            None => {
                let r = store.insert(Object::dictionary(encryptor.encryption_dictionary()));
                store.set_encryptor(encryptor.clone(), Some(r));
                r
            }
        };
        Some((encryptor, reference))
    }

    fn write_object<R: Read + Seek>(
        &mut self,
        store: &mut ObjectStore<R>,
        reference: ObjectRef,
        encryption: &Option<(Encryptor, ObjectRef)>,
    ) -> Result<()> {
        let pretty = self.config.write_mode == WriteMode::Pretty;
        let mut out = Vec::new();
        {
            let object = store.get(reference)?.ok_or_else(|| {
                PdfError::InvalidHandle(format!("object {reference} disappeared during write"))
            })?;
            // The encryption dictionary itself stays in the clear
            let ctx = match encryption {
                Some((encryptor, encrypt_ref)) if *encrypt_ref != reference => {
                    Some((encryptor, reference))
                }
                _ => None,
            };
            render_indirect_object(&mut out, reference, object, ctx, pretty)?;
        }
        self.write_bytes(&out)
    }

    fn write_xref_and_trailer(
        &mut self,
        mut builder: XRefBuilder,
        template: &Dictionary,
        size: i64,
        encrypt_ref: Option<ObjectRef>,
        prev: Option<u64>,
        id: (Vec<u8>, Vec<u8>),
    ) -> Result<u64> {
        let pretty = self.config.write_mode == WriteMode::Pretty;
        match self.config.xref_mode {
            XrefMode::Table => {
                let xref_offset = self.position;
                let mut out = Vec::new();
                builder.write_table(&mut out);
                let trailer = build_trailer(template, size, encrypt_ref, prev, id);
                out.extend_from_slice(b"trailer\n");
                render_value(&mut out, &Value::Dictionary(trailer), None, pretty);
                out.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
                self.write_bytes(&out)?;
                Ok(xref_offset)
            }
            XrefMode::Stream => {
                let xref_offset = self.position;
                // The stream object describes itself, so its own entry
                // goes in before the rows are encoded.
                let number = (size as u32).max(builder.max_number() + 1);
                builder.add_in_use(number, 0, xref_offset);
                let (rows, widths, index) = builder.encode_stream_rows();

                let mut dict = build_trailer(template, number as i64 + 1, encrypt_ref, prev, id);
                dict.set("Type", Object::name("XRef"));
                dict.set(
                    "W",
                    Object::array(widths.iter().map(|&w| Object::integer(w as i64)).collect()),
                );
                dict.set(
                    "Index",
                    Object::array(index.into_iter().map(Object::integer).collect()),
                );
                let payload = encode_xref_payload(rows, &mut dict)?;
                dict.set("Length", Object::integer(payload.len() as i64));

                let mut out = Vec::new();
                out.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
                render_value(&mut out, &Value::Dictionary(dict), None, pretty);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(&payload);
                out.extend_from_slice(b"\nendstream\nendobj\n");
                out.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
                self.write_bytes(&out)?;
                Ok(xref_offset)
            }
        }
    }
}

#[cfg(feature = "compression")]
fn encode_xref_payload(rows: Vec<u8>, dict: &mut Dictionary) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&rows)?;
    let compressed = encoder.finish()?;
    dict.set("Filter", Object::name("FlateDecode"));
    Ok(compressed)
}

#[cfg(not(feature = "compression"))]
fn encode_xref_payload(rows: Vec<u8>, _dict: &mut Dictionary) -> Result<Vec<u8>> {
    Ok(rows)
}

fn build_trailer(
    template: &Dictionary,
    size: i64,
    encrypt_ref: Option<ObjectRef>,
    prev: Option<u64>,
    id: (Vec<u8>, Vec<u8>),
) -> Dictionary {
    let mut trailer = Dictionary::new();
    trailer.set("Size", Object::integer(size));
    for key in ["Root", "Info"] {
        if let Some(entry) = template.get(key) {
            trailer.set(key, entry.clone());
        }
    }
    if let Some(r) = encrypt_ref {
        trailer.set("Encrypt", Object::reference(r));
    }
    if let Some(prev) = prev {
        trailer.set("Prev", Object::integer(prev as i64));
    }
    trailer.set(
        "ID",
        Object::array(vec![
            Object::string(PdfString::new(id.0)),
            Object::string(PdfString::new(id.1)),
        ]),
    );
    trailer
}

/// Descriptive strings from the document information dictionary, hashed
/// into the document identifier so distinct documents get distinct IDs.
fn info_seed<R: Read + Seek>(
    store: &mut ObjectStore<R>,
    trailer: &Dictionary,
) -> Result<Vec<u8>> {
    let mut seed = Vec::new();
    if let Some(info_ref) = trailer.get("Info").and_then(|o| o.try_get_reference()) {
        if let Some(object) = store.resolve(info_ref)? {
            if let Some(dict) = object.value().as_dict() {
                for (key, item) in dict.iter() {
                    seed.extend_from_slice(key.as_bytes());
                    if let Some(s) = item.try_get_string() {
                        seed.extend_from_slice(s.as_bytes());
                    }
                }
            }
        }
    }
    Ok(seed)
}

/// The permanent and changing halves of the document `/ID`. A full write
/// uses the fresh value for both; an update keeps the first half from the
/// original file so the pair still identifies the same document.
fn document_id_pair(
    template: &Dictionary,
    info_seed: &[u8],
    position: u64,
    is_update: bool,
) -> (Vec<u8>, Vec<u8>) {
    let mut seed = Vec::new();
    seed.extend_from_slice(info_seed);
    seed.extend_from_slice(chrono::Utc::now().to_rfc3339().as_bytes());
    seed.extend_from_slice(&position.to_le_bytes());
    let fresh = md5::compute(&seed).to_vec();

    if is_update {
        let first = template
            .get("ID")
            .and_then(|o| o.value().as_array())
            .and_then(|items| items.first())
            .and_then(|o| o.try_get_string())
            .map(|s| s.as_bytes().to_vec());
        if let Some(first) = first {
            return (first, fresh);
        }
    }
    (fresh.clone(), fresh)
}

/// Serialize one indirect object, stream payload included.
fn render_indirect_object(
    out: &mut Vec<u8>,
    reference: ObjectRef,
    object: &Object,
    ctx: Option<(&Encryptor, ObjectRef)>,
    pretty: bool,
) -> Result<()> {
    out.extend_from_slice(format!("{} {} obj\n", reference.number(), reference.generation()).as_bytes());

    if let Some(stream) = object.stream() {
        let mut dict = object.get_dictionary()?.clone();
        let payload = match ctx {
            Some((encryptor, r)) if !has_crypt_filter(&dict) => {
                encryptor.encrypt(r, stream.data())
            }
            _ => stream.data().to_vec(),
        };
        // /Length always reflects the bytes actually written, even if the
        // parsed file routed it through another object
        dict.set("Length", Object::integer(payload.len() as i64));
        render_value(out, &Value::Dictionary(dict), ctx, pretty);
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&payload);
        out.extend_from_slice(b"\nendstream\nendobj\n");
    } else {
        render_value(out, object.value(), ctx, pretty);
        out.extend_from_slice(b"\nendobj\n");
    }
    Ok(())
}

/// Serialize a value tree. Strings are encrypted through `ctx` when one
/// is given; everything else passes through unchanged.
fn render_value(
    out: &mut Vec<u8>,
    value: &Value,
    ctx: Option<(&Encryptor, ObjectRef)>,
    pretty: bool,
) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Boolean(true) => out.extend_from_slice(b"true"),
        Value::Boolean(false) => out.extend_from_slice(b"false"),
        Value::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
        Value::String(s) => match ctx {
            Some((encryptor, reference)) => {
                render_hex_string(out, &encryptor.encrypt(reference, s.as_bytes()))
            }
            None => render_string(out, s.as_bytes()),
        },
        Value::Name(name) => render_name(out, name),
        Value::Reference(r) => out.extend_from_slice(r.to_string().as_bytes()),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                render_value(out, item.value(), ctx, pretty);
            }
            out.push(b']');
        }
        Value::Dictionary(dict) => {
            out.extend_from_slice(b"<<");
            for (key, item) in dict.iter() {
                out.push(if pretty { b'\n' } else { b' ' });
                render_name(out, key);
                out.push(b' ');
                render_value(out, item.value(), ctx, pretty);
            }
            out.push(if pretty { b'\n' } else { b' ' });
            out.extend_from_slice(b">>");
        }
        Value::RawData(bytes) => out.extend_from_slice(bytes),
    }
}

/// Decimal rendering of a real without trailing zeros and without the
/// exponent forms PDF forbids.
fn format_real(r: f64) -> String {
    if !r.is_finite() {
        return "0".to_string();
    }
    let text = format!("{r:.6}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Literal string when every byte is printable, hex string otherwise.
fn render_string(out: &mut Vec<u8>, bytes: &[u8]) {
    let printable = bytes
        .iter()
        .all(|&b| (0x20..0x7f).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t'));
    if !printable {
        return render_hex_string(out, bytes);
    }
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

fn render_hex_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'<');
    for b in bytes {
        out.extend_from_slice(format!("{b:02X}").as_bytes());
    }
    out.push(b'>');
}

/// Names escape anything outside the regular character range as `#xx`.
fn render_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for &b in name.as_bytes() {
        let regular = (0x21..0x7f).contains(&b)
            && !matches!(
                b,
                b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
            );
        if regular {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}
