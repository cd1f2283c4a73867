//! quill-pdf is a low-level PDF library built around the file format's
//! indirect object model.
//!
//! The crate parses documents lazily: loading a file only reads the
//! cross-reference chain, and each object is parsed from its recorded
//! offset the first time the [`ObjectStore`] is asked for it. Stream
//! payloads are a second, independent stage, so walking a document's
//! dictionaries never drags megabytes of page content into memory.
//!
//! Writing supports full serialization as well as incremental updates
//! that append only changed objects, and both classic cross-reference
//! tables and cross-reference streams. RC4 standard security (revisions
//! 2 and 3) is handled transparently on both paths.
//!
//! # Example
//!
//! ```
//! use quill_pdf::{Dictionary, DocumentWriter, Object, ObjectStore};
//! use std::io::Cursor;
//!
//! let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
//! let mut catalog = Dictionary::new();
//! catalog.set("Type", Object::name("Catalog"));
//! let root = store.insert(Object::dictionary(catalog));
//!
//! let mut trailer = Dictionary::new();
//! trailer.set("Root", Object::reference(root));
//!
//! let mut writer = DocumentWriter::new(Vec::new());
//! writer.write_document(&mut store, &trailer).unwrap();
//! let bytes = writer.into_inner();
//! assert!(bytes.starts_with(b"%PDF-"));
//! ```

pub mod encryption;
pub mod error;
pub mod object;
pub mod parser;
pub mod store;
pub mod writer;

pub use encryption::Encryptor;
pub use error::{PdfError, Result};
pub use object::{Dictionary, Object, ObjectRef, PdfString, StreamData, Value};
pub use parser::Document;
pub use store::ObjectStore;
pub use writer::{DocumentWriter, PdfVersion, WriteMode, WriterConfig, XrefMode};
