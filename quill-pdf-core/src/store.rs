//! Indirect object storage and delayed loading.
//!
//! The store owns every indirect object of a document together with the
//! reader they came from, so it is the only place where a deferred parse
//! can actually be driven. Header and stream loading are triggered at most
//! once per object; a failed attempt raises the stage flag anyway and
//! caches the error, so later accesses replay the same failure without
//! touching the file again.

use crate::encryption::Encryptor;
use crate::error::{PdfError, Result};
use crate::object::{Dictionary, Object, ObjectRef, PdfString, StreamData, Value};
use crate::parser::{self, ParseSource};
use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

/// All indirect objects of one document, keyed by reference.
///
/// Objects created in memory are fully loaded from birth. Objects
/// registered from a cross-reference table start as empty shells that
/// remember their file offset and are parsed on first access.
pub struct ObjectStore<R> {
    objects: BTreeMap<ObjectRef, Object>,
    reader: Option<R>,
    encryptor: Option<Encryptor>,
    /// The encryption dictionary's own reference. Its strings are never
    /// encrypted, so decryption must skip it.
    encrypt_ref: Option<ObjectRef>,
}

impl<R> Default for ObjectStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ObjectStore<R> {
    /// An empty store with no backing reader. Suitable for documents
    /// built from scratch.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            reader: None,
            encryptor: None,
            encrypt_ref: None,
        }
    }

    /// A store whose parser-backed objects load from `reader`.
    pub fn with_reader(reader: R) -> Self {
        Self {
            objects: BTreeMap::new(),
            reader: Some(reader),
            encryptor: None,
            encrypt_ref: None,
        }
    }

    /// Add an in-memory object under the next free object number,
    /// generation zero. The object becomes indirect and dirty.
    pub fn insert(&mut self, mut object: Object) -> ObjectRef {
        let reference = ObjectRef::new(self.max_object_number() + 1, 0);
        object.set_indirect_reference(Some(reference));
        object.set_dirty();
        self.objects.insert(reference, object);
        reference
    }

    /// Add an in-memory object under a caller-chosen reference, replacing
    /// any existing entry.
    pub fn insert_at(&mut self, reference: ObjectRef, mut object: Object) {
        object.set_indirect_reference(Some(reference));
        object.set_dirty();
        self.objects.insert(reference, object);
    }

    /// Register an object found in a cross-reference section. The first
    /// registration wins; later sections of an update chain describe
    /// older revisions of the same object.
    pub(crate) fn register_parsed(&mut self, reference: ObjectRef, offset: u64) {
        self.objects.entry(reference).or_insert_with(|| {
            let mut object = Object::from_parse_source(ParseSource::new(offset, true));
            object.set_indirect_reference(Some(reference));
            object
        });
    }

    pub fn contains(&self, reference: ObjectRef) -> bool {
        self.objects.contains_key(&reference)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The highest object number in use, or zero for an empty store.
    pub fn max_object_number(&self) -> u32 {
        self.objects
            .keys()
            .next_back()
            .map(|r| r.number())
            .unwrap_or(0)
    }

    /// Every reference in the store, in ascending order.
    pub fn references(&self) -> Vec<ObjectRef> {
        self.objects.keys().copied().collect()
    }

    /// Remove an object, detaching its indirect reference.
    pub fn remove(&mut self, reference: ObjectRef) -> Option<Object> {
        let mut object = self.objects.remove(&reference)?;
        object.set_indirect_reference(None);
        Some(object)
    }

    /// Replace the object at `reference` with a copy of `source`,
    /// preserving `source`'s dirty state. The entry is created if absent.
    pub fn replace(&mut self, reference: ObjectRef, source: &Object) {
        let mut object = self.objects.remove(&reference).unwrap_or_default();
        object.load.header_loaded = true;
        object.load.stream_loaded = true;
        object.load.source = None;
        object.load.header_failure = None;
        object.load.stream_failure = None;
        object.assign(source);
        object.set_indirect_reference(Some(reference));
        self.objects.insert(reference, object);
    }

    /// Install the decryption context for an encrypted document.
    /// `encrypt_ref` names the encryption dictionary itself, which is
    /// stored in the clear.
    pub fn set_encryptor(&mut self, encryptor: Encryptor, encrypt_ref: Option<ObjectRef>) {
        self.encryptor = Some(encryptor);
        self.encrypt_ref = encrypt_ref;
    }

    pub(crate) fn encryptor(&self) -> Option<&Encryptor> {
        self.encryptor.as_ref()
    }

    pub(crate) fn encrypt_ref(&self) -> Option<ObjectRef> {
        self.encrypt_ref
    }

    /// Clear every dirty flag. Called after a successful save, when the
    /// file and the in-memory state agree again.
    pub(crate) fn mark_all_clean(&mut self) {
        for object in self.objects.values_mut() {
            object.reset_dirty();
        }
    }

    /// Dirty flag of the object at `reference`, without triggering a load.
    pub(crate) fn is_dirty(&self, reference: ObjectRef) -> bool {
        self.objects
            .get(&reference)
            .is_some_and(|object| object.is_dirty())
    }
}

impl<R: Read + Seek> ObjectStore<R> {
    /// The object at `reference` with header and stream fully loaded.
    pub fn get(&mut self, reference: ObjectRef) -> Result<Option<&Object>> {
        self.ensure_header(reference)?;
        self.ensure_stream(reference)?;
        Ok(self.objects.get(&reference))
    }

    /// Mutable access to a fully loaded object.
    pub fn get_mut(&mut self, reference: ObjectRef) -> Result<Option<&mut Object>> {
        self.ensure_header(reference)?;
        self.ensure_stream(reference)?;
        Ok(self.objects.get_mut(&reference))
    }

    /// The object at `reference` with its header loaded but the stream
    /// payload left on disk. Cheaper than [`ObjectStore::get`] when only
    /// the dictionary is needed.
    pub fn resolve(&mut self, reference: ObjectRef) -> Result<Option<&Object>> {
        self.ensure_header(reference)?;
        Ok(self.objects.get(&reference))
    }

    /// Drop the parsed state of a parser-backed object so a later access
    /// re-reads it from the file. Dirty objects are kept unless `force`
    /// is set.
    pub fn free_object_memory(&mut self, reference: ObjectRef, force: bool) {
        if let Some(object) = self.objects.get_mut(&reference) {
            object.free_object_memory(force);
        }
    }

    /// First loading stage: parse `N G obj`, the value and the optional
    /// `stream` keyword position. Runs at most once per object.
    pub(crate) fn ensure_header(&mut self, reference: ObjectRef) -> Result<()> {
        match self.objects.get(&reference) {
            None => return Ok(()),
            Some(object) => {
                if object.load.header_loaded {
                    if let Some(err) = &object.load.header_failure {
                        return Err(err.replay());
                    }
                    return Ok(());
                }
            }
        }

        let result = self.load_header_now(reference);
        if let Some(object) = self.objects.get_mut(&reference) {
            object.load.header_loaded = true;
            if let Err(err) = &result {
                debug!(%reference, error = %err, "header load failed");
                object.load.header_failure = Some(err.replay());
            }
        }
        result
    }

    fn load_header_now(&mut self, reference: ObjectRef) -> Result<()> {
        let Self {
            objects,
            reader,
            encryptor,
            encrypt_ref,
        } = self;
        let reader = reader
            .as_mut()
            .ok_or_else(|| PdfError::InvalidHandle("store has no backing reader".to_string()))?;
        let Some(object) = objects.get_mut(&reference) else {
            return Ok(());
        };

        parser::load_header(&mut *reader, object)?;
        // The map key is authoritative even if the file header disagreed
        object.set_indirect_reference(Some(reference));

        if let Some(encryptor) = encryptor {
            let applies = object
                .load
                .source
                .as_ref()
                .is_some_and(|s| s.encrypted)
                && Some(reference) != *encrypt_ref;
            if applies {
                if let Ok(value) = object.value_mut() {
                    decrypt_strings(encryptor, reference, value);
                }
                object.reset_dirty();
            }
        }
        Ok(())
    }

    /// Second loading stage: resolve `/Length`, read the payload bytes and
    /// decrypt them unless a `Crypt` filter opts the stream out. Requires
    /// the header stage; runs at most once per object.
    pub(crate) fn ensure_stream(&mut self, reference: ObjectRef) -> Result<()> {
        self.ensure_header(reference)?;
        match self.objects.get(&reference) {
            None => return Ok(()),
            Some(object) => {
                if object.load.stream_loaded {
                    if let Some(err) = &object.load.stream_failure {
                        return Err(err.replay());
                    }
                    return Ok(());
                }
            }
        }

        let result = self.load_stream_now(reference);
        if let Some(object) = self.objects.get_mut(&reference) {
            object.load.stream_loaded = true;
            if let Err(err) = &result {
                debug!(%reference, error = %err, "stream load failed");
                object.load.stream_failure = Some(err.replay());
            }
        }
        result
    }

    fn load_stream_now(&mut self, reference: ObjectRef) -> Result<()> {
        // Gather everything needed from the object before any further
        // loading, so resolving an indirect /Length can borrow the store.
        let (stream_offset, length_value, skip_decryption, encrypted) = {
            let Some(object) = self.objects.get(&reference) else {
                return Ok(());
            };
            let Some(source) = object.load.source.as_ref() else {
                return Ok(());
            };
            if !source.has_stream {
                return Ok(());
            }
            let dict = object.get_dictionary()?;
            let length = dict.get("Length").map(|o| o.value().clone());
            (
                source.stream_offset,
                length,
                has_crypt_filter(dict),
                source.encrypted,
            )
        };

        let length = match length_value {
            Some(Value::Integer(n)) => n,
            Some(Value::Reference(length_ref)) => {
                self.ensure_header(length_ref).map_err(|e| {
                    PdfError::InvalidStreamLength(format!(
                        "cannot load length object {length_ref}: {e}"
                    ))
                })?;
                self.objects
                    .get(&length_ref)
                    .and_then(|o| o.try_get_number_lenient())
                    .ok_or_else(|| {
                        PdfError::InvalidStreamLength(format!(
                            "length object {length_ref} is not a number"
                        ))
                    })?
            }
            Some(other) => {
                return Err(PdfError::InvalidStreamLength(format!(
                    "/Length is a {}",
                    other.type_name()
                )))
            }
            None => {
                return Err(PdfError::InvalidStreamLength(
                    "stream dictionary has no /Length".to_string(),
                ))
            }
        };
        if length < 0 {
            return Err(PdfError::InvalidStreamLength(format!(
                "negative stream length {length}"
            )));
        }

        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| PdfError::InvalidHandle("store has no backing reader".to_string()))?;
        // Length resolution may have moved the reader; come back to the
        // recorded first stream byte.
        reader.seek(SeekFrom::Start(stream_offset))?;
        let mut data = vec![0u8; length as usize];
        reader.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PdfError::InvalidStreamLength(format!(
                    "stream at offset {stream_offset} is shorter than /Length {length}"
                ))
            } else {
                PdfError::Io(e)
            }
        })?;

        if encrypted && !skip_decryption && Some(reference) != self.encrypt_ref {
            if let Some(encryptor) = &self.encryptor {
                data = encryptor.decrypt(reference, &data);
            }
        }

        if let Some(object) = self.objects.get_mut(&reference) {
            object.attach_stream(StreamData::with_data(data));
        }
        Ok(())
    }
}

/// Whether `/Filter` names `Crypt` anywhere, directly or inside an array.
/// Such streams are carried around the document's encryption and must not
/// be decrypted or re-encrypted.
pub(crate) fn has_crypt_filter(dict: &Dictionary) -> bool {
    match dict.get("Filter").map(|o| o.value()) {
        Some(Value::Name(name)) => name == "Crypt",
        Some(Value::Array(items)) => items.iter().any(|i| i.try_get_name() == Some("Crypt")),
        _ => false,
    }
}

/// Decrypt every string in a value tree in place. Containers are walked
/// recursively; all other value kinds pass through untouched.
fn decrypt_strings(encryptor: &Encryptor, reference: ObjectRef, value: &mut Value) {
    match value {
        Value::String(s) => {
            let plain = encryptor.decrypt(reference, s.as_bytes());
            *s = PdfString::new(plain);
        }
        Value::Array(items) => {
            for item in items {
                if let Ok(inner) = item.value_mut() {
                    decrypt_strings(encryptor, reference, inner);
                }
                item.reset_dirty();
            }
        }
        Value::Dictionary(dict) => {
            for (_, item) in dict.iter_mut() {
                if let Ok(inner) = item.value_mut() {
                    decrypt_strings(encryptor, reference, inner);
                }
                item.reset_dirty();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A reader that counts how often it is seeked, to observe whether a
    /// load stage ran again.
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        seeks: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for CountingReader {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.seeks.set(self.seeks.get() + 1);
            self.inner.seek(pos)
        }
    }

    fn counting_store(data: &[u8]) -> (ObjectStore<CountingReader>, std::rc::Rc<std::cell::Cell<usize>>) {
        let seeks = std::rc::Rc::new(std::cell::Cell::new(0));
        let reader = CountingReader {
            inner: Cursor::new(data.to_vec()),
            seeks: seeks.clone(),
        };
        (ObjectStore::with_reader(reader), seeks)
    }

    fn cursor_store(data: &[u8]) -> ObjectStore<Cursor<Vec<u8>>> {
        ObjectStore::with_reader(Cursor::new(data.to_vec()))
    }

    #[test]
    fn test_insert_allocates_sequential_numbers() {
        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let a = store.insert(Object::integer(1));
        let b = store.insert(Object::integer(2));
        assert_eq!(a, ObjectRef::new(1, 0));
        assert_eq!(b, ObjectRef::new(2, 0));
        assert_eq!(store.max_object_number(), 2);

        store.insert_at(ObjectRef::new(10, 0), Object::null());
        assert_eq!(store.insert(Object::null()), ObjectRef::new(11, 0));
    }

    #[test]
    fn test_inserted_objects_are_dirty_and_indirect() {
        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let r = store.insert(Object::name("Catalog"));
        let object = store.resolve(r).unwrap().unwrap();
        assert!(object.is_dirty());
        assert_eq!(object.indirect_reference(), Some(r));
    }

    #[test]
    fn test_lazy_header_load() {
        let mut store = cursor_store(b"junk 1 0 obj\n42\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 5);

        let object = store.resolve(r).unwrap().unwrap();
        assert_eq!(object.try_get_integer(), Some(42));
        assert!(!object.is_dirty());
    }

    #[test]
    fn test_header_loaded_once() {
        let (mut store, seeks) = counting_store(b"1 0 obj\n(hello)\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        store.resolve(r).unwrap();
        let after_first = seeks.get();
        assert!(after_first > 0);
        store.resolve(r).unwrap();
        store.resolve(r).unwrap();
        assert_eq!(seeks.get(), after_first);
    }

    #[test]
    fn test_header_failure_is_cached_and_replayed() {
        let (mut store, seeks) = counting_store(b"1 0 garbage\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        assert!(matches!(
            store.resolve(r).unwrap_err(),
            PdfError::MissingObjectKeyword { .. }
        ));
        let after_first = seeks.get();
        assert!(matches!(
            store.resolve(r).unwrap_err(),
            PdfError::MissingObjectKeyword { .. }
        ));
        // The second failure came from the cache, not from the file
        assert_eq!(seeks.get(), after_first);
        assert!(store.objects.get(&r).unwrap().is_header_loaded());
    }

    #[test]
    fn test_stream_with_direct_length() {
        let mut store = cursor_store(b"1 0 obj\n<< /Length 5 >>\nstream\nHELLO\nendstream\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.get_stream().unwrap().data(), b"HELLO");
        assert!(object.is_stream_loaded());
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n<< /Length 2 0 R >>\nstream\nHELLO\nendstream\nendobj\n");
        let len_offset = data.len() as u64;
        data.extend_from_slice(b"2 0 obj\n5\nendobj\n");

        let mut store = cursor_store(&data);
        store.register_parsed(ObjectRef::new(1, 0), 0);
        store.register_parsed(ObjectRef::new(2, 0), len_offset);

        let object = store.get(ObjectRef::new(1, 0)).unwrap().unwrap();
        assert_eq!(object.get_stream().unwrap().data(), b"HELLO");
    }

    #[test]
    fn test_stream_length_referencing_non_number_fails() {
        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n<< /Length 2 0 R >>\nstream\nHELLO\nendstream\nendobj\n");
        let len_offset = data.len() as u64;
        data.extend_from_slice(b"2 0 obj\n/NotANumber\nendobj\n");

        let mut store = cursor_store(&data);
        store.register_parsed(ObjectRef::new(1, 0), 0);
        store.register_parsed(ObjectRef::new(2, 0), len_offset);

        assert!(matches!(
            store.get(ObjectRef::new(1, 0)).unwrap_err(),
            PdfError::InvalidStreamLength(_)
        ));
        // The failure is cached on the stream stage
        assert!(matches!(
            store.get(ObjectRef::new(1, 0)).unwrap_err(),
            PdfError::InvalidStreamLength(_)
        ));
    }

    #[test]
    fn test_stream_shorter_than_length_fails() {
        let mut store = cursor_store(b"1 0 obj\n<< /Length 99 >>\nstream\nHI\nendstream\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);
        assert!(matches!(
            store.get(r).unwrap_err(),
            PdfError::InvalidStreamLength(_)
        ));
    }

    #[test]
    fn test_missing_length_fails() {
        let mut store = cursor_store(b"1 0 obj\n<< /Type /X >>\nstream\nHI\nendstream\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);
        assert!(matches!(
            store.get(r).unwrap_err(),
            PdfError::InvalidStreamLength(_)
        ));
    }

    #[test]
    fn test_resolve_leaves_stream_on_disk() {
        let mut store = cursor_store(b"1 0 obj\n<< /Length 5 >>\nstream\nHELLO\nendstream\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        let object = store.resolve(r).unwrap().unwrap();
        assert!(object.is_header_loaded());
        assert!(!object.is_stream_loaded());
        assert!(object.has_stream());
        assert!(object.get_stream().is_err());
    }

    #[test]
    fn test_free_object_memory_allows_reload() {
        let mut store = cursor_store(b"1 0 obj\n42\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        store.get(r).unwrap();
        store.free_object_memory(r, false);
        assert!(!store.objects.get(&r).unwrap().is_header_loaded());

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.try_get_integer(), Some(42));
    }

    #[test]
    fn test_free_object_memory_keeps_dirty_objects() {
        let mut store = cursor_store(b"1 0 obj\n42\nendobj\n");
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);

        store.get_mut(r).unwrap().unwrap().set_integer(43).unwrap();
        store.free_object_memory(r, false);
        assert_eq!(
            store.get(r).unwrap().unwrap().try_get_integer(),
            Some(43)
        );

        store.free_object_memory(r, true);
        assert_eq!(
            store.get(r).unwrap().unwrap().try_get_integer(),
            Some(42)
        );
    }

    #[test]
    fn test_register_parsed_first_wins() {
        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n(new)\nendobj\n");
        let old_offset = data.len() as u64;
        data.extend_from_slice(b"1 0 obj\n(old)\nendobj\n");

        let mut store = cursor_store(&data);
        let r = ObjectRef::new(1, 0);
        store.register_parsed(r, 0);
        store.register_parsed(r, old_offset);

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.try_get_string().unwrap().as_bytes(), b"new");
    }

    #[test]
    fn test_replace_preserves_source_dirty_state() {
        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let r = store.insert(Object::integer(1));

        let mut clean = Object::integer(2);
        clean.reset_dirty();
        store.replace(r, &clean);
        let object = store.resolve(r).unwrap().unwrap();
        assert_eq!(object.try_get_integer(), Some(2));
        assert!(!object.is_dirty());
        assert_eq!(object.indirect_reference(), Some(r));
    }

    #[test]
    fn test_remove_detaches_reference() {
        let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
        let r = store.insert(Object::integer(1));
        let object = store.remove(r).unwrap();
        assert!(!object.is_indirect());
        assert!(!store.contains(r));
    }

    #[test]
    fn test_encrypted_string_is_decrypted_on_load() {
        let encryptor = Encryptor::rc4_128bit("", "", -4, b"fixture-id");
        let r = ObjectRef::new(1, 0);
        let ciphertext = encryptor.encrypt(r, b"secret");

        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n<");
        for byte in &ciphertext {
            data.extend_from_slice(format!("{byte:02x}").as_bytes());
        }
        data.extend_from_slice(b">\nendobj\n");

        let mut store = cursor_store(&data);
        store.register_parsed(r, 0);
        store.set_encryptor(encryptor, Some(ObjectRef::new(99, 0)));

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.try_get_string().unwrap().as_bytes(), b"secret");
        assert!(!object.is_dirty());
    }

    #[test]
    fn test_encrypted_stream_is_decrypted_on_load() {
        let encryptor = Encryptor::rc4_128bit("", "", -4, b"fixture-id");
        let r = ObjectRef::new(1, 0);
        let ciphertext = encryptor.encrypt(r, b"PAYLOAD");

        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n<< /Length 7 >>\nstream\n");
        data.extend_from_slice(&ciphertext);
        data.extend_from_slice(b"\nendstream\nendobj\n");

        let mut store = cursor_store(&data);
        store.register_parsed(r, 0);
        store.set_encryptor(encryptor, Some(ObjectRef::new(99, 0)));

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.get_stream().unwrap().data(), b"PAYLOAD");
    }

    #[test]
    fn test_crypt_filter_stream_is_not_decrypted() {
        let encryptor = Encryptor::rc4_128bit("", "", -4, b"fixture-id");
        let r = ObjectRef::new(1, 0);

        let mut data = Vec::new();
        data.extend_from_slice(b"1 0 obj\n<< /Length 3 /Filter [ /FlateDecode /Crypt ] >>\nstream\nRAW\nendstream\nendobj\n");
        let mut store = cursor_store(&data);
        store.register_parsed(r, 0);
        store.set_encryptor(encryptor, Some(ObjectRef::new(99, 0)));

        let object = store.get(r).unwrap().unwrap();
        assert_eq!(object.get_stream().unwrap().data(), b"RAW");
    }

    #[test]
    fn test_has_crypt_filter_shapes() {
        let mut direct = Dictionary::new();
        direct.set("Filter", Object::name("Crypt"));
        assert!(has_crypt_filter(&direct));

        let mut in_array = Dictionary::new();
        in_array.set(
            "Filter",
            Object::array(vec![Object::name("ASCIIHexDecode"), Object::name("Crypt")]),
        );
        assert!(has_crypt_filter(&in_array));

        let mut other = Dictionary::new();
        other.set("Filter", Object::name("FlateDecode"));
        assert!(!has_crypt_filter(&other));

        assert!(!has_crypt_filter(&Dictionary::new()));
    }
}
