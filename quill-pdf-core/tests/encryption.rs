//! Writing and reading encrypted documents with the standard security
//! handler.

use quill_pdf::{
    Dictionary, Document, DocumentWriter, Encryptor, Object, ObjectRef, ObjectStore, PdfError,
};
use std::io::Cursor;

const FILE_ID: &[u8] = b"0123456789abcdef";

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A document with one string object and one stream object, encrypted
/// with the given handler.
fn encrypted_document(encryptor: Encryptor) -> (Vec<u8>, ObjectRef, ObjectRef) {
    let mut store: ObjectStore<Cursor<Vec<u8>>> = ObjectStore::new();
    let string_ref = store.insert(Object::string("confidential payload"));
    let mut holder = Object::null();
    holder
        .get_or_create_stream()
        .unwrap()
        .set_raw_data(b"stream secret".to_vec());
    let stream_ref = store.insert(holder);
    store.set_encryptor(encryptor, None);

    let mut writer = DocumentWriter::new(Vec::new());
    writer
        .write_document(&mut store, &Dictionary::new())
        .unwrap();
    (writer.into_inner(), string_ref, stream_ref)
}

#[test]
fn plaintext_never_reaches_the_file() {
    let (bytes, _, _) =
        encrypted_document(Encryptor::rc4_128bit("user123", "owner456", -4, FILE_ID));
    assert!(!contains(&bytes, b"confidential payload"));
    assert!(!contains(&bytes, b"stream secret"));
    // The handler parameters do, in the clear
    assert!(contains(&bytes, b"/Filter /Standard"));
    assert!(contains(&bytes, b"/R 3"));
}

#[test]
fn roundtrip_with_user_password() {
    let (bytes, string_ref, stream_ref) =
        encrypted_document(Encryptor::rc4_128bit("user123", "owner456", -4, FILE_ID));

    let mut doc = Document::load_with_password(Cursor::new(bytes), "user123").unwrap();
    assert!(doc.is_encrypted());

    let object = doc.store_mut().get(string_ref).unwrap().unwrap();
    assert_eq!(
        object.try_get_string().unwrap().as_bytes(),
        b"confidential payload"
    );
    let object = doc.store_mut().get(stream_ref).unwrap().unwrap();
    assert_eq!(object.get_stream().unwrap().data(), b"stream secret");
}

#[test]
fn roundtrip_40bit_revision_two() {
    let (bytes, string_ref, _) =
        encrypted_document(Encryptor::rc4_40bit("pw", "pw", -4, FILE_ID));

    let mut doc = Document::load_with_password(Cursor::new(bytes), "pw").unwrap();
    let object = doc.store_mut().get(string_ref).unwrap().unwrap();
    assert_eq!(
        object.try_get_string().unwrap().as_bytes(),
        b"confidential payload"
    );
}

#[test]
fn wrong_password_is_rejected() {
    let (bytes, _, _) =
        encrypted_document(Encryptor::rc4_128bit("user123", "owner456", -4, FILE_ID));
    let err = Document::load_with_password(Cursor::new(bytes.clone()), "nope").unwrap_err();
    assert!(matches!(err, PdfError::Encryption(_)));

    // The plain load tries the empty password, which also fails here
    let err = Document::load(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, PdfError::Encryption(_)));
}

#[test]
fn empty_user_password_opens_without_prompting() {
    let (bytes, string_ref, _) =
        encrypted_document(Encryptor::rc4_128bit("", "owner456", -4, FILE_ID));
    let mut doc = Document::load(Cursor::new(bytes)).unwrap();
    let object = doc.store_mut().get(string_ref).unwrap().unwrap();
    assert_eq!(
        object.try_get_string().unwrap().as_bytes(),
        b"confidential payload"
    );
}

#[test]
fn encrypted_update_keeps_working() {
    let (base, string_ref, _) =
        encrypted_document(Encryptor::rc4_128bit("user123", "owner456", -4, FILE_ID));

    let mut doc = Document::load_with_password(Cursor::new(base.clone()), "user123").unwrap();
    let added = doc.store_mut().insert(Object::string("second secret"));
    let trailer = doc.trailer().clone();
    let (prev, length) = (doc.startxref(), doc.length());
    let mut writer = DocumentWriter::new(Vec::new());
    writer
        .write_update(doc.store_mut(), &trailer, prev, length)
        .unwrap();
    let appended = writer.into_inner();
    assert!(!contains(&appended, b"second secret"));

    let mut full = base;
    full.extend_from_slice(&appended);
    let mut doc2 = Document::load_with_password(Cursor::new(full), "user123").unwrap();
    let object = doc2.store_mut().get(added).unwrap().unwrap();
    assert_eq!(object.try_get_string().unwrap().as_bytes(), b"second secret");
    let object = doc2.store_mut().get(string_ref).unwrap().unwrap();
    assert_eq!(
        object.try_get_string().unwrap().as_bytes(),
        b"confidential payload"
    );
}
