//! Standard security handler (RC4 revisions 2 and 3).
//!
//! The encryptor is stateless with respect to the object being processed:
//! every operation takes the target [`ObjectRef`] explicitly and derives
//! the per-object key from it, so there is no "current object" to forget
//! to set.

mod rc4;

pub use rc4::{rc4_apply, Rc4};

use crate::error::{PdfError, Result};
use crate::object::{Dictionary, Object, ObjectRef, PdfString};

/// Password padding from the standard security handler algorithms.
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// Security handler revision in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// Revision 2: RC4 with a 40-bit file key.
    R2,
    /// Revision 3: RC4 with up to a 128-bit file key.
    R3,
}

impl Revision {
    fn number(self) -> i64 {
        match self {
            Revision::R2 => 2,
            Revision::R3 => 3,
        }
    }

    fn version(self) -> i64 {
        match self {
            Revision::R2 => 1,
            Revision::R3 => 2,
        }
    }
}

/// Per-object RC4 encryption keyed off a document file key.
#[derive(Debug, Clone)]
pub struct Encryptor {
    revision: Revision,
    key_length: usize,
    file_key: Vec<u8>,
    owner_hash: Vec<u8>,
    user_hash: Vec<u8>,
    permissions: i32,
    file_id: Vec<u8>,
}

impl Encryptor {
    /// Build an encryptor for a new document, RC4 40-bit (revision 2).
    pub fn rc4_40bit(
        user_password: &str,
        owner_password: &str,
        permissions: i32,
        file_id: &[u8],
    ) -> Self {
        Self::for_new_document(Revision::R2, 5, user_password, owner_password, permissions, file_id)
    }

    /// Build an encryptor for a new document, RC4 128-bit (revision 3).
    pub fn rc4_128bit(
        user_password: &str,
        owner_password: &str,
        permissions: i32,
        file_id: &[u8],
    ) -> Self {
        Self::for_new_document(
            Revision::R3,
            16,
            user_password,
            owner_password,
            permissions,
            file_id,
        )
    }

    fn for_new_document(
        revision: Revision,
        key_length: usize,
        user_password: &str,
        owner_password: &str,
        permissions: i32,
        file_id: &[u8],
    ) -> Self {
        let owner_hash = compute_owner_hash(revision, key_length, owner_password, user_password);
        let file_key = compute_file_key(
            revision,
            key_length,
            user_password,
            &owner_hash,
            permissions,
            file_id,
        );
        let user_hash = compute_user_hash(revision, &file_key, file_id);
        Self {
            revision,
            key_length,
            file_key,
            owner_hash,
            user_hash,
            permissions,
            file_id: file_id.to_vec(),
        }
    }

    /// Rebuild an encryptor from an existing encryption dictionary,
    /// authenticating with the user password.
    pub fn from_existing(
        dict: &Dictionary,
        file_id: &[u8],
        user_password: &str,
    ) -> Result<Self> {
        if dict.get_name("Filter") != Some("Standard") {
            return Err(PdfError::Encryption(
                "unsupported security handler".to_string(),
            ));
        }
        let revision = match dict.get_integer("R") {
            Some(2) => Revision::R2,
            Some(3) => Revision::R3,
            other => {
                return Err(PdfError::Encryption(format!(
                    "unsupported standard handler revision {other:?}"
                )))
            }
        };
        let key_length = match dict.get_integer("Length") {
            None => 5,
            Some(bits) if (40..=128).contains(&bits) && bits % 8 == 0 => (bits / 8) as usize,
            Some(bits) => {
                return Err(PdfError::Encryption(format!("invalid key length {bits}")))
            }
        };
        let owner_hash = dict
            .get("O")
            .and_then(|o| o.try_get_string())
            .ok_or_else(|| PdfError::Encryption("missing /O entry".to_string()))?
            .as_bytes()
            .to_vec();
        let user_hash = dict
            .get("U")
            .and_then(|o| o.try_get_string())
            .ok_or_else(|| PdfError::Encryption("missing /U entry".to_string()))?
            .as_bytes()
            .to_vec();
        let permissions = dict
            .get("P")
            .and_then(|o| o.try_get_integer())
            .ok_or_else(|| PdfError::Encryption("missing /P entry".to_string()))?
            as i32;

        let file_key = compute_file_key(
            revision,
            key_length,
            user_password,
            &owner_hash,
            permissions,
            file_id,
        );
        let expected = compute_user_hash(revision, &file_key, file_id);
        let matches = match revision {
            Revision::R2 => expected == user_hash,
            // For revision 3 only the first 16 bytes are significant
            Revision::R3 => {
                user_hash.len() >= 16 && expected[..16] == user_hash[..16]
            }
        };
        if !matches {
            return Err(PdfError::Encryption("password does not match".to_string()));
        }
        Ok(Self {
            revision,
            key_length,
            file_key,
            owner_hash,
            user_hash,
            permissions,
            file_id: file_id.to_vec(),
        })
    }

    /// The document ID half the file key was derived from. The trailer
    /// `/ID` written alongside this handler must carry the same bytes.
    pub fn file_id(&self) -> &[u8] {
        &self.file_id
    }

    /// Derive the RC4 key for one object: MD5 of the file key, the low
    /// three bytes of the object number and the low two bytes of the
    /// generation, truncated to `min(key_length + 5, 16)`.
    fn object_key(&self, reference: ObjectRef) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.file_key.len() + 5);
        data.extend_from_slice(&self.file_key);
        data.extend_from_slice(&reference.number().to_le_bytes()[..3]);
        data.extend_from_slice(&reference.generation().to_le_bytes()[..2]);
        let digest = md5::compute(&data);
        let len = (self.key_length + 5).min(16);
        digest[..len].to_vec()
    }

    /// Encrypt a string or stream payload belonging to `reference`.
    pub fn encrypt(&self, reference: ObjectRef, data: &[u8]) -> Vec<u8> {
        rc4_apply(&self.object_key(reference), data)
    }

    /// Decrypt a string or stream payload belonging to `reference`.
    /// RC4 is symmetric, so this mirrors [`Encryptor::encrypt`].
    pub fn decrypt(&self, reference: ObjectRef, data: &[u8]) -> Vec<u8> {
        self.encrypt(reference, data)
    }

    /// The encryption dictionary the writer emits for this handler.
    pub fn encryption_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("Standard"));
        dict.set("V", Object::integer(self.revision.version()));
        dict.set("R", Object::integer(self.revision.number()));
        if self.revision == Revision::R3 {
            dict.set("Length", Object::integer((self.key_length * 8) as i64));
        }
        dict.set("O", Object::string(PdfString::new(self.owner_hash.clone())));
        dict.set("U", Object::string(PdfString::new(self.user_hash.clone())));
        dict.set("P", Object::integer(self.permissions as i64));
        dict
    }
}

fn pad_password(password: &str) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let bytes = password.as_bytes();
    let len = bytes.len().min(32);
    padded[..len].copy_from_slice(&bytes[..len]);
    padded[len..].copy_from_slice(&PAD[..32 - len]);
    padded
}

/// Algorithm 3: the /O entry.
fn compute_owner_hash(
    revision: Revision,
    key_length: usize,
    owner_password: &str,
    user_password: &str,
) -> Vec<u8> {
    let mut hash = md5::compute(pad_password(owner_password)).to_vec();
    if revision == Revision::R3 {
        for _ in 0..50 {
            hash = md5::compute(&hash).to_vec();
        }
    }
    let mut result = rc4_apply(&hash[..key_length], &pad_password(user_password));
    if revision == Revision::R3 {
        for i in 1..=19u8 {
            let key: Vec<u8> = hash[..key_length].iter().map(|b| b ^ i).collect();
            result = rc4_apply(&key, &result);
        }
    }
    result
}

/// Algorithm 2: the file encryption key.
fn compute_file_key(
    revision: Revision,
    key_length: usize,
    user_password: &str,
    owner_hash: &[u8],
    permissions: i32,
    file_id: &[u8],
) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&pad_password(user_password));
    data.extend_from_slice(owner_hash);
    data.extend_from_slice(&permissions.to_le_bytes());
    data.extend_from_slice(file_id);

    let mut hash = md5::compute(&data).to_vec();
    if revision == Revision::R3 {
        for _ in 0..50 {
            hash = md5::compute(&hash[..key_length]).to_vec();
        }
    }
    hash.truncate(key_length);
    hash
}

/// Algorithms 4 and 5: the /U entry.
fn compute_user_hash(revision: Revision, file_key: &[u8], file_id: &[u8]) -> Vec<u8> {
    match revision {
        Revision::R2 => rc4_apply(file_key, &PAD),
        Revision::R3 => {
            let mut data = Vec::new();
            data.extend_from_slice(&PAD);
            data.extend_from_slice(file_id);
            let hash = md5::compute(&data);
            let mut result = rc4_apply(file_key, hash.as_ref());
            for i in 1..=19u8 {
                let key: Vec<u8> = file_key.iter().map(|b| b ^ i).collect();
                result = rc4_apply(&key, &result);
            }
            result.resize(32, 0);
            result
        }
    }
}
