/// The byte payload attached to a dictionary object.
///
/// The buffer holds whatever form the bytes currently take: for a freshly
/// parsed object that is the exact encoded bytes read from the source
/// (after decryption, if any). Filter metadata lives in the owning object's
/// dictionary, not here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamData {
    data: Vec<u8>,
}

impl StreamData {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the buffer with raw bytes read from a source.
    pub fn set_raw_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
