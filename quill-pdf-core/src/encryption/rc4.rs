//! RC4 stream cipher, the symmetric primitive behind revision 2/3
//! standard security.

/// RC4 cipher state.
pub struct Rc4 {
    s: [u8; 256],
    i: usize,
    j: usize,
}

impl Rc4 {
    /// Key-schedule a new cipher. Keys are 1 to 256 bytes.
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty());
        let mut s = [0u8; 256];
        for (i, byte) in s.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let mut j = 0usize;
        for i in 0..256 {
            j = (j + s[i] as usize + key[i % key.len()] as usize) % 256;
            s.swap(i, j);
        }
        Self { s, i: 0, j: 0 }
    }

    /// Apply the keystream. Encryption and decryption are the same
    /// operation.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len());
        for &byte in data {
            self.i = (self.i + 1) % 256;
            self.j = (self.j + self.s[self.i] as usize) % 256;
            self.s.swap(self.i, self.j);
            let k = self.s[(self.s[self.i] as usize + self.s[self.j] as usize) % 256];
            output.push(byte ^ k);
        }
        output
    }
}

/// One-shot RC4 pass with a fresh key schedule.
pub fn rc4_apply(key: &[u8], data: &[u8]) -> Vec<u8> {
    Rc4::new(key).process(data)
}
