use std::fmt;

/// Identifier of an indirect object: object number plus generation number.
///
/// Object number 0 is reserved for the head of the free list and never
/// identifies a live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    number: u32,
    generation: u16,
}

impl ObjectRef {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// References with object number 0 mark free slots.
    pub fn is_valid(&self) -> bool {
        self.number != 0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}
