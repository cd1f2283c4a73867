use crate::object::{Object, Value};
use indexmap::IndexMap;

/// A PDF dictionary: name keys mapped to inline child objects.
///
/// Keys keep insertion order so that serializing the same dictionary twice
/// produces identical bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: IndexMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Object)> {
        self.entries.iter_mut()
    }

    /// Shorthand for a nested dictionary value under `key`.
    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(|obj| obj.value().as_dict())
    }

    /// Shorthand for a name value under `key`.
    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|obj| obj.value().as_name())
    }

    /// Shorthand for a strict integer value under `key`.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|obj| obj.value().as_integer())
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::new(Value::Dictionary(d))
    }
}
