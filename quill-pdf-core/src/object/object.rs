use crate::error::{PdfError, Result};
use crate::object::{Dictionary, ObjectRef, PdfString, StreamData, Value};
use crate::parser::ParseSource;

/// Bookkeeping for two-stage delayed loading.
///
/// In-memory objects are born fully loaded; parser-backed objects start
/// with both flags down and a recorded [`ParseSource`]. A failed load keeps
/// its flag raised and caches the error so a second trigger replays the
/// identical failure instead of re-parsing permanently malformed input.
#[derive(Debug, Default)]
pub(crate) struct LoadState {
    pub(crate) header_loaded: bool,
    pub(crate) stream_loaded: bool,
    pub(crate) source: Option<ParseSource>,
    pub(crate) header_failure: Option<PdfError>,
    pub(crate) stream_failure: Option<PdfError>,
}

impl LoadState {
    fn loaded() -> Self {
        Self {
            header_loaded: true,
            stream_loaded: true,
            source: None,
            header_failure: None,
            stream_failure: None,
        }
    }

    fn unloaded(source: ParseSource) -> Self {
        Self {
            header_loaded: false,
            stream_loaded: false,
            source: Some(source),
            header_failure: None,
            stream_failure: None,
        }
    }
}

impl Clone for LoadState {
    fn clone(&self) -> Self {
        Self {
            header_loaded: self.header_loaded,
            stream_loaded: self.stream_loaded,
            source: self.source.clone(),
            header_failure: self.header_failure.as_ref().map(|e| e.replay()),
            stream_failure: self.stream_failure.as_ref().map(|e| e.replay()),
        }
    }
}

/// An identity-bearing PDF object: a [`Value`], an optional stream payload
/// and an optional indirect reference.
///
/// Objects held inline inside arrays or dictionaries have no reference of
/// their own; only objects registered in an
/// [`ObjectStore`](crate::store::ObjectStore) are indirect. Every mutating
/// accessor checks the immutable flag and marks the object dirty.
#[derive(Debug)]
pub struct Object {
    value: Value,
    stream: Option<StreamData>,
    reference: Option<ObjectRef>,
    dirty: bool,
    immutable: bool,
    pub(crate) load: LoadState,
}

impl Object {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            stream: None,
            reference: None,
            dirty: false,
            immutable: false,
            load: LoadState::loaded(),
        }
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(Value::Boolean(b))
    }

    pub fn integer(i: i64) -> Self {
        Self::new(Value::Integer(i))
    }

    pub fn real(r: f64) -> Self {
        Self::new(Value::Real(r))
    }

    pub fn string(s: impl Into<PdfString>) -> Self {
        Self::new(Value::String(s.into()))
    }

    pub fn name(n: impl Into<String>) -> Self {
        Self::new(Value::Name(n.into()))
    }

    pub fn reference(r: ObjectRef) -> Self {
        Self::new(Value::Reference(r))
    }

    pub fn array(items: Vec<Object>) -> Self {
        Self::new(Value::Array(items))
    }

    pub fn dictionary(dict: Dictionary) -> Self {
        Self::new(Value::Dictionary(dict))
    }

    /// A parser-backed object: no I/O happens here, both load stages stay
    /// pending until first access through the store.
    pub(crate) fn from_parse_source(source: ParseSource) -> Self {
        Self {
            value: Value::Null,
            stream: None,
            reference: None,
            dirty: false,
            immutable: false,
            load: LoadState::unloaded(source),
        }
    }

    /// The active value. Parser-backed objects must have completed header
    /// loading before their value is observable.
    pub fn value(&self) -> &Value {
        debug_assert!(
            self.load.header_loaded,
            "value accessed before delayed header load"
        );
        &self.value
    }

    /// Mutable access to the value; marks the object dirty.
    pub fn value_mut(&mut self) -> Result<&mut Value> {
        self.assert_mutable()?;
        self.dirty = true;
        Ok(&mut self.value)
    }

    // --- typed read accessors -------------------------------------------

    pub fn get_bool(&self) -> Result<bool> {
        self.value().as_bool().ok_or_else(|| self.wrong_type("boolean"))
    }

    pub fn try_get_bool(&self) -> Option<bool> {
        self.value().as_bool()
    }

    /// Strict integer access, failing on reals.
    pub fn get_integer(&self) -> Result<i64> {
        self.value()
            .as_integer()
            .ok_or_else(|| self.wrong_type("integer"))
    }

    pub fn try_get_integer(&self) -> Option<i64> {
        self.value().as_integer()
    }

    /// Lenient numeric access: accepts reals, truncating towards zero.
    pub fn get_number_lenient(&self) -> Result<i64> {
        self.value()
            .as_number_lenient()
            .ok_or_else(|| self.wrong_type("number"))
    }

    pub fn try_get_number_lenient(&self) -> Option<i64> {
        self.value().as_number_lenient()
    }

    /// Strict real access, failing on integers.
    pub fn get_real_strict(&self) -> Result<f64> {
        self.value()
            .as_real_strict()
            .ok_or_else(|| self.wrong_type("real"))
    }

    pub fn try_get_real_strict(&self) -> Option<f64> {
        self.value().as_real_strict()
    }

    /// Lenient real access: accepts integers, widening them.
    pub fn get_real_lenient(&self) -> Result<f64> {
        self.value()
            .as_real_lenient()
            .ok_or_else(|| self.wrong_type("number"))
    }

    pub fn try_get_real_lenient(&self) -> Option<f64> {
        self.value().as_real_lenient()
    }

    pub fn get_string(&self) -> Result<&PdfString> {
        self.value().as_string().ok_or_else(|| self.wrong_type("string"))
    }

    pub fn try_get_string(&self) -> Option<&PdfString> {
        self.value().as_string()
    }

    pub fn get_name(&self) -> Result<&str> {
        self.value().as_name().ok_or_else(|| self.wrong_type("name"))
    }

    pub fn try_get_name(&self) -> Option<&str> {
        self.value().as_name()
    }

    pub fn get_reference(&self) -> Result<ObjectRef> {
        self.value()
            .as_reference()
            .ok_or_else(|| self.wrong_type("reference"))
    }

    pub fn try_get_reference(&self) -> Option<ObjectRef> {
        self.value().as_reference()
    }

    pub fn get_array(&self) -> Result<&[Object]> {
        self.value().as_array().ok_or_else(|| self.wrong_type("array"))
    }

    pub fn get_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        let found = self.value.type_name();
        self.value_mut()?
            .as_array_mut()
            .ok_or(PdfError::WrongType {
                expected: "array",
                found,
            })
    }

    pub fn get_dictionary(&self) -> Result<&Dictionary> {
        self.value()
            .as_dict()
            .ok_or_else(|| self.wrong_type("dictionary"))
    }

    pub fn get_dictionary_mut(&mut self) -> Result<&mut Dictionary> {
        let found = self.value.type_name();
        self.value_mut()?.as_dict_mut().ok_or(PdfError::WrongType {
            expected: "dictionary",
            found,
        })
    }

    fn wrong_type(&self, expected: &'static str) -> PdfError {
        PdfError::WrongType {
            expected,
            found: self.value.type_name(),
        }
    }

    // --- mutators --------------------------------------------------------

    pub fn set_bool(&mut self, b: bool) -> Result<()> {
        self.set_value(Value::Boolean(b))
    }

    pub fn set_integer(&mut self, i: i64) -> Result<()> {
        self.set_value(Value::Integer(i))
    }

    pub fn set_real(&mut self, r: f64) -> Result<()> {
        self.set_value(Value::Real(r))
    }

    pub fn set_string(&mut self, s: impl Into<PdfString>) -> Result<()> {
        self.set_value(Value::String(s.into()))
    }

    pub fn set_name(&mut self, n: impl Into<String>) -> Result<()> {
        self.set_value(Value::Name(n.into()))
    }

    pub fn set_reference(&mut self, r: ObjectRef) -> Result<()> {
        self.set_value(Value::Reference(r))
    }

    /// Replace the whole value, marking the object dirty.
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        self.assert_mutable()?;
        self.value = value;
        self.dirty = true;
        Ok(())
    }

    /// Copy `other`'s value and stream into this object, keeping `other`'s
    /// dirty state instead of marking dirty. Used by document-level copy
    /// operations; the indirect reference is never transferred.
    pub(crate) fn assign(&mut self, other: &Object) {
        self.value = other.value.clone();
        self.stream = other.stream.clone();
        self.dirty = other.dirty;
    }

    /// Reset the value to null, drop the stream and clear the dirty flag.
    pub fn clear(&mut self) {
        self.value = Value::Null;
        self.stream = None;
        self.dirty = false;
    }

    // --- stream handling -------------------------------------------------

    /// The stream payload, or `InvalidOperation` if none is attached.
    ///
    /// Callers reaching a parser-backed object through the store have the
    /// stream materialized before this is reachable.
    pub fn get_stream(&self) -> Result<&StreamData> {
        self.stream.as_ref().ok_or_else(|| {
            PdfError::InvalidOperation("object has no stream".to_string())
        })
    }

    /// The existing stream, or a fresh empty one. A null value is coerced
    /// to an empty dictionary first; any other non-dictionary value is
    /// rejected, since only dictionary objects may carry streams.
    pub fn get_or_create_stream(&mut self) -> Result<&mut StreamData> {
        self.assert_mutable()?;
        match self.value {
            Value::Dictionary(_) => {}
            Value::Null => self.value = Value::Dictionary(Dictionary::new()),
            _ => {
                return Err(PdfError::InvalidOperation(format!(
                    "cannot attach a stream to a {} value",
                    self.value.type_name()
                )))
            }
        }
        self.dirty = true;
        Ok(self.stream.get_or_insert_with(StreamData::new))
    }

    /// Whether a stream is attached or still pending parse. Meaningful only
    /// once the header is loaded, which the store guarantees.
    pub fn has_stream(&self) -> bool {
        debug_assert!(
            self.load.header_loaded,
            "has_stream asked before delayed header load"
        );
        self.stream.is_some()
            || self
                .load
                .source
                .as_ref()
                .is_some_and(|s| s.has_stream && !self.load.stream_loaded)
    }

    pub(crate) fn stream(&self) -> Option<&StreamData> {
        self.stream.as_ref()
    }

    pub(crate) fn attach_stream(&mut self, stream: StreamData) {
        self.stream = Some(stream);
    }

    // --- identity and flags ----------------------------------------------

    /// The indirect reference, if this object is registered in a store.
    pub fn indirect_reference(&self) -> Option<ObjectRef> {
        self.reference
    }

    pub fn is_indirect(&self) -> bool {
        self.reference.is_some()
    }

    pub(crate) fn set_indirect_reference(&mut self, reference: Option<ObjectRef>) {
        self.reference = reference;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Lock the object against further mutation. Set by writers that have
    /// already streamed the dictionary; never cleared automatically.
    pub fn set_immutable(&mut self, immutable: bool) {
        self.immutable = immutable;
    }

    fn assert_mutable(&self) -> Result<()> {
        if self.immutable {
            Err(PdfError::Immutable)
        } else {
            Ok(())
        }
    }

    // --- delayed loading state -------------------------------------------

    pub fn is_header_loaded(&self) -> bool {
        self.load.header_loaded
    }

    pub fn is_stream_loaded(&self) -> bool {
        self.load.stream_loaded
    }

    /// Whether this object was materialized by the parser rather than
    /// constructed in memory.
    pub fn is_parser_backed(&self) -> bool {
        self.load.source.is_some()
    }

    pub(crate) fn set_parsed_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Release the memory of a parser-backed object so a later access
    /// re-parses it from its recorded offsets. A dirty object is only freed
    /// when forced; silently dropping unsaved changes would lose data.
    pub fn free_object_memory(&mut self, force: bool) {
        if self.load.source.is_none() {
            return;
        }
        if force || !self.dirty {
            self.clear();
            self.load.header_loaded = false;
            self.load.stream_loaded = false;
            self.load.header_failure = None;
            self.load.stream_failure = None;
        }
    }
}

impl Clone for Object {
    /// Deep copy of value and stream. The copy is unassigned: it carries no
    /// indirect reference and is always mutable and fully loaded.
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            stream: self.stream.clone(),
            reference: None,
            dirty: self.dirty,
            immutable: false,
            load: LoadState::loaded(),
        }
    }
}

impl PartialEq for Object {
    /// Indirect reference first, then value and stream.
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
            && self.value == other.value
            && self.stream == other.stream
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        Object::new(value)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::integer(i)
    }
}

impl From<f64> for Object {
    fn from(r: f64) -> Self {
        Object::real(r)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::reference(r)
    }
}

impl From<PdfString> for Object {
    fn from(s: PdfString) -> Self {
        Object::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_mark_dirty() {
        let mut obj = Object::null();
        assert!(!obj.is_dirty());
        obj.set_integer(7).unwrap();
        assert!(obj.is_dirty());
        assert_eq!(obj.get_integer().unwrap(), 7);
    }

    #[test]
    fn test_immutable_rejects_mutation() {
        let mut obj = Object::integer(3);
        obj.set_immutable(true);

        let err = obj.set_integer(4).unwrap_err();
        assert!(matches!(err, PdfError::Immutable));
        // State unchanged
        assert_eq!(obj.get_integer().unwrap(), 3);
        assert!(!obj.is_dirty());

        assert!(matches!(
            obj.get_or_create_stream().unwrap_err(),
            PdfError::Immutable
        ));
    }

    #[test]
    fn test_wrong_type_error() {
        let obj = Object::name("Catalog");
        match obj.get_integer().unwrap_err() {
            PdfError::WrongType { expected, found } => {
                assert_eq!(expected, "integer");
                assert_eq!(found, "name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(obj.try_get_integer(), None);
    }

    #[test]
    fn test_strict_and_lenient_accessors() {
        let real = Object::real(2.5);
        assert!(real.get_integer().is_err());
        assert_eq!(real.get_number_lenient().unwrap(), 2);
        assert_eq!(real.get_real_strict().unwrap(), 2.5);

        let int = Object::integer(2);
        assert!(int.get_real_strict().is_err());
        assert_eq!(int.get_real_lenient().unwrap(), 2.0);
    }

    #[test]
    fn test_get_or_create_stream_coerces_null() {
        let mut obj = Object::null();
        obj.get_or_create_stream().unwrap().append(b"data");
        assert!(obj.value().as_dict().is_some());
        assert!(obj.has_stream());
        assert_eq!(obj.get_stream().unwrap().data(), b"data");
    }

    #[test]
    fn test_get_or_create_stream_rejects_scalars() {
        let mut obj = Object::integer(5);
        assert!(matches!(
            obj.get_or_create_stream().unwrap_err(),
            PdfError::InvalidOperation(_)
        ));
    }

    #[test]
    fn test_get_stream_without_stream_fails() {
        let obj = Object::dictionary(Dictionary::new());
        assert!(matches!(
            obj.get_stream().unwrap_err(),
            PdfError::InvalidOperation(_)
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut obj = Object::null();
        obj.get_or_create_stream().unwrap().append(b"xyz");
        assert!(obj.is_dirty());

        obj.clear();
        assert!(obj.value().is_null());
        assert!(!obj.has_stream());
        assert!(!obj.is_dirty());
    }

    #[test]
    fn test_clone_is_unassigned() {
        let mut original = Object::integer(1);
        original.set_indirect_reference(Some(ObjectRef::new(9, 0)));
        original.set_immutable(true);

        let copy = original.clone();
        assert!(!copy.is_indirect());
        assert!(!copy.is_immutable());
        assert_eq!(copy.try_get_integer(), Some(1));
    }

    #[test]
    fn test_assign_preserves_source_dirty_state() {
        let mut clean = Object::integer(1);
        clean.reset_dirty();
        let mut target = Object::null();
        target.set_dirty();
        target.assign(&clean);
        assert!(!target.is_dirty());

        let mut dirty = Object::integer(2);
        dirty.set_dirty();
        let mut target = Object::null();
        target.assign(&dirty);
        assert!(target.is_dirty());
    }

    #[test]
    fn test_in_memory_objects_are_fully_loaded() {
        let obj = Object::integer(5);
        assert!(obj.is_header_loaded());
        assert!(obj.is_stream_loaded());
        assert!(!obj.is_parser_backed());
    }

    #[test]
    fn test_free_object_memory_is_noop_for_in_memory_objects() {
        let mut obj = Object::integer(5);
        obj.free_object_memory(true);
        assert_eq!(obj.try_get_integer(), Some(5));
    }
}
