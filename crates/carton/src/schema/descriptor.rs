use crate::collection::AnyRecord;
use crate::stmt::Value;
use crate::Result;

type Get<R> = fn(&R) -> Option<Value>;
type Set<R> = fn(&mut R, Value) -> Result<()>;
type SetLoaded<R> = fn(&mut R, Value, AnyRecord) -> Result<()>;
type IsLoaded<R> = fn(&R) -> bool;

/// One entry of a record type's accessor table: the field name plus the
/// function pointers that read and write it.
///
/// This table is the explicit replacement for assigning row values to
/// runtime-named properties: the mapping pairs each column with one of
/// these descriptors when the table is registered, and every later row
/// materialization is a plain lookup.
pub struct FieldDescriptor<R> {
    field: &'static str,
    foreign: bool,
    get: Get<R>,
    set: Set<R>,
    set_loaded: Option<SetLoaded<R>>,
    is_loaded: Option<IsLoaded<R>>,
}

impl<R> FieldDescriptor<R> {
    /// Descriptor for a scalar field.
    pub fn scalar(field: &'static str, get: Get<R>, set: Set<R>) -> Self {
        Self {
            field,
            foreign: false,
            get,
            set,
            set_loaded: None,
            is_loaded: None,
        }
    }

    /// Descriptor for a foreign-key field.
    pub fn foreign(
        field: &'static str,
        get: Get<R>,
        set: Set<R>,
        set_loaded: SetLoaded<R>,
        is_loaded: IsLoaded<R>,
    ) -> Self {
        Self {
            field,
            foreign: true,
            get,
            set,
            set_loaded: Some(set_loaded),
            is_loaded: Some(is_loaded),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn is_foreign(&self) -> bool {
        self.foreign
    }

    /// The field's current value, `None` when unset.
    pub fn get(&self, record: &R) -> Option<Value> {
        (self.get)(record)
    }

    /// Assigns a raw row value to the field.
    pub fn set(&self, record: &mut R, value: Value) -> Result<()> {
        (self.set)(record, value)
    }

    /// Stores a resolved nested record into a foreign field. No-op accessor
    /// for scalar fields does not exist; callers must check
    /// [`is_foreign`](Self::is_foreign) first.
    pub fn set_loaded(&self, record: &mut R, key: Value, nested: AnyRecord) -> Result<()> {
        match self.set_loaded {
            Some(set_loaded) => set_loaded(record, key, nested),
            None => Err(crate::Error::configuration(format!(
                "field `{}` is not a foreign key",
                self.field,
            ))),
        }
    }

    /// True when a foreign field holds its resolved record.
    pub fn is_loaded(&self, record: &R) -> bool {
        match self.is_loaded {
            Some(is_loaded) => is_loaded(record),
            None => false,
        }
    }
}

impl<R> std::fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field", &self.field)
            .field("foreign", &self.foreign)
            .finish_non_exhaustive()
    }
}
