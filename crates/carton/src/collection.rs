use crate::driver::QueryResult;
use crate::schema::Schema;
use crate::{Error, Result};

use std::any::Any;

/// A list of built records paired with the query result that produced them.
///
/// When built from a row-returning result the record count equals the row
/// count; the single-record constructor used by the insert shortcut is the
/// one exception.
#[derive(Debug)]
pub struct SchemaCollection<R> {
    schemas: Vec<R>,
    result: QueryResult,
}

impl<R> SchemaCollection<R> {
    pub fn new(schemas: Vec<R>, result: QueryResult) -> Self {
        Self { schemas, result }
    }

    /// The insert shortcut: one pre-built record paired with the insert
    /// result.
    pub fn single(schema: R, result: QueryResult) -> Self {
        Self {
            schemas: vec![schema],
            result,
        }
    }

    pub fn schemas(&self) -> &[R] {
        &self.schemas
    }

    pub(crate) fn schemas_mut(&mut self) -> &mut [R] {
        &mut self.schemas
    }

    pub fn result(&self) -> &QueryResult {
        &self.result
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.schemas.iter()
    }

    pub fn into_parts(self) -> (Vec<R>, QueryResult) {
        (self.schemas, self.result)
    }
}

impl<R> IntoIterator for SchemaCollection<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.schemas.into_iter()
    }
}

/// A type-erased record, as exchanged across the directory registry.
///
/// The mapping layer routes nested records between sibling directories
/// without knowing their concrete types; the owning foreign field downcasts
/// back to the concrete record.
#[derive(Debug)]
pub struct AnyRecord {
    table: &'static str,
    inner: Box<dyn Any + Send>,
}

impl AnyRecord {
    pub fn new<R: Schema>(record: R) -> Self {
        Self {
            table: R::TABLE,
            inner: Box::new(record),
        }
    }

    /// The table the record belongs to.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Recovers the concrete record type.
    pub fn downcast<R: Schema>(self) -> Result<R> {
        let table = self.table;
        self.inner.downcast::<R>().map(|b| *b).map_err(|_| {
            Error::configuration(format!(
                "record for table `{table}` is not of the requested type",
            ))
        })
    }
}

/// A type-erased [`SchemaCollection`], produced at the repository's result
/// chokepoint.
#[derive(Debug)]
pub struct AnyCollection {
    table: &'static str,
    len: usize,
    inner: Box<dyn Any + Send>,
}

impl AnyCollection {
    pub fn new<R: Schema>(collection: SchemaCollection<R>) -> Self {
        Self {
            table: R::TABLE,
            len: collection.len(),
            inner: Box::new(collection),
        }
    }

    /// The table the collection's records belong to.
    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recovers the typed collection.
    pub fn into_typed<R: Schema>(self) -> Result<SchemaCollection<R>> {
        let table = self.table;
        self.inner
            .downcast::<SchemaCollection<R>>()
            .map(|b| *b)
            .map_err(|_| {
                Error::configuration(format!(
                    "collection for table `{table}` is not of the requested type",
                ))
            })
    }
}
