mod descriptor;
pub use descriptor::FieldDescriptor;

mod field;
pub use field::{Field, ForeignField, FromValue, IntoValue};

use crate::column::{ColumnDefinition, FetchMode};
use crate::driver::QueryResult;
use crate::preload::Preload;
use crate::repository::Repository;
use crate::stmt::{Row, Value};
use crate::{async_trait, Error, Result};

/// The record contract: one implementation per mapped table.
///
/// Implementations are usually generated by the [`schema!`](crate::schema!)
/// macro. The trait carries only declarations: the table name, the column
/// definitions, the field accessor table, an empty constructor, and an
/// optional validation hook. All behavior lives in [`SchemaExt`], which is
/// implemented for every record type.
pub trait Schema: Clone + Send + Sync + Sized + 'static {
    /// The database table this record maps.
    const TABLE: &'static str;

    /// The ordered column definitions for the table.
    fn definition() -> Vec<ColumnDefinition>;

    /// The accessor table pairing field names with their readers and
    /// writers.
    fn fields() -> Vec<FieldDescriptor<Self>>;

    /// A record with every field unset.
    fn empty() -> Self;

    /// Hook invoked after a record is materialized from a row and after
    /// preload resolution. The default accepts everything.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Whether a record still has pending lazy foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// At least one lazy foreign key holds an unresolved, non-null key.
    Unresolved,

    /// Nothing left to resolve.
    Resolved,
}

/// Record operations: materialization, serialization, foreign-key
/// resolution, and the mutation entry points that delegate to the table's
/// registered directory.
#[async_trait]
pub trait SchemaExt: Schema {
    /// Materializes a record from a result row.
    ///
    /// Columns absent from the row are left unset rather than defaulted to
    /// null, which is what allows partial population from joined queries.
    /// The table must have a registered directory (registration is what
    /// builds the mapping).
    fn build(repository: &Repository, row: &Row) -> Result<Self> {
        let mapping = repository.mapping(Self::TABLE)?;
        let descriptors = Self::fields();
        let mut record = Self::empty();

        for (column, field) in mapping.column_field_pairs() {
            let Some(value) = row.get(column) else {
                continue;
            };
            let descriptor = find_descriptor(&descriptors, field)?;
            descriptor.set(&mut record, value.clone())?;
        }

        record.validate()?;
        Ok(record)
    }

    /// All currently-set fields, keyed by column name.
    fn to_row(&self) -> Row {
        let descriptors = Self::fields();
        let mut row = Row::new();

        for column in Self::definition() {
            let field = column.field_name();
            let Some(descriptor) = descriptors.iter().find(|d| d.field() == field) else {
                continue;
            };
            if let Some(value) = descriptor.get(self) {
                row.insert(column.name().to_owned(), value);
            }
        }

        row
    }

    /// The identifier column, if the definition declares one: the first
    /// primary, non-composite column.
    fn identifier_column() -> Option<String> {
        Self::definition()
            .into_iter()
            .find(|c| c.is_primary() && !c.is_composite())
            .map(|c| c.name().to_owned())
    }

    /// The cached preload list for this table.
    fn preloads(repository: &Repository) -> Result<Vec<Preload>> {
        Ok(repository.mapping(Self::TABLE)?.preloads().to_vec())
    }

    /// Resolves the eager foreign keys of one record from a joined,
    /// single-row result.
    ///
    /// For each preload, the matching foreign table's columns are sliced
    /// out of the joined row, a nested record is built through the sibling
    /// directory, and the local foreign field is upgraded to its loaded
    /// state. Fails with a configuration error when a preload references a
    /// local column with no mapped field.
    fn after_preload_hook(
        &mut self,
        repository: &Repository,
        result: &QueryResult,
        preloads: &[Preload],
    ) -> Result<()> {
        let mapping = repository.mapping(Self::TABLE)?;
        let descriptors = Self::fields();

        let Some(row) = result.buffered_rows().and_then(<[Row]>::first) else {
            return Ok(());
        };

        for preload in preloads {
            let field = mapping
                .field_for_column(preload.local_column())
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "preload references unknown local key `{}` on table `{}`",
                        preload.local_column(),
                        Self::TABLE,
                    ))
                })?;
            let descriptor = find_descriptor(&descriptors, field)?;

            // The join must actually carry the foreign key column.
            let joined = result
                .fields
                .iter()
                .any(|f| f.table == preload.foreign_table() && f.column == preload.foreign_key());
            if !joined {
                continue;
            }

            // A null key means the left join found no foreign row; the
            // field stays unresolved.
            let key = descriptor.get(self).unwrap_or(Value::Null);
            if key.is_null() {
                continue;
            }

            let mut sliced = Row::new();
            for field_def in result.fields_of_table(preload.foreign_table()) {
                if let Some(value) = row.get(&field_def.column) {
                    sliced.insert(field_def.column.clone(), value.clone());
                }
            }

            let directory = repository.get_directory(preload.foreign_table())?;
            let nested = directory.build_record(repository, &sliced)?;
            descriptor.set_loaded(self, key, nested)?;
        }

        Ok(())
    }

    /// Whether this record still has unresolved lazy foreign keys.
    fn resolution_state(&self) -> ResolutionState {
        let descriptors = Self::fields();
        for column in Self::definition() {
            let Some((descriptor, _)) = lazy_descriptor(&descriptors, &column) else {
                continue;
            };
            if descriptor.is_loaded(self) {
                continue;
            }
            if matches!(descriptor.get(self), Some(key) if !key.is_null()) {
                return ResolutionState::Unresolved;
            }
        }
        ResolutionState::Resolved
    }

    /// Resolves all pending lazy foreign keys, one fetch per key.
    ///
    /// The original record is never mutated; each resolution step clones
    /// the record and upgrades the field on the clone. Returns `Ok(None)`
    /// when there was nothing to resolve. Callers must use the returned
    /// record, not the original.
    async fn resolve_foreign_targets(&self, repository: &Repository) -> Result<Option<Self>> {
        let descriptors = Self::fields();
        let mut resolved: Option<Self> = None;

        for column in Self::definition() {
            let Some((descriptor, foreign)) = lazy_descriptor(&descriptors, &column) else {
                continue;
            };

            let current = resolved.as_ref().unwrap_or(self);
            if descriptor.is_loaded(current) {
                continue;
            }
            let Some(key) = descriptor.get(current) else {
                continue;
            };
            if key.is_null() {
                continue;
            }

            let directory = repository.get_directory(foreign.table())?;
            let fetched = directory
                .fetch_record(repository, foreign.key(), key.clone())
                .await?;

            let mut next = current.clone();
            if let Some(nested) = fetched {
                descriptor.set_loaded(&mut next, key, nested)?;
            }
            resolved = Some(next);
        }

        Ok(resolved)
    }

    /// Inserts this record through the table's directory, then reconciles
    /// the record with the stored row so server-assigned values (such as an
    /// auto-increment identifier) become visible without losing identity.
    async fn insert(&mut self, repository: &Repository) -> Result<()> {
        let directory = repository.get_directory(Self::TABLE)?;
        let data = self.to_row();

        let collection = directory.insert_row(repository, data).await?;
        let collection = collection.into_typed::<Self>()?;
        let fresh = collection
            .schemas()
            .first()
            .ok_or_else(|| Error::invalid_result("insert produced no record"))?;
        reconcile(self, fresh)
    }

    /// Applies the given changes to this record's row, keyed by the
    /// identifier column, then reconciles with the re-fetched row state.
    async fn update(&mut self, repository: &Repository, data: Row) -> Result<()> {
        let (identifier, value) = identifier_value::<Self>(repository, self)?;
        let directory = repository.get_directory(Self::TABLE)?;

        let collection = directory
            .update_rows(repository, data, &identifier, value)
            .await?;
        let collection = collection.into_typed::<Self>()?;
        let fresh = collection
            .schemas()
            .first()
            .ok_or_else(|| Error::invalid_result("update re-fetch returned no rows"))?;
        reconcile(self, fresh)
    }

    /// Deletes this record's row, keyed by the identifier column. Returns
    /// the raw driver result.
    async fn delete(&self, repository: &Repository) -> Result<QueryResult> {
        let (identifier, value) = identifier_value::<Self>(repository, self)?;
        let directory = repository.get_directory(Self::TABLE)?;
        directory
            .delete_rows(repository, &identifier, value)
            .await
    }
}

impl<R: Schema> SchemaExt for R {}

fn find_descriptor<'a, R>(
    descriptors: &'a [FieldDescriptor<R>],
    field: &str,
) -> Result<&'a FieldDescriptor<R>> {
    descriptors
        .iter()
        .find(|d| d.field() == field)
        .ok_or_else(|| Error::configuration(format!("no accessor declared for field `{field}`")))
}

/// The descriptor and target for a lazy foreign-key column, if the column
/// is one.
fn lazy_descriptor<'a, 'c, R: Schema>(
    descriptors: &'a [FieldDescriptor<R>],
    column: &'c ColumnDefinition,
) -> Option<(&'a FieldDescriptor<R>, &'c crate::column::ForeignTarget)> {
    let foreign = column.foreign()?;
    if foreign.fetch() != FetchMode::Lazy {
        return None;
    }
    descriptors
        .iter()
        .find(|d| d.field() == column.field_name() && d.is_foreign())
        .map(|d| (d, foreign))
}

/// Copies every set field of `fresh` onto `target`.
fn reconcile<R: Schema>(target: &mut R, fresh: &R) -> Result<()> {
    for descriptor in R::fields() {
        if let Some(value) = descriptor.get(fresh) {
            descriptor.set(target, value)?;
        }
    }
    Ok(())
}

/// The identifier column and this record's current value for it.
///
/// Fails with a no-identifier error when the schema declares no identifier
/// column, and with a configuration error when the record's identifier
/// field is unset or null.
fn identifier_value<R: Schema>(repository: &Repository, record: &R) -> Result<(String, Value)> {
    let mapping = repository.mapping(R::TABLE)?;
    let identifier = mapping
        .identifier()
        .ok_or_else(|| Error::no_identifier(R::TABLE))?;
    let field = mapping
        .field_for_column(identifier)
        .ok_or_else(|| Error::no_identifier(R::TABLE))?;

    let descriptors = R::fields();
    let descriptor = find_descriptor(&descriptors, field)?;
    let value = descriptor
        .get(record)
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            Error::configuration(format!(
                "identifier `{}` is not set on this `{}` record",
                identifier,
                R::TABLE,
            ))
        })?;

    Ok((identifier.to_owned(), value))
}
