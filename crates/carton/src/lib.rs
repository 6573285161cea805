pub mod column;
pub use column::{ColumnDefinition, ColumnDefinitionBuilder, ColumnType, FetchMode, ForeignTarget};

pub mod collection;
pub use collection::{AnyCollection, AnyRecord, SchemaCollection};

pub mod directory;
pub use directory::Directory;

mod macros;

pub mod mapping;
pub use mapping::TableMapping;

pub mod preload;
pub use preload::Preload;

pub mod repository;
pub use repository::{Builder, Executed, Repository};

pub mod schema;
pub use schema::{Field, FieldDescriptor, ForeignField, ResolutionState, Schema, SchemaExt};

pub mod sql;
pub use sql::{ConflictResolution, InsertAllOptions, SqlDirectory};

pub mod statement;
pub use statement::Statement;

pub mod transaction;
pub use transaction::Transaction;

pub use carton_core::{async_trait, driver, stmt, Client, Error, Result};
