use crate::collection::AnyCollection;
use crate::directory::Directory;
use crate::driver::{IsolationLevel, QueryResult};
use crate::mapping::TableMapping;
use crate::schema::Schema;
use crate::statement::Statement;
use crate::stmt::Value;
use crate::transaction::Transaction;
use crate::{Client, Error, Result, SchemaCollection};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The outcome of routing a query result through the repository: either the
/// raw driver result, or a schema collection when a directory is registered
/// for the result's table.
#[derive(Debug)]
pub enum Executed {
    Raw(QueryResult),
    Collection(AnyCollection),
}

impl Executed {
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// The raw result; fails when the result was schema-mapped.
    pub fn into_raw(self) -> Result<QueryResult> {
        match self {
            Self::Raw(result) => Ok(result),
            Self::Collection(collection) => Err(Error::invalid_result(format!(
                "expected a raw result, got a collection for table `{}`",
                collection.table(),
            ))),
        }
    }

    /// The typed collection; fails when the result was not schema-mapped or
    /// belongs to a different record type.
    pub fn into_collection<R: Schema>(self) -> Result<SchemaCollection<R>> {
        match self {
            Self::Collection(collection) => collection.into_typed::<R>(),
            Self::Raw(_) => Err(Error::invalid_result(
                "expected a schema collection, got a raw result",
            )),
        }
    }
}

struct Registration {
    directory: Arc<dyn Directory>,
    mapping: Arc<TableMapping>,
}

/// The facade over the external client.
///
/// Owns the directory registry and the per-table mappings, and routes every
/// result through [`handle_query_result`](Repository::handle_query_result),
/// the single chokepoint that distinguishes a generic query from a
/// schema-mapped one.
pub struct Repository {
    client: Arc<dyn Client>,
    registry: RwLock<HashMap<String, Registration>>,
    default_isolation: IsolationLevel,
}

impl Repository {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self {
            client,
            registry: RwLock::new(HashMap::new()),
            default_isolation: IsolationLevel::default(),
        }
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    pub fn default_isolation(&self) -> IsolationLevel {
        self.default_isolation
    }

    /// Registers a directory for its table and eagerly builds the table
    /// mapping, so that malformed record types surface here rather than on
    /// first use.
    pub fn register_directory(&self, directory: Arc<dyn Directory>) -> Result<()> {
        let mapping = Arc::new(directory.build_mapping()?);
        let table = directory.table();

        let mut registry = self.registry.write().expect("registry lock poisoned");
        if registry.contains_key(table) {
            return Err(Error::already_registered(table));
        }

        tracing::debug!(table, "directory registered");
        registry.insert(table.to_owned(), Registration { directory, mapping });
        Ok(())
    }

    /// Removes the directory for `table`. Idempotent.
    pub fn unregister_directory(&self, table: &str) {
        let mut registry = self.registry.write().expect("registry lock poisoned");
        if registry.remove(table).is_some() {
            tracing::debug!(table, "directory unregistered");
        }
    }

    /// The directory registered for `table`.
    pub fn get_directory(&self, table: &str) -> Result<Arc<dyn Directory>> {
        let registry = self.registry.read().expect("registry lock poisoned");
        registry
            .get(table)
            .map(|r| r.directory.clone())
            .ok_or_else(|| Error::not_registered(table))
    }

    /// The mapping built when `table`'s directory was registered.
    pub fn mapping(&self, table: &str) -> Result<Arc<TableMapping>> {
        let registry = self.registry.read().expect("registry lock poisoned");
        registry
            .get(table)
            .map(|r| r.mapping.clone())
            .ok_or_else(|| Error::not_registered(table))
    }

    /// Executes a parameterized query and routes the result.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<Executed> {
        let result = self.client.execute(sql, params).await?;
        self.handle_query_result(result).await
    }

    /// Executes a parameterless query and routes the result.
    pub async fn query(&self, sql: &str) -> Result<Executed> {
        self.execute(sql, &[]).await
    }

    /// Routes a raw result: streaming results are buffered first; a
    /// non-empty buffered result whose first field definition names a
    /// registered table is replaced by a schema collection; everything else
    /// passes through unchanged.
    pub async fn handle_query_result(&self, result: QueryResult) -> Result<Executed> {
        let result = result.buffer().await?;

        let table = match result.buffered_rows() {
            Some(rows) if !rows.is_empty() => result.fields.first().map(|f| f.table.clone()),
            _ => None,
        };

        let directory = table.and_then(|table| {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.get(&table).map(|r| r.directory.clone())
        });

        match directory {
            Some(directory) => Ok(Executed::Collection(
                directory.build_collection(self, result)?,
            )),
            None => Ok(Executed::Raw(result)),
        }
    }

    /// Prepares a statement whose results are routed back through this
    /// repository.
    pub async fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        let inner = self.client.prepare(sql).await?;
        Ok(Statement::new(self, inner))
    }

    /// Begins a transaction at the given isolation level, defaulting to the
    /// repository's configured level.
    pub async fn begin_transaction(
        &self,
        isolation: Option<IsolationLevel>,
    ) -> Result<Transaction<'_>> {
        let isolation = isolation.unwrap_or(self.default_isolation);
        let inner = self.client.begin_transaction(isolation).await?;
        Ok(Transaction::new(self, inner))
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read().expect("registry lock poisoned");
        let mut tables: Vec<&str> = registry.keys().map(String::as_str).collect();
        tables.sort_unstable();
        f.debug_struct("Repository")
            .field("tables", &tables)
            .field("default_isolation", &self.default_isolation)
            .finish()
    }
}

/// Builder for [`Repository`].
#[derive(Default)]
pub struct Builder {
    client: Option<Arc<dyn Client>>,
    default_isolation: Option<IsolationLevel>,
}

impl Builder {
    /// The client queries are executed through. Required.
    pub fn client(mut self, client: Arc<dyn Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// The isolation level used when a transaction does not specify one.
    pub fn default_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.default_isolation = Some(isolation);
        self
    }

    pub fn build(self) -> Result<Repository> {
        let client = self
            .client
            .ok_or_else(|| Error::configuration("repository requires a client"))?;
        let mut repository = Repository::new(client);
        if let Some(isolation) = self.default_isolation {
            repository.default_isolation = isolation;
        }
        Ok(repository)
    }
}
