mod result;
pub use result::{FieldDef, QueryResult, Rows};

use crate::{async_trait, stmt::Value, Result};

use std::fmt::Debug;

/// Transaction isolation levels understood by the client contract.
///
/// Drivers map these to the equivalent SQL `SET TRANSACTION` phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl Default for IsolationLevel {
    fn default() -> Self {
        Self::ReadCommitted
    }
}

/// The asynchronous database client this layer sits on.
///
/// Connection pooling, the wire protocol, and statement execution all live
/// behind this trait; the mapping layer only issues parameterized SQL
/// strings and consumes [`QueryResult`]s.
#[async_trait]
pub trait Client: Debug + Send + Sync + 'static {
    /// Execute a parameterized query.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Prepare a statement for repeated execution.
    async fn prepare(&self, sql: &str) -> Result<Box<dyn ClientStatement>>;

    /// Begin a transaction at the given isolation level.
    async fn begin_transaction(
        &self,
        isolation: IsolationLevel,
    ) -> Result<Box<dyn ClientTransaction>>;
}

/// A prepared statement owned by the client.
#[async_trait]
pub trait ClientStatement: Send {
    /// Execute the statement with the given parameters.
    async fn execute(&mut self, params: &[Value]) -> Result<QueryResult>;
}

/// An open transaction owned by the client.
///
/// Dropping without commit or rollback leaves cleanup to the driver.
#[async_trait]
pub trait ClientTransaction: Send {
    /// Prepare a statement bound to this transaction's connection.
    async fn prepare(&mut self, sql: &str) -> Result<Box<dyn ClientStatement>>;

    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Roll the transaction back.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
