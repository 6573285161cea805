#![allow(dead_code)]

use carton::driver::{
    Client, ClientStatement, ClientTransaction, FieldDef, IsolationLevel, QueryResult,
};
use carton::stmt::{Row, Value};
use carton::{async_trait, ColumnDefinition, ColumnType, Error, FetchMode, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One operation observed by the scripted client.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Execute { sql: String, params: Vec<Value> },
    Prepare { sql: String },
    StatementExecute { sql: String, params: Vec<Value> },
    Begin { isolation: IsolationLevel },
    Commit,
    Rollback,
}

impl Op {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Op::Execute { sql, .. } | Op::Prepare { sql } | Op::StatementExecute { sql, .. } => {
                Some(sql)
            }
            _ => None,
        }
    }
}

struct Shared {
    responses: Mutex<VecDeque<Result<QueryResult>>>,
    log: Mutex<Vec<Op>>,
}

impl Shared {
    fn push_op(&self, op: Op) {
        self.log.lock().expect("op log lock poisoned").push(op);
    }

    fn next_response(&self) -> Result<QueryResult> {
        self.responses
            .lock()
            .expect("response queue lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::driver(std::io::Error::other(
                    "no scripted response left",
                )))
            })
    }
}

/// A client double that replays scripted responses and records every
/// operation for later assertions.
pub struct ScriptedClient {
    shared: Arc<Shared>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(Shared {
                responses: Mutex::new(VecDeque::new()),
                log: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Queues a successful response.
    pub fn push_ok(&self, result: QueryResult) {
        self.shared
            .responses
            .lock()
            .expect("response queue lock poisoned")
            .push_back(Ok(result));
    }

    /// Queues a driver failure.
    pub fn push_err(&self, message: &'static str) {
        self.shared
            .responses
            .lock()
            .expect("response queue lock poisoned")
            .push_back(Err(Error::driver(std::io::Error::other(message))));
    }

    /// Snapshot of the operations observed so far.
    pub fn ops(&self) -> Vec<Op> {
        self.shared.log.lock().expect("op log lock poisoned").clone()
    }

    /// Count of operations matching the given predicate.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Op) -> bool,
    {
        self.ops().iter().filter(|op| predicate(op)).count()
    }

    /// Count of queries (direct or through a statement) whose SQL starts
    /// with the given keyword.
    pub fn query_count(&self, keyword: &str) -> usize {
        self.count(|op| {
            matches!(op, Op::Execute { .. } | Op::StatementExecute { .. })
                && op.sql().is_some_and(|sql| sql.starts_with(keyword))
        })
    }
}

impl std::fmt::Debug for ScriptedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl Client for ScriptedClient {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.shared.push_op(Op::Execute {
            sql: sql.to_owned(),
            params: params.to_vec(),
        });
        self.shared.next_response()
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn ClientStatement>> {
        self.shared.push_op(Op::Prepare {
            sql: sql.to_owned(),
        });
        Ok(Box::new(ScriptedStatement {
            sql: sql.to_owned(),
            shared: self.shared.clone(),
        }))
    }

    async fn begin_transaction(
        &self,
        isolation: IsolationLevel,
    ) -> Result<Box<dyn ClientTransaction>> {
        self.shared.push_op(Op::Begin { isolation });
        Ok(Box::new(ScriptedTransaction {
            shared: self.shared.clone(),
        }))
    }
}

struct ScriptedStatement {
    sql: String,
    shared: Arc<Shared>,
}

#[async_trait]
impl ClientStatement for ScriptedStatement {
    async fn execute(&mut self, params: &[Value]) -> Result<QueryResult> {
        self.shared.push_op(Op::StatementExecute {
            sql: self.sql.clone(),
            params: params.to_vec(),
        });
        self.shared.next_response()
    }
}

struct ScriptedTransaction {
    shared: Arc<Shared>,
}

#[async_trait]
impl ClientTransaction for ScriptedTransaction {
    async fn prepare(&mut self, sql: &str) -> Result<Box<dyn ClientStatement>> {
        self.shared.push_op(Op::Prepare {
            sql: sql.to_owned(),
        });
        Ok(Box::new(ScriptedStatement {
            sql: sql.to_owned(),
            shared: self.shared.clone(),
        }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.shared.push_op(Op::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.shared.push_op(Op::Rollback);
        Ok(())
    }
}

/// Builds a row from column/value pairs.
pub fn row(entries: &[(&str, Value)]) -> Row {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// A buffered SELECT result over a single table.
pub fn select_result(table: &str, columns: &[&str], rows: Vec<Row>) -> QueryResult {
    let fields = columns
        .iter()
        .map(|c| FieldDef::new("app", table, *c))
        .collect();
    QueryResult::of_rows(fields, rows)
}

/// An INSERT/UPDATE/DELETE result.
pub fn write_result(affected_rows: u64, insert_id: Option<u64>) -> QueryResult {
    QueryResult {
        insert_id,
        ..QueryResult::of_count(affected_rows)
    }
}

// Test record types.
//
// `books` exercises the lazy foreign key and the insert decision table
// (three columns, `id` is the identifier); `magazines`/`publishers`
// exercise eager preloading; `tags` has no identifier column at all.

carton::schema! {
    table = "authors",
    #[derive(Debug, Clone, PartialEq)]
    pub struct Author {
        id: i64 = ColumnDefinition::builder("authors", "id", ColumnType::BigInt)
            .primary()
            .auto_increment(),
        name: String = ColumnDefinition::builder("authors", "name", ColumnType::VarChar)
            .length(255),
    }
}

carton::schema! {
    table = "books",
    #[derive(Debug, Clone, PartialEq)]
    pub struct Book {
        id: i64 = ColumnDefinition::builder("books", "id", ColumnType::BigInt)
            .primary()
            .auto_increment(),
        title: String = ColumnDefinition::builder("books", "title", ColumnType::VarChar)
            .length(255),
        author_id: foreign Author = ColumnDefinition::builder("books", "author_id", ColumnType::BigInt)
            .references("authors", "id", FetchMode::Lazy),
    }
}

carton::schema! {
    table = "publishers",
    #[derive(Debug, Clone, PartialEq)]
    pub struct Publisher {
        publisher_id: i64 = ColumnDefinition::builder("publishers", "publisher_id", ColumnType::BigInt)
            .primary()
            .auto_increment(),
        name: String = ColumnDefinition::builder("publishers", "name", ColumnType::VarChar)
            .length(255),
    }
}

carton::schema! {
    table = "magazines",
    #[derive(Debug, Clone, PartialEq)]
    pub struct Magazine {
        magazine_id: i64 = ColumnDefinition::builder("magazines", "magazine_id", ColumnType::BigInt)
            .primary()
            .auto_increment(),
        title: String = ColumnDefinition::builder("magazines", "title", ColumnType::VarChar)
            .length(255),
        publisher_id: foreign Publisher = ColumnDefinition::builder("magazines", "publisher_id", ColumnType::BigInt)
            .references("publishers", "publisher_id", FetchMode::Always),
    }
}

carton::schema! {
    table = "tags",
    #[derive(Debug, Clone, PartialEq)]
    pub struct Tag {
        name: String = ColumnDefinition::builder("tags", "name", ColumnType::VarChar)
            .length(64),
        label: String = ColumnDefinition::builder("tags", "displayLabel", ColumnType::VarChar)
            .length(64)
            .field("label"),
    }
}
