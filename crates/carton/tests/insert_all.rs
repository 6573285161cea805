mod support;

use support::{row, write_result, Book, Op, ScriptedClient};

use carton::driver::IsolationLevel;
use carton::stmt::{Row, Value};
use carton::{ConflictResolution, InsertAllOptions, Repository, SqlDirectory};

use pretty_assertions::assert_eq;
use std::sync::Arc;

fn repository(client: Arc<ScriptedClient>) -> (Repository, SqlDirectory<Book>) {
    let repository = Repository::new(client);
    repository
        .register_directory(Arc::new(SqlDirectory::<Book>::new()))
        .unwrap();
    (repository, SqlDirectory::new())
}

fn batch() -> Vec<Row> {
    vec![
        row(&[
            ("title", Value::String("Dune".into())),
            ("author_id", Value::I64(1)),
        ]),
        row(&[
            ("title", Value::String("Hyperion".into())),
            ("author_id", Value::I64(2)),
        ]),
        row(&[
            ("title", Value::String("Solaris".into())),
            ("author_id", Value::I64(3)),
        ]),
    ]
}

#[tokio::test]
async fn batch_runs_sequentially_inside_one_transaction() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_ok(write_result(1, Some(2)));
    client.push_ok(write_result(1, Some(3)));

    let collection = directory
        .insert_all(&repository, batch(), InsertAllOptions::default())
        .await
        .unwrap();

    assert_eq!(collection.len(), 3);
    assert_eq!(collection.result().affected_rows, 3);
    let ids: Vec<i64> = collection
        .iter()
        .map(|b| *b.id.get().expect("id not injected"))
        .collect();
    assert_eq!(ids, [1, 2, 3]);

    // Begin, one prepare, one execution per row, commit, in that order.
    let shape: Vec<&'static str> = client
        .ops()
        .iter()
        .map(|op| match op {
            Op::Begin { .. } => "begin",
            Op::Prepare { .. } => "prepare",
            Op::StatementExecute { .. } => "exec",
            Op::Commit => "commit",
            Op::Rollback => "rollback",
            Op::Execute { .. } => "query",
        })
        .collect();
    assert_eq!(shape, ["begin", "prepare", "exec", "exec", "exec", "commit"]);
}

#[tokio::test]
async fn a_failing_row_rolls_the_whole_batch_back() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_err("duplicate key");

    let err = directory
        .insert_all(&repository, batch(), InsertAllOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_driver());
    assert!(err.to_string().contains("duplicate key"));

    let ops = client.ops();
    assert!(ops.contains(&Op::Rollback));
    assert!(!ops.contains(&Op::Commit));
    // The third row was never attempted.
    assert_eq!(client.count(|op| matches!(op, Op::StatementExecute { .. })), 2);
}

#[tokio::test]
async fn isolation_level_is_configurable() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_ok(write_result(1, Some(2)));
    client.push_ok(write_result(1, Some(3)));

    directory
        .insert_all(
            &repository,
            batch(),
            InsertAllOptions {
                isolation: Some(IsolationLevel::Serializable),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(client.ops().contains(&Op::Begin {
        isolation: IsolationLevel::Serializable
    }));
}

#[tokio::test]
async fn default_isolation_is_read_committed() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_ok(write_result(1, Some(2)));
    client.push_ok(write_result(1, Some(3)));

    directory
        .insert_all(&repository, batch(), InsertAllOptions::default())
        .await
        .unwrap();

    assert!(client.ops().contains(&Op::Begin {
        isolation: IsolationLevel::ReadCommitted
    }));
}

#[tokio::test]
async fn rows_missing_union_columns_bind_null() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_ok(write_result(1, None));

    let rows = vec![
        row(&[
            ("title", Value::String("Dune".into())),
            ("author_id", Value::I64(1)),
        ]),
        // No author for the second row.
        row(&[("title", Value::String("Anonymous".into()))]),
    ];
    directory
        .insert_all(&repository, rows, InsertAllOptions::default())
        .await
        .unwrap();

    let executions: Vec<Vec<Value>> = client
        .ops()
        .iter()
        .filter_map(|op| match op {
            Op::StatementExecute { params, .. } => Some(params.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        executions[0],
        vec![Value::String("Dune".into()), Value::I64(1)]
    );
    assert_eq!(
        executions[1],
        vec![Value::String("Anonymous".into()), Value::Null]
    );
}

#[tokio::test]
async fn explicit_conflict_resolution_takes_precedence() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, Some(1)));
    client.push_ok(write_result(1, Some(2)));
    client.push_ok(write_result(1, Some(3)));

    directory
        .insert_all(
            &repository,
            batch(),
            InsertAllOptions {
                ignore_conflict: true,
                conflict_resolution: Some(ConflictResolution::UpdateColumns(vec![
                    "title".to_owned(),
                ])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let ops = client.ops();
    let prepared = ops
        .iter()
        .find_map(|op| match op {
            Op::Prepare { sql } => Some(sql.as_str()),
            _ => None,
        })
        .expect("no statement prepared");
    assert!(
        prepared.contains("ON DUPLICATE KEY UPDATE"),
        "sql was: {prepared}"
    );
    assert!(prepared.contains("title"), "sql was: {prepared}");
}

#[tokio::test]
async fn empty_batches_fail_before_any_query() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    let err = directory
        .insert_all(&repository, vec![], InsertAllOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_empty_insert());
    assert!(client.ops().is_empty());
}
