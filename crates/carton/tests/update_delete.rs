mod support;

use support::{row, select_result, write_result, Book, ScriptedClient, Tag};

use carton::stmt::Value;
use carton::{Repository, Schema, SchemaExt, SqlDirectory};

use pretty_assertions::assert_eq;
use std::sync::Arc;

fn repository(client: Arc<ScriptedClient>) -> (Repository, SqlDirectory<Book>) {
    let repository = Repository::new(client);
    repository
        .register_directory(Arc::new(SqlDirectory::<Book>::new()))
        .unwrap();
    repository
        .register_directory(Arc::new(SqlDirectory::<Tag>::new()))
        .unwrap();
    (repository, SqlDirectory::new())
}

#[tokio::test]
async fn update_refetches_the_current_row_state() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, None));
    client.push_ok(select_result(
        "books",
        &["id", "title", "author_id"],
        vec![row(&[
            ("id", Value::I64(5)),
            ("title", Value::String("Dune Messiah".into())),
            ("author_id", Value::I64(1)),
        ])],
    ));

    let collection = directory
        .update(
            &repository,
            row(&[("title", Value::String("Dune Messiah".into()))]),
            "id",
            5,
        )
        .await
        .unwrap();

    // The returned state is the re-fetched row, not the update input.
    let book = &collection.schemas()[0];
    assert_eq!(book.author_id.key(), Some(&Value::I64(1)));

    let ops = client.ops();
    assert!(ops[0].sql().unwrap().starts_with("UPDATE"));
    assert!(ops[1].sql().unwrap().starts_with("SELECT"));
}

#[tokio::test]
async fn update_with_no_data_fails_before_any_query() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    let err = directory
        .update(&repository, row(&[]), "id", 5)
        .await
        .unwrap_err();
    assert!(err.is_empty_insert());
    assert!(client.ops().is_empty());
}

#[tokio::test]
async fn record_update_reconciles_with_the_refetched_row() {
    let client = ScriptedClient::new();
    let (repository, _) = repository(client.clone());

    let mut book = Book::build(
        &repository,
        &row(&[
            ("id", Value::I64(5)),
            ("title", Value::String("Dune".into())),
            ("author_id", Value::I64(1)),
        ]),
    )
    .unwrap();

    client.push_ok(write_result(1, None));
    client.push_ok(select_result(
        "books",
        &["id", "title", "author_id"],
        vec![row(&[
            ("id", Value::I64(5)),
            ("title", Value::String("Dune Messiah".into())),
            ("author_id", Value::I64(1)),
        ])],
    ));

    book.update(
        &repository,
        row(&[("title", Value::String("Dune Messiah".into()))]),
    )
    .await
    .unwrap();

    assert_eq!(book.id.get(), Some(&5));
    assert_eq!(book.title.get(), Some(&"Dune Messiah".to_owned()));
}

#[tokio::test]
async fn update_without_identifier_column_fails() {
    let client = ScriptedClient::new();
    let (repository, _) = repository(client.clone());

    let mut tag = Tag::build(
        &repository,
        &row(&[("name", Value::String("scifi".into()))]),
    )
    .unwrap();

    let err = tag
        .update(&repository, row(&[("label", Value::String("Sci-Fi".into()))]))
        .await
        .unwrap_err();
    assert!(err.is_no_identifier());
    assert!(client.ops().is_empty());
}

#[tokio::test]
async fn update_with_unset_identifier_value_fails() {
    let client = ScriptedClient::new();
    let (repository, _) = repository(client.clone());

    let mut book = Book::empty();
    let err = book
        .update(&repository, row(&[("title", Value::String("x".into()))]))
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(client.ops().is_empty());
}

#[tokio::test]
async fn delete_returns_the_raw_result() {
    let client = ScriptedClient::new();
    let (repository, directory) = repository(client.clone());

    client.push_ok(write_result(1, None));

    let result = directory.delete(&repository, 5).await.unwrap();
    assert_eq!(result.affected_rows, 1);

    let ops = client.ops();
    assert_eq!(ops.len(), 1);
    assert!(ops[0].sql().unwrap().starts_with("DELETE"));
}

#[tokio::test]
async fn record_delete_uses_the_identifier() {
    let client = ScriptedClient::new();
    let (repository, _) = repository(client.clone());

    let book = Book::build(
        &repository,
        &row(&[("id", Value::I64(5)), ("title", Value::String("Dune".into()))]),
    )
    .unwrap();

    client.push_ok(write_result(1, None));

    let result = book.delete(&repository).await.unwrap();
    assert_eq!(result.affected_rows, 1);

    let ops = client.ops();
    let params = match &ops[0] {
        support::Op::Execute { params, .. } => params.clone(),
        other => panic!("unexpected op: {other:?}"),
    };
    assert_eq!(params, vec![Value::I64(5)]);
}

#[tokio::test]
async fn delete_on_identifierless_schema_fails() {
    let client = ScriptedClient::new();
    let (repository, _) = repository(client.clone());

    let tag = Tag::build(
        &repository,
        &row(&[("name", Value::String("scifi".into()))]),
    )
    .unwrap();

    let err = tag.delete(&repository).await.unwrap_err();
    assert!(err.is_no_identifier());
}
