mod support;

use support::{row, select_result, Author, Book, ScriptedClient};

use carton::stmt::Value;
use carton::{Repository, ResolutionState, SchemaExt, SqlDirectory};

use pretty_assertions::assert_eq;
use std::sync::Arc;

fn repository(client: Arc<ScriptedClient>) -> Repository {
    let repository = Repository::new(client);
    repository
        .register_directory(Arc::new(SqlDirectory::<Book>::new()))
        .unwrap();
    repository
        .register_directory(Arc::new(SqlDirectory::<Author>::new()))
        .unwrap();
    repository
}

fn unresolved_book(repository: &Repository) -> Book {
    Book::build(
        repository,
        &row(&[
            ("id", Value::I64(1)),
            ("title", Value::String("Dune".into())),
            ("author_id", Value::I64(42)),
        ]),
    )
    .unwrap()
}

#[tokio::test]
async fn resolution_returns_a_new_record_and_keeps_the_original() {
    let client = ScriptedClient::new();
    let repository = repository(client.clone());
    let book = unresolved_book(&repository);

    client.push_ok(select_result(
        "authors",
        &["id", "name"],
        vec![row(&[
            ("id", Value::I64(42)),
            ("name", Value::String("Frank Herbert".into())),
        ])],
    ));

    let resolved = book
        .resolve_foreign_targets(&repository)
        .await
        .unwrap()
        .expect("resolution had pending work");

    let author = resolved.author_id.record().expect("author not loaded");
    assert_eq!(author.name.get(), Some(&"Frank Herbert".to_owned()));
    assert_eq!(resolved.author_id.key(), Some(&Value::I64(42)));
    assert_eq!(resolved.resolution_state(), ResolutionState::Resolved);

    // The original instance still holds the raw scalar.
    assert!(book.author_id.record().is_none());
    assert_eq!(book.author_id.key(), Some(&Value::I64(42)));
    assert_eq!(book.resolution_state(), ResolutionState::Unresolved);
}

#[tokio::test]
async fn resolving_an_already_resolved_record_returns_none() {
    let client = ScriptedClient::new();
    let repository = repository(client.clone());
    let book = unresolved_book(&repository);

    client.push_ok(select_result(
        "authors",
        &["id", "name"],
        vec![row(&[
            ("id", Value::I64(42)),
            ("name", Value::String("Frank Herbert".into())),
        ])],
    ));

    let resolved = book
        .resolve_foreign_targets(&repository)
        .await
        .unwrap()
        .unwrap();
    let queries_after_first = client.query_count("SELECT");

    let again = resolved.resolve_foreign_targets(&repository).await.unwrap();
    assert!(again.is_none());
    assert_eq!(client.query_count("SELECT"), queries_after_first);
}

#[tokio::test]
async fn records_without_pending_keys_resolve_to_none() {
    let client = ScriptedClient::new();
    let repository = repository(client.clone());

    let book = Book::build(
        &repository,
        &row(&[("id", Value::I64(1)), ("author_id", Value::Null)]),
    )
    .unwrap();

    let resolved = book.resolve_foreign_targets(&repository).await.unwrap();
    assert!(resolved.is_none());
    assert!(client.ops().is_empty());
}

#[tokio::test]
async fn missing_foreign_rows_leave_the_key_unresolved() {
    let client = ScriptedClient::new();
    let repository = repository(client.clone());
    let book = unresolved_book(&repository);

    client.push_ok(select_result("authors", &["id", "name"], vec![]));

    let resolved = book
        .resolve_foreign_targets(&repository)
        .await
        .unwrap()
        .expect("resolution had pending work");
    assert!(resolved.author_id.record().is_none());
    assert_eq!(resolved.author_id.key(), Some(&Value::I64(42)));
}
