#![cfg(feature = "test-utils")]
//! Runs against an embedded server, or the one named by `PG_KEEN_TEST_URL` when set.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{TestDb, table_name};
use futures_util::StreamExt;
use pg_keen::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test4_named_queries_and_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::start("keen_shapes").await?;
    let config = db.config.clone().with_pool_size(1, 4);
    let client = Client::new(config.with_camelize_columns(true)).await?;
    let table = table_name("keen_users");

    client
        .execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (id BIGINT PRIMARY KEY, user_name TEXT, created_at TIMESTAMP);"
        ))
        .await?;

    let inserted = client
        .execute(
            &format!(
                "INSERT INTO {table} (id, user_name, created_at) VALUES (:id, :user.name, now()::timestamp)"
            ),
            json!({ "id": 1, "user": { "name": "alice" } }),
        )
        .await?;
    assert_eq!(inserted, 1);

    let row = client
        .query_one(
            &format!("SELECT id, user_name FROM {table} WHERE id = :id"),
            json!({ "id": 1 }),
        )
        .await?
        .expect("row exists");
    assert_eq!(row.get("userName").and_then(RowValues::as_text), Some("alice"));

    let count = client
        .query_scalar(&format!("SELECT count(*) FROM {table}"), ())
        .await?;
    assert_eq!(count, Some(RowValues::Int(1)));

    let ids = client
        .query_scalars(
            &format!("SELECT id FROM {table} WHERE id = $1"),
            [RowValues::Int(1)],
        )
        .await?;
    assert_eq!(ids, vec![RowValues::Int(1)]);

    let two_columns = client
        .query_scalar(&format!("SELECT id, user_name FROM {table}"), ())
        .await;
    assert!(matches!(
        two_columns,
        Err(PgKeenError::UnexpectedColumnCount { count: 2 })
    ));

    client.execute_batch(&format!("DROP TABLE {table}")).await?;
    client.close();
    db.stop().await;
    Ok(())
}

#[tokio::test]
async fn test4_transaction_commits_and_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::start("keen_tx").await?;
    let config = db.config.clone().with_pool_size(1, 4);
    let client = Client::new(config).await?;
    let table = table_name("keen_tx");
    client
        .execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} (v BIGINT);"
        ))
        .await?;

    let insert = format!("INSERT INTO {table} (v) VALUES (:v)");
    let committed = client
        .transaction(|tx| {
            let insert = insert.clone();
            Box::pin(async move {
                tx.execute(&insert, json!({ "v": 1 })).await?;
                tx.execute(&insert, json!({ "v": 2 })).await
            })
        })
        .await?;
    assert_eq!(committed, 1);

    let failed: Result<(), PgKeenError> = client
        .transaction(|tx| {
            let insert = insert.clone();
            Box::pin(async move {
                tx.execute(&insert, json!({ "v": 3 })).await?;
                Err(PgKeenError::Other("abort".into()))
            })
        })
        .await;
    assert!(matches!(failed, Err(PgKeenError::Other(msg)) if msg == "abort"));

    let values = client
        .query_scalars(&format!("SELECT v FROM {table} ORDER BY v"), ())
        .await?;
    assert_eq!(values, vec![RowValues::Int(1), RowValues::Int(2)]);

    let nested = client
        .connection(|conn| {
            Box::pin(async move {
                conn.transaction(|tx| {
                    Box::pin(async move { tx.transaction(|_| Box::pin(async { Ok(()) })).await })
                })
                .await
            })
        })
        .await;
    assert!(matches!(nested, Err(PgKeenError::ExecutionError(_))));

    client.execute_batch(&format!("DROP TABLE {table}")).await?;
    db.stop().await;
    Ok(())
}

#[tokio::test]
async fn test4_missing_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::start("keen_missing").await?;
    let config = db.config.clone().with_pool_size(1, 4);

    let relaxed = Client::new(config.clone()).await?;
    let sent = relaxed
        .query_scalar("SELECT :missing::text", json!({}))
        .await;
    assert!(matches!(sent, Err(PgKeenError::PostgresError(_))));

    let strict = Client::new(config.with_missing_params(MissingParamPolicy::Strict)).await?;
    let refused = strict
        .query_scalar("SELECT :missing::text", json!({}))
        .await;
    assert!(matches!(refused, Err(PgKeenError::MissingParameter { name }) if name == "missing"));
    db.stop().await;
    Ok(())
}

#[tokio::test]
async fn test4_batches_locks_and_events() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::start("keen_batches").await?;
    let config = db.config.clone().with_pool_size(1, 4);
    let queries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&queries);
    let listeners = EventListeners::new().on_query(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let client = Client::new(config.with_event_listeners(listeners)).await?;

    let total = client
        .connection(|conn| {
            Box::pin(async move {
                let mut batches = conn
                    .query_batches(
                        "SELECT g FROM generate_series(1, :n) AS g",
                        json!({ "n": 10 }),
                        4,
                    )
                    .await?;
                let mut sizes = Vec::new();
                while let Some(batch) = batches.next().await {
                    sizes.push(batch?.len());
                }
                Ok(sizes)
            })
        })
        .await?;
    assert_eq!(total, vec![4, 4, 2]);

    let locked = client
        .synchronized("keen-test-lock", |conn| {
            Box::pin(async move { conn.query_scalar("SELECT 42::bigint", ()).await })
        })
        .await?;
    assert_eq!(locked, Some(RowValues::Int(42)));

    assert!(queries.load(Ordering::SeqCst) >= 3);
    db.stop().await;
    Ok(())
}

#[tokio::test]
async fn test4_failed_work_destroys_the_connection() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::start("keen_destroy").await?;
    let config = db.config.clone().with_pool_size(1, 4);
    let client = Client::new(config.with_pool_size(1, 1)).await?;
    assert_eq!(client.pool().status().size, 1);

    let pid_before = client.query_scalar("SELECT pg_backend_pid()", ()).await?;
    let failed = client.query_scalar("SELECT * FROM no_such_table", ()).await;
    assert!(failed.is_err());
    let pid_after = client.query_scalar("SELECT pg_backend_pid()", ()).await?;
    assert_ne!(pid_before, pid_after);

    client.close();
    assert!(client.pool().is_closed());
    assert!(client.query_scalar("SELECT 1", ()).await.is_err());
    db.stop().await;
    Ok(())
}
