//! Cursor-based listings.

mod common;

use common::{basic_client, start_programmable_backend, RecordedRequest};
use emailverify_client::credits::DailyUsageListOptions;
use emailverify_client::validations::{ValidationListOptions, ValidationStatus};
use emailverify_client::ClientError;
use futures_util::{StreamExt, TryStreamExt};
use serde_json::json;

fn job(n: u32) -> serde_json::Value {
    json!({
        "id": format!("00000000-0000-4000-8000-{n:012}"),
        "status": "Completed",
        "noOfEntries": n
    })
}

async fn two_segment_backend() -> common::MockBackend {
    start_programmable_backend(|request: RecordedRequest| async move {
        let body = match request.query_param("cursor").as_deref() {
            None => json!({
                "meta": { "cursor": "page-2", "isTruncated": true },
                "data": [job(1), job(2)]
            }),
            Some("page-2") => json!({
                "meta": { "isTruncated": false },
                "data": [job(3)]
            }),
            Some(_) => return (400, "{}".to_string()),
        };
        (200, body.to_string())
    })
    .await
}

#[tokio::test]
async fn test_list_follows_cursor() {
    let backend = two_segment_backend().await;
    let client = basic_client(&[backend.url()]);

    let options = ValidationListOptions {
        limit: Some(2),
        statuses: vec![ValidationStatus::Completed, ValidationStatus::Expired],
        ..Default::default()
    };
    let jobs: Vec<_> = client
        .email_validations()
        .list(&options, None)
        .try_collect()
        .await
        .unwrap();

    let sizes: Vec<_> = jobs.iter().map(|j| j.no_of_entries).collect();
    assert_eq!(sizes, vec![1, 2, 3]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].query_param("status").as_deref(),
        Some("Completed,Expired")
    );
    assert_eq!(requests[1].query_param("status"), None);
    assert_eq!(requests[1].query_param("limit").as_deref(), Some("2"));
}

#[tokio::test]
async fn test_stopping_early_fetches_nothing_more() {
    let backend = two_segment_backend().await;
    let client = basic_client(&[backend.url()]);

    let first: Vec<_> = client
        .email_validations()
        .list(&ValidationListOptions::default(), None)
        .take(2)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_resume_from_cursor() {
    let backend = two_segment_backend().await;
    let client = basic_client(&[backend.url()]);

    let options = ValidationListOptions {
        cursor: Some("page-2".into()),
        ..Default::default()
    };
    let jobs: Vec<_> = client
        .email_validations()
        .list(&options, None)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_segment_error_ends_stream() {
    let backend = start_programmable_backend(|request: RecordedRequest| async move {
        if request.query_param("cursor").is_some() {
            return (400, r#"{"detail":"bad cursor"}"#.to_string());
        }
        (
            200,
            json!({ "meta": { "cursor": "x", "isTruncated": true }, "data": [job(1)] })
                .to_string(),
        )
    })
    .await;
    let client = basic_client(&[backend.url()]);

    let results: Vec<_> = client
        .email_validations()
        .list(&ValidationListOptions::default(), None)
        .collect()
        .await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    match &results[1] {
        Err(ClientError::UnexpectedStatus { status, .. }) => assert_eq!(status.as_u16(), 400),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_daily_usage_listing() {
    let backend = start_programmable_backend(|request: RecordedRequest| async move {
        assert_eq!(request.path, "/v2.6/credits/daily-usage");
        (
            200,
            json!({
                "meta": { "isTruncated": false },
                "data": [
                    { "date": "2024-05-02", "creditPacks": 1.5, "freeCredits": 10 },
                    { "date": "2024-05-01", "creditPacks": 0, "freeCredits": 3 }
                ]
            })
            .to_string(),
        )
    })
    .await;
    let client = basic_client(&[backend.url()]);

    let options = DailyUsageListOptions {
        since: Some("2024-05-01".into()),
        ..Default::default()
    };
    let usages: Vec<_> = client
        .credits()
        .list_daily_usages(&options, None)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(usages.len(), 2);
    assert_eq!(usages[0].credit_packs, 1.5);
    assert_eq!(
        backend.requests()[0].query_param("date:since").as_deref(),
        Some("2024-05-01")
    );
}
