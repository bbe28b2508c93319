//! Submit-then-poll workflows.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{basic_client, start_programmable_backend, RecordedRequest};
use emailverify_client::validations::{FileValidationRequest, ValidationRequest};
use emailverify_client::{CancellationSignal, ClientError, ValidationStatus, WaitPolicy};
use serde_json::json;
use uuid::Uuid;

const JOB_ID: &str = "6d0cbb3a-5a8c-4e4f-9a32-1a1b3e0f7c11";

fn overview(status: &str) -> serde_json::Value {
    json!({
        "id": JOB_ID,
        "status": status,
        "noOfEntries": 2,
        "progress": { "percentage": 0.5 }
    })
}

fn snapshot(status: &str) -> String {
    let mut body = json!({ "overview": overview(status) });
    if status == "Completed" {
        body["entries"] = json!({
            "meta": { "isTruncated": false },
            "data": [
                { "index": 0, "inputData": "a@example.com", "classification": "Deliverable" },
                { "index": 1, "inputData": "b@example.com", "classification": "Undeliverable" }
            ]
        });
    }
    body.to_string()
}

/// POST answers with the first script entry, each GET with the next one.
async fn scripted_backend(script: Vec<(u16, String)>) -> common::MockBackend {
    let script = Arc::new(script);
    let calls = Arc::new(AtomicUsize::new(0));
    start_programmable_backend(move |_request: RecordedRequest| {
        let script = script.clone();
        let calls = calls.clone();
        async move {
            let i = calls.fetch_add(1, Ordering::SeqCst);
            script
                .get(i)
                .cloned()
                .unwrap_or((500, "script exhausted".to_string()))
        }
    })
    .await
}

fn request() -> ValidationRequest {
    ValidationRequest::new(["a@example.com", "b@example.com"])
}

#[tokio::test]
async fn test_no_wait_returns_after_submission() {
    let backend = scripted_backend(vec![(202, snapshot("InProgress"))]).await;
    let client = basic_client(&[backend.url()]);

    let job = client
        .email_validations()
        .submit(&request(), &WaitPolicy::NO_WAIT, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.overview.status, ValidationStatus::InProgress);
    assert!(job.entries.is_empty());
    assert_eq!(backend.hits(), 1);

    let requests = backend.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v2.6/email-validations");
    assert_eq!(requests[0].query_param("waitTime"), None);
    assert_eq!(
        requests[0].body_json()["entries"][1]["inputData"],
        "b@example.com"
    );
}

#[tokio::test]
async fn test_default_policy_polls_until_completed() {
    let backend = scripted_backend(vec![
        (202, snapshot("InProgress")),
        (202, snapshot("InProgress")),
        (200, snapshot("Completed")),
    ])
    .await;
    let client = basic_client(&[backend.url()]);
    let progress_calls = Arc::new(AtomicUsize::new(0));
    let counter = progress_calls.clone();
    let policy = WaitPolicy::DEFAULT.with_progress(move |overview| {
        assert_eq!(overview.status, ValidationStatus::InProgress);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let job = client
        .email_validations()
        .submit(&request(), &policy, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(job.overview.status, ValidationStatus::Completed);
    assert_eq!(job.entries.len(), 2);
    assert_eq!(backend.hits(), 3);
    assert_eq!(progress_calls.load(Ordering::SeqCst), 2);

    let requests = backend.requests();
    assert_eq!(requests[0].query_param("waitTime").as_deref(), Some("30000"));
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, format!("/v2.6/email-validations/{JOB_ID}"));
}

#[tokio::test]
async fn test_job_vanishing_while_polling_is_absent() {
    let backend = scripted_backend(vec![
        (202, snapshot("InProgress")),
        (202, snapshot("InProgress")),
        (404, "{}".to_string()),
    ])
    .await;
    let client = basic_client(&[backend.url()]);

    let job = client
        .email_validations()
        .submit(&request(), &WaitPolicy::DEFAULT, None)
        .await
        .unwrap();
    assert!(job.is_none());
    assert_eq!(backend.hits(), 3);
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let backend = scripted_backend(vec![
        (202, snapshot("InProgress")),
        (202, snapshot("InProgress")),
        (200, snapshot("Completed")),
    ])
    .await;
    let client = basic_client(&[backend.url()]);
    let signal = CancellationSignal::new();
    let canceller = signal.clone();
    let policy = WaitPolicy::DEFAULT.with_progress(move |_| canceller.cancel());

    let err = client
        .email_validations()
        .submit(&request(), &policy, Some(&signal))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::OperationCanceled));
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_truncated_entries_are_followed() {
    let backend = start_programmable_backend(|request: RecordedRequest| async move {
        let entries_path = format!("/v2.6/email-validations/{JOB_ID}/entries");
        if request.path == entries_path {
            assert_eq!(request.query_param("cursor").as_deref(), Some("next-1"));
            return (
                200,
                json!({
                    "meta": { "isTruncated": false },
                    "data": [{ "index": 1, "inputData": "b@example.com" }]
                })
                .to_string(),
            );
        }
        (
            200,
            json!({
                "overview": overview("Completed"),
                "entries": {
                    "meta": { "cursor": "next-1", "isTruncated": true },
                    "data": [{ "index": 0, "inputData": "a@example.com" }]
                }
            })
            .to_string(),
        )
    })
    .await;
    let client = basic_client(&[backend.url()]);

    let id = Uuid::parse_str(JOB_ID).unwrap();
    let job = client
        .email_validations()
        .get(id, &WaitPolicy::DEFAULT, None)
        .await
        .unwrap()
        .unwrap();
    let inputs: Vec<_> = job.entries.iter().map(|e| e.input_data.as_str()).collect();
    assert_eq!(inputs, vec!["a@example.com", "b@example.com"]);
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_overview_and_delete() {
    let backend = start_programmable_backend(|request: RecordedRequest| async move {
        match request.method.as_str() {
            "DELETE" => (410, String::new()),
            _ if request.path.ends_with("/overview") => (404, "{}".to_string()),
            _ => (500, String::new()),
        }
    })
    .await;
    let client = basic_client(&[backend.url()]);
    let id = Uuid::parse_str(JOB_ID).unwrap();

    let overview = client
        .email_validations()
        .get_overview(id, &WaitPolicy::DEFAULT, None)
        .await
        .unwrap();
    assert!(overview.is_none());

    client.email_validations().delete(id, None).await.unwrap();
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_file_submission_is_multipart() {
    let backend = scripted_backend(vec![(202, snapshot("InProgress"))]).await;
    let client = basic_client(&[backend.url()]);

    let mut request = FileValidationRequest::new(
        b"a@example.com\nb@example.com\n".to_vec(),
        "list.csv",
        "text/csv",
    );
    request.options.column = Some(0);
    client
        .email_validations()
        .submit_file(&request, &WaitPolicy::NO_WAIT, None)
        .await
        .unwrap();

    let recorded = &backend.requests()[0];
    assert!(recorded
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&recorded.body);
    assert!(body.contains(r#"name="inputFile"; filename="list.csv""#));
    assert!(body.contains(r#"name="settings""#));
    assert!(body.contains(r#""column":0"#));
}

#[tokio::test]
async fn test_empty_submission_is_rejected_locally() {
    let backend = scripted_backend(vec![]).await;
    let client = basic_client(&[backend.url()]);

    let err = client
        .email_validations()
        .submit(
            &ValidationRequest::new(Vec::<String>::new()),
            &WaitPolicy::NO_WAIT,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
    assert_eq!(backend.hits(), 0);
}
