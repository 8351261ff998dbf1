//! Indexing submission tests

use crate::support::*;
use chrono::Utc;
use index_relay::state::{ActionType, IndexStatus, SubmissionSource};
use index_relay::RelayError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn accepted_submission_returns_true_and_marks_the_item() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-123").await;

    Mock::given(method("POST"))
        .and(path("/indexing"))
        .and(header("authorization", "Bearer bearer-123"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/post",
            "type": "URL_UPDATED",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "urlNotificationMetadata": { "url": "https://example.com/post" }
        })))
        .mount(&server)
        .await;

    let store = shared_store();
    let item_id = store
        .lock()
        .unwrap()
        .track_item("https://example.com/post", "post", Utc::now())
        .unwrap();

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let indexer = indexing_client(settings, &store);

    let accepted = indexer
        .submit(
            "https://example.com/post",
            ActionType::UrlUpdated,
            SubmissionSource::Manual,
            Some(item_id),
        )
        .await
        .unwrap();
    assert!(accepted);

    let store = store.lock().unwrap();
    let item = store.get_item(item_id).unwrap();
    assert_eq!(item.status, IndexStatus::InIndex);
    assert!(item.last_checked_at.is_some());
    assert!(item.last_submitted_at.is_some());

    let logs = store.get_logs(10, 1, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status_code, 200);
    assert_eq!(logs[0].source, "manual");
}

#[tokio::test]
async fn rejected_submission_returns_false_not_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-123").await;

    Mock::given(method("POST"))
        .and(path("/indexing"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string(r#"{"error":{"status":"PERMISSION_DENIED"}}"#),
        )
        .mount(&server)
        .await;

    let store = shared_store();
    let item_id = store
        .lock()
        .unwrap()
        .track_item("https://example.com/post", "post", Utc::now())
        .unwrap();

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let indexer = indexing_client(settings, &store);

    // A non-200 answer is a data result, not an error.
    let accepted = indexer
        .submit(
            "https://example.com/post",
            ActionType::UrlUpdated,
            SubmissionSource::Auto,
            Some(item_id),
        )
        .await
        .unwrap();
    assert!(!accepted);

    let store = store.lock().unwrap();

    // The item is left untouched by a rejection.
    let item = store.get_item(item_id).unwrap();
    assert_eq!(item.status, IndexStatus::Unknown);
    assert!(item.last_submitted_at.is_none());

    // The rejection body is logged with the real status code.
    let logs = store.get_logs(10, 1, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status_code, 403);
    assert!(logs[0].message.contains("PERMISSION_DENIED"));
}

#[tokio::test]
async fn missing_credentials_error_is_logged_with_status_zero() {
    let server = MockServer::start().await;
    let store = shared_store();
    let settings = test_settings(&server, None);
    let indexer = indexing_client(settings, &store);

    let err = indexer
        .submit(
            "https://example.com/post",
            ActionType::UrlUpdated,
            SubmissionSource::Manual,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::MissingCredentials));

    let logs = store.lock().unwrap().get_logs(10, 1, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status_code, 0);
    assert!(logs[0].message.contains("not configured"));
}

#[tokio::test]
async fn unrecognized_action_normalizes_to_url_updated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-123").await;

    // The request must carry URL_UPDATED even though the caller said "FOO".
    Mock::given(method("POST"))
        .and(path("/indexing"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/post",
            "type": "URL_UPDATED",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = shared_store();
    let settings = test_settings(&server, Some(service_account_json(&server)));
    let indexer = indexing_client(settings, &store);

    let accepted = indexer
        .submit(
            "https://example.com/post",
            ActionType::from_str_lossy("FOO"),
            SubmissionSource::Manual,
            None,
        )
        .await
        .unwrap();
    assert!(accepted);
}

#[tokio::test]
async fn delete_notifications_carry_the_delete_action() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-123").await;

    Mock::given(method("POST"))
        .and(path("/indexing"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/gone",
            "type": "URL_DELETED",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = shared_store();
    let settings = test_settings(&server, Some(service_account_json(&server)));
    let indexer = indexing_client(settings, &store);

    let accepted = indexer
        .submit(
            "https://example.com/gone",
            ActionType::UrlDeleted,
            SubmissionSource::Manual,
            None,
        )
        .await
        .unwrap();
    assert!(accepted);
}

#[tokio::test]
async fn item_is_resolved_from_the_url_when_no_id_is_given() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-123").await;

    Mock::given(method("POST"))
        .and(path("/indexing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let store = shared_store();
    let item_id = store
        .lock()
        .unwrap()
        .track_item("https://example.com/post", "post", Utc::now())
        .unwrap();

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let indexer = indexing_client(settings, &store);

    let accepted = indexer
        .submit(
            "https://example.com/post",
            ActionType::UrlUpdated,
            SubmissionSource::Auto,
            None,
        )
        .await
        .unwrap();
    assert!(accepted);

    let item = store.lock().unwrap().get_item(item_id).unwrap();
    assert_eq!(item.status, IndexStatus::InIndex);
    assert!(item.last_submitted_at.is_some());
}
