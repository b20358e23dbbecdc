//! API integration tests.
//!
//! These run the full router in-process against a temporary database with a
//! mock publisher standing in for the external platform.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use cadence_core::{ItemState, ItemStore, Transition};
use common::{TestConfig, TestFixture};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["schedule"]["items_per_day"], 2);
    assert_eq!(response.body["publisher"]["backend"], "dry_run");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.create_item("counted").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("cadence_items_by_state"));
    assert!(response.text.contains("cadence_http_requests_total"));
}

// =============================================================================
// Items
// =============================================================================

#[tokio::test]
async fn test_create_and_get_item() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/items",
            json!({
                "content": "Consistent hashing in one paragraph",
                "category": "System design concepts",
                "kind": "insight",
                "hashtags": ["#SystemDesign"]
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["state"], "generated");
    assert_eq!(response.body["hashtags"][0], "#SystemDesign");

    let id = response.body["id"].as_str().unwrap();
    let response = fixture.get(&format!("/api/v1/items/{}", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["content"], "Consistent hashing in one paragraph");
}

#[tokio::test]
async fn test_create_item_with_duplicate_id() {
    let fixture = TestFixture::new().await;
    let body = json!({
        "id": "fixed-1",
        "content": "first",
        "category": "c",
        "kind": "tip"
    });

    assert_status!(fixture.post("/api/v1/items", body.clone()).await, StatusCode::CREATED);
    let response = fixture.post("/api/v1/items", body).await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_create_item_with_blank_content() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/items",
            json!({ "content": "   ", "category": "c", "kind": "tip" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_item() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/items/does-not-exist").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("does-not-exist"));
}

#[tokio::test]
async fn test_list_items_by_state() {
    let fixture = TestFixture::new().await;
    fixture.create_item("draft one").await;
    fixture.create_item("draft two").await;
    fixture.approved_item("ready").await;

    let response = fixture.get("/api/v1/items").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["items"][0]["content"], "draft one");

    let response = fixture.get("/api/v1/items?state=generated").await;
    assert_eq!(response.body["total"], 2);

    let response = fixture.get("/api/v1/items?state=approved&limit=1").await;
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["limit"], 1);

    let response = fixture.get("/api/v1/items?state=shipped").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_approve_unapprove_flow() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("first draft").await;

    let response = fixture
        .post(
            &format!("/api/v1/items/{}/edit", id),
            json!({ "content": "second draft" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["state"], "edited");

    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/approve", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["state"], "approved");

    // Approved content is frozen until unapproved.
    let response = fixture
        .post(
            &format!("/api/v1/items/{}/edit", id),
            json!({ "content": "third draft" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);

    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/unapprove", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["state"], "edited");

    let response = fixture
        .post(
            &format!("/api/v1/items/{}/edit", id),
            json!({ "content": "third draft" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["content"], "third draft");
}

#[tokio::test]
async fn test_unapprove_without_edit_leaves_edited_at_unset() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("untouched").await;

    fixture
        .post_empty(&format!("/api/v1/items/{}/approve", id))
        .await;
    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/unapprove", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["state"], "edited");
    assert!(response.body["edited_at"].is_null());
    assert!(response.body["approved_at"].is_null());
    assert!(fixture.items.get(&id).unwrap().edited_at.is_none());
}

#[tokio::test]
async fn test_edit_with_empty_content_is_bad_request() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("draft").await;

    let response = fixture
        .post(&format!("/api/v1/items/{}/edit", id), json!({ "content": "" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.items.get(&id).unwrap().content, "draft");
}

#[tokio::test]
async fn test_recover_requires_failed_item() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("draft").await;

    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/recover", id))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_generate_items() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/items/generate", json!({ "count": 3 }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["created"].as_array().unwrap().len(), 3);
    assert_eq!(response.body["failed"].as_array().unwrap().len(), 0);
    assert_eq!(response.body["created"][0]["content"], "Generated post #1");
    assert_eq!(fixture.generator.produced(), 3);

    let response = fixture.get("/api/v1/items?state=generated").await;
    assert_eq!(response.body["total"], 3);
}

#[tokio::test]
async fn test_generate_defaults_to_one_item() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/items/generate", json!({})).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["created"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_rejects_out_of_range_count() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/items/generate", json!({ "count": 0 }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    // The fixture caps batches at 5.
    let response = fixture
        .post("/api/v1/items/generate", json!({ "count": 6 }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.generator.produced(), 0);
}

#[tokio::test]
async fn test_generate_without_generator() {
    let fixture = TestFixture::with_config(TestConfig {
        disable_generator: true,
        ..Default::default()
    })
    .await;

    let response = fixture
        .post("/api/v1/items/generate", json!({ "count": 1 }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.get("/api/v1/items").await.body["total"], 0);
}

// =============================================================================
// Queue document
// =============================================================================

#[tokio::test]
async fn test_export_queue() {
    let fixture = TestFixture::new().await;
    fixture.create_item("first").await;
    fixture.approved_item("second").await;

    let response = fixture.post_empty("/api/v1/queue/export").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["exported"], 2);

    let written = std::fs::read_to_string(fixture.document_path()).unwrap();
    let records: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(records[0]["content"], "first");
    assert_eq!(records[1]["state"], "approved");
}

#[tokio::test]
async fn test_sync_queue_applies_hand_edits() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("original wording").await;
    fixture.create_item("left alone").await;
    assert_status!(
        fixture.post_empty("/api/v1/queue/export").await,
        StatusCode::OK
    );

    let path = fixture.document_path();
    let mut records: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    records[0]["content"] = json!("reviewer wording");
    std::fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();

    let response = fixture.post_empty("/api/v1/queue/sync").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["edited"][0], id.as_str());
    assert_eq!(response.body["unchanged"], 1);
    assert_eq!(response.body["conflicts"].as_array().unwrap().len(), 0);

    let item = fixture.items.get(&id).unwrap();
    assert_eq!(item.content, "reviewer wording");
    assert_eq!(item.state, ItemState::Edited);
}

#[tokio::test]
async fn test_sync_queue_without_document() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_empty("/api/v1/queue/sync").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_queue_with_malformed_document() {
    let fixture = TestFixture::new().await;
    std::fs::write(fixture.document_path(), "{ not a queue").unwrap();
    let response = fixture.post_empty("/api/v1/queue/sync").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Scheduling and publishing
// =============================================================================

#[tokio::test]
async fn test_schedule_run_and_listing() {
    let fixture = TestFixture::new().await;
    let first = fixture.approved_item("first").await;
    let second = fixture.approved_item("second").await;
    fixture.create_item("not approved").await;

    let response = fixture.get("/api/v1/schedule").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.body["anchor"].is_null());
    assert_eq!(response.body["entries"].as_array().unwrap().len(), 0);

    let response = fixture.run_scheduler().await;
    assert_status!(response, StatusCode::OK);
    let assigned = response.body["assigned"].as_array().unwrap();
    assert_eq!(assigned.len(), 2);
    assert_eq!(assigned[0]["item_id"], first.as_str());
    assert_eq!(assigned[0]["day"], 1);
    assert_eq!(assigned[0]["time_slot"], "us_morning");
    assert_eq!(assigned[1]["item_id"], second.as_str());
    assert_eq!(assigned[1]["time_slot"], "india_evening");

    let response = fixture.get("/api/v1/schedule").await;
    assert_eq!(response.body["anchor"], "2020-01-06");
    let entries = response.body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["due_at"], "2020-01-06T14:00:00Z");

    // A second run finds nothing left to schedule.
    let response = fixture.run_scheduler().await;
    assert_eq!(response.body["assigned"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_sweep_publishes_due_items() {
    let fixture = TestFixture::new().await;
    let id = fixture.approved_item("ship it").await;
    fixture.run_scheduler().await;

    let response = fixture.sweep().await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["published"][0]["item_id"], id.as_str());
    assert_eq!(response.body["published"][0]["external_ref"], "mock-1");

    let response = fixture.get(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(response.body["state"], "posted");
    assert_eq!(response.body["publish_result"]["outcome"], "success");
    assert!(response.body["posted_at"].is_string());

    // Approving a posted item is rejected and changes nothing.
    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/approve", id))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(fixture.items.get(&id).unwrap().state, ItemState::Posted);
}

#[tokio::test]
async fn test_failed_publish_can_be_recovered() {
    let fixture = TestFixture::new().await;
    let id = fixture.approved_item("flaky").await;
    fixture.run_scheduler().await;
    fixture.publisher.fail_next("rate limited").await;

    let response = fixture.sweep().await;
    assert_eq!(response.body["failed"][0]["item_id"], id.as_str());
    assert_eq!(fixture.items.get(&id).unwrap().state, ItemState::Failed);

    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/recover", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["state"], "approved");

    fixture.run_scheduler().await;
    let response = fixture.sweep().await;
    assert_eq!(response.body["published"][0]["item_id"], id.as_str());
    assert_eq!(fixture.publisher.call_count().await, 2);
}

#[tokio::test]
async fn test_confirm_without_manual_mode() {
    let fixture = TestFixture::new().await;
    let id = fixture.approved_item("auto").await;
    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/confirm", id))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_confirmation_flow() {
    let fixture = TestFixture::with_config(TestConfig::with_manual_confirmation()).await;
    let id = fixture.approved_item("needs a human").await;
    fixture.run_scheduler().await;

    let response = fixture.sweep().await;
    assert_eq!(response.body["held"][0], id.as_str());
    assert_eq!(fixture.publisher.call_count().await, 0);

    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/confirm", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["confirmed"], true);

    let response = fixture.sweep().await;
    assert_eq!(response.body["published"][0]["item_id"], id.as_str());

    // Posted items cannot be confirmed again.
    let response = fixture
        .post_empty(&format!("/api/v1/items/{}/confirm", id))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_max_per_sweep_from_config() {
    let fixture = TestFixture::with_config(TestConfig {
        max_per_sweep: Some(1),
        ..Default::default()
    })
    .await;
    fixture.approved_item("one").await;
    fixture.approved_item("two").await;
    fixture.run_scheduler().await;

    let response = fixture.sweep().await;
    assert_eq!(response.body["published"].as_array().unwrap().len(), 1);
    let response = fixture.sweep().await;
    assert_eq!(response.body["published"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Audit
// =============================================================================

#[tokio::test]
async fn test_audit_records_item_history() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_item("audited").await;
    fixture
        .items
        .apply(&id, &Transition::Approve)
        .expect("direct approve");
    fixture
        .post_empty(&format!("/api/v1/items/{}/unapprove", id))
        .await;

    // The writer persists asynchronously.
    let mut total = 0;
    for _ in 0..50 {
        let response = fixture
            .get(&format!("/api/v1/audit?item_id={}", id))
            .await;
        assert_status!(response, StatusCode::OK);
        total = response.body["total"].as_i64().unwrap();
        if total >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    // Created through the API, unapproved through the API; the direct
    // store write is not audited.
    assert_eq!(total, 2);

    let response = fixture
        .get("/api/v1/audit?event_type=item_created")
        .await;
    assert_eq!(response.body["events"][0]["item_id"], id.as_str());
}
