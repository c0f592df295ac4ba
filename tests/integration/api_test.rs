//! Integration tests for the REST API.

use http::StatusCode;
use uuid::Uuid;

use studyhub_entity::achievement::RequirementType;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["relay"]["connections"], 0);
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let app = TestApp::new();
    let user_id = app.create_test_user("ana").await;

    let response = app
        .request("GET", &format!("/api/profiles/{user_id}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "ana");
    assert_eq!(response.body["level"], 1);
    assert_eq!(response.body["total_study_time"], 0);

    let missing = app
        .request("GET", &format!("/api/profiles/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new();
    app.create_test_user("ana").await;

    let response = app
        .request(
            "POST",
            "/api/profiles",
            Some(serde_json::json!({
                "id": Uuid::new_v4(),
                "username": "ana",
                "display_name": "Another Ana",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_session_endpoints_require_identity() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/sessions", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_manual_session_credits_profile() {
    let app = TestApp::new();
    let user_id = app.create_test_user("rui").await;

    let response = app
        .request(
            "POST",
            "/api/sessions/manual",
            Some(serde_json::json!({
                "subject": "linear algebra",
                "duration_minutes": 45,
            })),
            Some(user_id),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["duration_minutes"], 45);
    assert_eq!(response.body["is_active"], false);
    assert_eq!(response.body["session_type"], "manual");

    let profile = app
        .request("GET", &format!("/api/profiles/{user_id}"), None, None)
        .await;
    assert_eq!(profile.body["total_study_time"], 45);
    assert_eq!(profile.body["experience_points"], 45);
    assert_eq!(profile.body["current_streak"], 1);

    let history = app
        .request("GET", "/api/sessions", None, Some(user_id))
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_session_validation() {
    let app = TestApp::new();
    let user_id = app.create_test_user("rui").await;

    let response = app
        .request(
            "POST",
            "/api/sessions/manual",
            Some(serde_json::json!({
                "subject": "x",
                "duration_minutes": 0,
            })),
            Some(user_id),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_manual_session_reverses_credit() {
    let app = TestApp::new();
    let user_id = app.create_test_user("rui").await;

    let created = app
        .request(
            "POST",
            "/api/sessions/manual",
            Some(serde_json::json!({
                "subject": "optics",
                "duration_minutes": 60,
            })),
            Some(user_id),
        )
        .await;
    let session_id = created.body["id"].as_str().unwrap().to_string();

    let deleted = app
        .request(
            "DELETE",
            &format!("/api/sessions/{session_id}"),
            None,
            Some(user_id),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let profile = app
        .request("GET", &format!("/api/profiles/{user_id}"), None, None)
        .await;
    assert_eq!(profile.body["total_study_time"], 0);

    // Deleting someone else's session is a 404.
    let foreign = app
        .request(
            "DELETE",
            &format!("/api/sessions/{session_id}"),
            None,
            Some(Uuid::new_v4()),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_active_session_is_none_by_default() {
    let app = TestApp::new();
    let user_id = app.create_test_user("rui").await;

    let response = app
        .request("GET", "/api/sessions/active", None, Some(user_id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_null());
}

#[tokio::test]
async fn test_group_membership_flow() {
    let app = TestApp::new();
    let owner = app.create_test_user("owner").await;
    let member = app.create_test_user("member").await;

    let created = app
        .request(
            "POST",
            "/api/groups",
            Some(serde_json::json!({
                "name": "Calculus crew",
                "subject": "calculus",
            })),
            Some(owner),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let group_id = created.body["id"].as_str().unwrap().to_string();

    // The creator is already a member.
    let membership = app
        .request(
            "GET",
            &format!("/api/groups/{group_id}/membership"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(membership.body["is_member"], true);

    // A second user joins, shows up in listings, and can leave again.
    let joined = app
        .request(
            "POST",
            &format!("/api/groups/{group_id}/members"),
            None,
            Some(member),
        )
        .await;
    assert_eq!(joined.status, StatusCode::CREATED);

    let rejoined = app
        .request(
            "POST",
            &format!("/api/groups/{group_id}/members"),
            None,
            Some(member),
        )
        .await;
    assert_eq!(rejoined.status, StatusCode::CONFLICT);

    let members = app
        .request(
            "GET",
            &format!("/api/groups/{group_id}/members"),
            None,
            None,
        )
        .await;
    assert_eq!(members.body.as_array().unwrap().len(), 2);

    let left = app
        .request(
            "DELETE",
            &format!("/api/groups/{group_id}/members"),
            None,
            Some(member),
        )
        .await;
    assert_eq!(left.status, StatusCode::NO_CONTENT);

    let membership = app
        .request(
            "GET",
            &format!("/api/groups/{group_id}/membership"),
            None,
            Some(member),
        )
        .await;
    assert_eq!(membership.body["is_member"], false);
}

#[tokio::test]
async fn test_achievements_progress_and_award() {
    let app = TestApp::new();
    let user_id = app.create_test_user("lia").await;
    app.seed_achievement("Focused Hour", RequirementType::StudyTime, 60, 10);
    app.seed_achievement("First Steps", RequirementType::Sessions, 1, 5);

    app.request(
        "POST",
        "/api/sessions/manual",
        Some(serde_json::json!({
            "subject": "history",
            "duration_minutes": 90,
        })),
        Some(user_id),
    )
    .await;

    let response = app
        .request("GET", "/api/achievements", None, Some(user_id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let achievements = response.body.as_array().unwrap();
    assert_eq!(achievements.len(), 2);
    for achievement in achievements {
        assert_eq!(achievement["is_earned"], true);
    }
}

#[tokio::test]
async fn test_leaderboard_orders_by_study_time() {
    let app = TestApp::new();
    let slow = app.create_test_user("slow").await;
    let fast = app.create_test_user("fast").await;

    for (user, minutes) in [(slow, 10), (fast, 120)] {
        app.request(
            "POST",
            "/api/sessions/manual",
            Some(serde_json::json!({
                "subject": "reading",
                "duration_minutes": minutes,
            })),
            Some(user),
        )
        .await;
    }

    let response = app.request("GET", "/api/leaderboard", None, None).await;
    let entries = response.body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["username"], "fast");
    assert_eq!(entries[1]["username"], "slow");
}
