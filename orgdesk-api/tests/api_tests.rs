/// HTTP tests for the OrgDesk API
///
/// Every request runs through the real router and middleware stack against
/// an in-memory store.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use orgdesk_shared::auth::jwt::{create_token, Claims};
use orgdesk_shared::store::StoreOp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_store_state() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.store.fail_on(StoreOp::Ping);
    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/v1/org", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let mut forged = ctx.user("mallory@example.com");
    forged.token = create_token(
        &Claims::new(forged.id, forged.email.clone()),
        "some-other-secret-that-is-long-enough-too",
    )
    .unwrap();
    let (status, _) = ctx.send("GET", "/v1/org", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_org_before_and_after_onboarding() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");

    let (status, body) = ctx.send("GET", "/v1/org", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "has_organization": false }));

    let org_id = ctx.onboard(&ada, "Acme").await;

    let (status, body) = ctx.send("GET", "/v1/org", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_organization"], true);
    assert_eq!(body["org_id"], org_id.as_str());
    assert_eq!(body["role"], "owner");
}

#[tokio::test]
async fn test_onboarding_flow_end_to_end() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    let bob = ctx.user("bob@example.com");

    let org_id = ctx.onboard(&ada, "Acme").await;

    let (status, invite) = ctx
        .send("POST", "/v1/invites", Some(&ada), Some(json!({ "email": "Bob@Example.com" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invite["email"], "bob@example.com");
    assert_eq!(invite["accepted"], false);
    let token = invite["token"].as_str().unwrap().to_string();

    let (status, pending) = ctx.send("GET", "/v1/invites", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["invites"].as_array().unwrap().len(), 1);

    let (status, accepted) = ctx
        .send("POST", "/v1/invites/accept", Some(&bob), Some(json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted, json!({ "success": true, "org_id": org_id }));

    let (_, body) = ctx.send("GET", "/v1/org", Some(&bob), None).await;
    assert_eq!(body["role"], "member");

    let project_id = ctx.project(&bob, "Launch").await;

    let (status, task) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&bob),
            Some(json!({ "title": "Write docs" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["completed"], false);
    let task_uri = format!("/v1/projects/{}/tasks/{}", project_id, task["id"].as_str().unwrap());

    let (status, task) = ctx
        .send("PATCH", &task_uri, Some(&ada), Some(json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["completed"], true);

    let (status, detail) = ctx
        .send("GET", &format!("/v1/projects/{}", project_id), Some(&ada), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Launch");
    assert_eq!(detail["tasks"].as_array().unwrap().len(), 1);

    let (status, listing) = ctx.send("GET", "/v1/projects", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["projects"][0]["task_count"], 1);

    let (status, body) = ctx.send("DELETE", &task_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (status, members) = ctx.send("GET", "/v1/org/members", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members["members"].as_array().unwrap().len(), 2);

    let (status, activity) = ctx.send("GET", "/v1/activity", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = activity["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec![
            "task.deleted",
            "task.toggled",
            "task.created",
            "project.created",
            "member.joined",
            "member.invited",
            "organization.created",
        ]
    );
}

#[tokio::test]
async fn test_tenant_routes_require_organization() {
    let ctx = TestContext::new();
    let drifter = ctx.user("drifter@example.com");

    for (method, uri) in [
        ("GET", "/v1/projects"),
        ("GET", "/v1/org/members"),
        ("GET", "/v1/activity"),
        ("GET", "/v1/invites"),
    ] {
        let (status, body) = ctx.send(method, uri, Some(&drifter), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(body["error"], "no_organization", "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_member_cannot_invite() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    let bob = ctx.user("bob@example.com");
    ctx.onboard(&ada, "Acme").await;

    let (_, invite) = ctx
        .send("POST", "/v1/invites", Some(&ada), Some(json!({ "email": bob.email.as_str() })))
        .await;
    ctx.send("POST", "/v1/invites/accept", Some(&bob), Some(json!({ "token": invite["token"] })))
        .await;

    let (status, body) = ctx
        .send("POST", "/v1/invites", Some(&bob), Some(json!({ "email": "carol@example.com" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_invite_cannot_be_reused() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    let bob = ctx.user("bob@example.com");
    ctx.onboard(&ada, "Acme").await;

    let (_, invite) = ctx
        .send("POST", "/v1/invites", Some(&ada), Some(json!({ "email": bob.email.as_str() })))
        .await;
    let accept = json!({ "token": invite["token"] });

    let (status, _) = ctx.send("POST", "/v1/invites/accept", Some(&bob), Some(accept.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send("POST", "/v1/invites/accept", Some(&bob), Some(accept)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(ctx.store.membership_count(), 2);
}

#[tokio::test]
async fn test_invite_for_other_email_is_invalid() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    let eve = ctx.user("eve@example.com");
    ctx.onboard(&ada, "Acme").await;

    let (_, invite) = ctx
        .send("POST", "/v1/invites", Some(&ada), Some(json!({ "email": "bob@example.com" })))
        .await;

    let (status, body) = ctx
        .send("POST", "/v1/invites/accept", Some(&eve), Some(json!({ "token": invite["token"] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_invite");

    let (status, body) = ctx
        .send("POST", "/v1/invites/accept", Some(&eve), Some(json!({ "token": "garbage" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_invite");
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");

    let (status, body) = ctx
        .send("POST", "/v1/organizations", Some(&ada), Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .send("POST", "/v1/organizations", Some(&ada), Some(json!({ "name": "   " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.store.organization_count(), 0);

    ctx.onboard(&ada, "Acme").await;
    let (status, _) = ctx
        .send("POST", "/v1/projects", Some(&ada), Some(json!({ "name": " \t " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.store.project_count(), 0);
}

#[tokio::test]
async fn test_second_organization_is_conflict() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    ctx.onboard(&ada, "Acme").await;

    let (status, _) = ctx
        .send("POST", "/v1/organizations", Some(&ada), Some(json!({ "name": "Other" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ctx.store.organization_count(), 1);
}

#[tokio::test]
async fn test_other_tenants_rows_are_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    let zed = ctx.user("zed@example.com");
    ctx.onboard(&ada, "Acme").await;
    ctx.onboard(&zed, "Zeta").await;

    let project_id = ctx.project(&ada, "Secret").await;
    let (_, task) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&ada),
            Some(json!({ "title": "Hidden" })),
        )
        .await;
    let task_uri = format!("/v1/projects/{}/tasks/{}", project_id, task["id"].as_str().unwrap());

    let (status, body) = ctx
        .send("GET", &format!("/v1/projects/{}", project_id), Some(&zed), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = ctx
        .send("PATCH", &task_uri, Some(&zed), Some(json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.send("DELETE", &task_uri, Some(&zed), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&zed),
            Some(json!({ "title": "Intruder" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = ctx.send("GET", "/v1/projects", Some(&zed), None).await;
    assert_eq!(listing["projects"], json!([]));

    let (_, detail) = ctx
        .send("GET", &format!("/v1/projects/{}", project_id), Some(&ada), None)
        .await;
    assert_eq!(detail["tasks"][0]["completed"], false);
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    ctx.onboard(&ada, "Acme").await;

    let (status, _) = ctx
        .send("GET", &format!("/v1/projects/{}", Uuid::new_v4()), Some(&ada), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_membership_lookup_failure_is_unavailable_not_no_org() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    ctx.onboard(&ada, "Acme").await;

    ctx.store.fail_on(StoreOp::FindMembership);

    let (status, body) = ctx.send("GET", "/v1/org", Some(&ada), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_onboarding_partial_failure_is_reported() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");

    ctx.store.fail_on(StoreOp::InsertMembership);

    let (status, body) = ctx
        .send("POST", "/v1/organizations", Some(&ada), Some(json!({ "name": "Acme" })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "partial_failure");
    assert_eq!(ctx.store.organization_count(), 0);

    ctx.store.clear_failures();
    let (_, body) = ctx.send("GET", "/v1/org", Some(&ada), None).await;
    assert_eq!(body["has_organization"], false);
}

#[tokio::test]
async fn test_activity_limit_is_applied() {
    let ctx = TestContext::new();
    let ada = ctx.user("ada@example.com");
    ctx.onboard(&ada, "Acme").await;

    for i in 0..4 {
        ctx.project(&ada, &format!("Project {}", i)).await;
    }

    let (status, body) = ctx.send("GET", "/v1/activity?limit=2", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "project.created");

    let (_, body) = ctx.send("GET", "/v1/activity?limit=0", Some(&ada), None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    let (_, body) = ctx.send("GET", "/v1/activity", Some(&ada), None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 5);
}
