use axum::http::StatusCode;
use http_body_util::BodyExt;
use ontdek_core::config::Config;
use ontdek_core::db::Database;
use ontdek_server::state::AppState;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app_with_config(config: Config) -> axum::Router {
    let db = Database::open_in_memory().unwrap();
    let state = AppState::new(std::path::PathBuf::from("."), config, db);
    ontdek_server::build_router(state)
}

fn test_app() -> axum::Router {
    app_with_config(Config::new("Ontdek Polen"))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}

async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body), None).await
}

async fn patch_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, Some(body), None).await
}

async fn delete(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, None, None).await
}

/// Create one destination per title, in order. Returns their ids.
async fn seed_destinations(app: &axum::Router, titles: &[&str]) -> Vec<i64> {
    let mut ids = Vec::new();
    for title in titles {
        let (status, body) = post_json(app, "/api/destinations", json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED, "create {title}: {body}");
        ids.push(body["id"].as_i64().unwrap());
    }
    ids
}

/// `(slug, ranking)` pairs of the active destinations in display order.
async fn order(app: &axum::Router) -> Vec<(String, i64)> {
    let (status, body) = get(app, "/api/destinations").await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["slug"].as_str().unwrap().to_string(),
                e["ranking"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn pairs(expected: &[(&str, i64)]) -> Vec<(String, i64)> {
    expected.iter().map(|(s, r)| (s.to_string(), *r)).collect()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get(&test_app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["site"], "Ontdek Polen");
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_entries_are_appended() {
    let app = test_app();
    seed_destinations(&app, &["Krakow", "Gdansk", "Warsaw", "Wroclaw"]).await;
    assert_eq!(
        order(&app).await,
        pairs(&[("krakow", 0), ("gdansk", 1), ("warsaw", 2), ("wroclaw", 3)])
    );
}

#[tokio::test]
async fn patch_ranking_moves_entry_up() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C", "D"]).await;

    let (status, body) = patch_json(
        &app,
        &format!("/api/destinations/{}", ids[2]),
        json!({ "ranking": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ranking"], 0);

    assert_eq!(
        order(&app).await,
        pairs(&[("c", 0), ("a", 1), ("b", 2), ("d", 3)])
    );
}

#[tokio::test]
async fn patch_ranking_moves_entry_down() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C", "D"]).await;

    let (status, _) = patch_json(
        &app,
        &format!("/api/destinations/{}", ids[0]),
        json!({ "ranking": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        order(&app).await,
        pairs(&[("b", 0), ("c", 1), ("d", 2), ("a", 3)])
    );
}

#[tokio::test]
async fn patch_with_fields_and_ranking_applies_both() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C"]).await;

    let (status, body) = patch_json(
        &app,
        &format!("/api/destinations/{}", ids[2]),
        json!({ "title": "Zakopane", "published": true, "ranking": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Zakopane");
    assert_eq!(body["published"], true);
    assert_eq!(body["ranking"], 1);
}

#[tokio::test]
async fn out_of_range_ranking_is_rejected_without_changes() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C", "D"]).await;
    let before = order(&app).await;

    for bad in [4, -1, 100] {
        let (status, body) = patch_json(
            &app,
            &format!("/api/destinations/{}", ids[1]),
            json!({ "title": "Renamed", "ranking": bad }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "ranking {bad}");
        assert!(body["error"].as_str().unwrap().contains("invalid ranking"));
    }

    // the title change in the same request was rolled back too
    assert_eq!(order(&app).await, before);
    let (_, entry) = get(&app, &format!("/api/destinations/{}", ids[1])).await;
    assert_eq!(entry["title"], "B");
}

#[tokio::test]
async fn non_integer_ranking_returns_400_with_json_error() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B"]).await;
    let uri = format!("/api/destinations/{}", ids[0]);

    for body in [json!({ "ranking": 1.5 }), json!({ "ranking": "x" })] {
        let (status, resp) = patch_json(&app, &uri, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(resp["error"].is_string(), "{body}: {resp}");
    }
    assert_eq!(order(&app).await, pairs(&[("a", 0), ("b", 1)]));
}

#[tokio::test]
async fn patch_unknown_entry_returns_404() {
    let app = test_app();
    seed_destinations(&app, &["A"]).await;
    let (status, body) = patch_json(&app, "/api/destinations/999", json!({ "ranking": 0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_collection_returns_404() {
    let (status, _) = get(&test_app(), "/api/hotels").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_with_ranking_inserts_at_position() {
    let app = test_app();
    seed_destinations(&app, &["A", "B", "C"]).await;

    let (status, body) = post_json(
        &app,
        "/api/destinations",
        json!({ "title": "X", "ranking": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ranking"], 1);
    assert_eq!(
        order(&app).await,
        pairs(&[("a", 0), ("x", 1), ("b", 2), ("c", 3)])
    );

    let (status, _) = post_json(
        &app,
        "/api/destinations",
        json!({ "title": "Y", "ranking": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order(&app).await.len(), 4);
}

// ---------------------------------------------------------------------------
// Soft delete / restore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_compacts_order_and_append_does_not_collide() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C", "D"]).await;

    let (status, body) = delete(&app, &format!("/api/destinations/{}", ids[1])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_deleted"], true);
    assert_eq!(body["ranking"], 1);

    assert_eq!(order(&app).await, pairs(&[("a", 0), ("c", 1), ("d", 2)]));

    seed_destinations(&app, &["E"]).await;
    assert_eq!(
        order(&app).await,
        pairs(&[("a", 0), ("c", 1), ("d", 2), ("e", 3)])
    );

    let (_, all) = get(&app, "/api/destinations?include_deleted=true").await;
    assert_eq!(all.as_array().unwrap().len(), 5);

    // deleted entries are no longer addressable for edits
    let (status, _) = patch_json(
        &app,
        &format!("/api/destinations/{}", ids[1]),
        json!({ "ranking": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = delete(&app, &format!("/api/destinations/{}", ids[1])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn restore_returns_entry_to_its_old_place() {
    let app = test_app();
    let ids = seed_destinations(&app, &["A", "B", "C"]).await;
    delete(&app, &format!("/api/destinations/{}", ids[1])).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/destinations/{}/restore", ids[1]),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_deleted"], false);
    assert_eq!(
        order(&app).await,
        pairs(&[("a", 0), ("b", 1), ("c", 2)])
    );
}

#[tokio::test]
async fn normalize_on_dense_collection_changes_nothing() {
    let app = test_app();
    seed_destinations(&app, &["A", "B"]).await;
    let (status, body) = post_json(&app, "/api/destinations/normalize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection"], "destinations");
    assert_eq!(body["changed"], 0);
}

// ---------------------------------------------------------------------------
// Slugs and links
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookup_by_slug_and_duplicate_slug_conflict() {
    let app = test_app();
    seed_destinations(&app, &["Kraków"]).await;

    let (status, body) = get(&app, "/api/destinations/by-slug/krakow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Kraków");

    let (status, _) = post_json(
        &app,
        "/api/destinations",
        json!({ "title": "Krakow again", "slug": "krakow" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = get(&app, "/api/destinations/by-slug/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guides_link_to_active_destinations() {
    let app = test_app();
    let ids = seed_destinations(&app, &["Gdansk"]).await;

    let (status, guide) = post_json(
        &app,
        "/api/guides",
        json!({ "title": "Three days in Gdansk", "destination_id": ids[0] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(guide["destination_id"], ids[0]);
    assert_eq!(guide["ranking"], 0);

    let (status, _) = post_json(
        &app,
        "/api/guides",
        json!({ "title": "Nowhere", "destination_id": 999 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        &app,
        "/api/pages",
        json!({ "title": "About", "destination_id": ids[0] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collections_are_ranked_independently() {
    let app = test_app();
    seed_destinations(&app, &["A", "B"]).await;
    let (_, page) = post_json(&app, "/api/pages", json!({ "title": "About" })).await;
    assert_eq!(page["ranking"], 0);
    let (_, highlight) = post_json(&app, "/api/highlights", json!({ "title": "Tatra" })).await;
    assert_eq!(highlight["ranking"], 0);
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn settings_round_trip() {
    let app = test_app();
    let (status, body) = get(&app, "/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["site_name"], "Ontdek Polen");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({ "site_name": "Ontdek Polen", "tagline": "Reizen naar Polen" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tagline"], "Reizen naar Polen");

    let (_, body) = get(&app, "/api/settings").await;
    assert_eq!(body["tagline"], "Reizen naar Polen");
    assert!(body["updated_at"].is_string());
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_lifecycle() {
    let app = test_app();
    let (status, user) = post_json(
        &app,
        "/api/users",
        json!({ "email": "Ania@Ontdek.nl", "display_name": "Ania" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ania@ontdek.nl");
    assert_eq!(user["role"], "editor");
    let id = user["id"].as_i64().unwrap();

    let (status, _) = post_json(
        &app,
        "/api/users",
        json!({ "email": "ania@ontdek.nl", "display_name": "Again" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post_json(
        &app,
        "/api/users",
        json!({ "email": "not-an-email", "display_name": "X" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, user) = patch_json(&app, &format!("/api/users/{id}"), json!({ "role": "admin" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "admin");

    let (status, _) = delete(&app, &format!("/api/users/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, users) = get(&app, "/api/users").await;
    assert!(users.as_array().unwrap().is_empty());
    let (status, _) = get(&app, "/api/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Editor token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn editor_token_guards_writes() {
    let mut config = Config::new("Ontdek Polen");
    config.auth.editor_token = Some("0123456789abcdef".into());
    let app = app_with_config(config);

    let (status, body) = post_json(&app, "/api/destinations", json!({ "title": "A" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &app,
        "POST",
        "/api/destinations",
        Some(json!({ "title": "A" })),
        Some("0123456789abcdef"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/api/destinations", None, Some("0123456789abcdef")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn anonymous_readers_only_see_published_content() {
    const TOKEN: &str = "0123456789abcdef";
    let mut config = Config::new("Ontdek Polen");
    config.auth.editor_token = Some(TOKEN.into());
    let app = app_with_config(config);

    let editor = |method: &'static str, uri: String, body: Option<serde_json::Value>| {
        let app = app.clone();
        async move { send(&app, method, &uri, body, Some(TOKEN)).await }
    };

    let (_, draft) = editor("POST", "/api/pages".into(), Some(json!({ "title": "Draft" }))).await;
    let (_, live) = editor(
        "POST",
        "/api/pages".into(),
        Some(json!({ "title": "Live", "published": true })),
    )
    .await;
    let (_, gone) = editor(
        "POST",
        "/api/pages".into(),
        Some(json!({ "title": "Gone", "published": true })),
    )
    .await;
    editor("DELETE", format!("/api/pages/{}", gone["id"]), None).await;
    let (status, _) = editor(
        "POST",
        "/api/users".into(),
        Some(json!({ "email": "ewa@example.pl", "display_name": "Ewa" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // the user directory is editor-only
    for uri in ["/api/users", "/api/users/1"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized");
    }

    // drafts and deleted rows stay hidden
    let (status, body) = get(&app, "/api/pages").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body.as_array().unwrap().iter().map(|e| e["title"].clone()).collect();
    assert_eq!(titles, [json!("Live")]);

    let (status, _) = get(&app, "/api/pages?include_deleted=true").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for id in [&draft["id"], &gone["id"]] {
        let (status, _) = get(&app, &format!("/api/pages/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = get(&app, "/api/pages/by-slug/draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, &format!("/api/pages/{}", live["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Live");
    let (status, _) = get(&app, "/api/pages/by-slug/live").await;
    assert_eq!(status, StatusCode::OK);

    // editors see everything
    let (_, body) = editor("GET", "/api/pages?include_deleted=true".into(), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    let (status, _) = editor("GET", format!("/api/pages/{}", draft["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = editor("GET", "/api/users".into(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["email"], "ewa@example.pl");
}

// ---------------------------------------------------------------------------
// On-disk site
// ---------------------------------------------------------------------------

#[tokio::test]
async fn state_opened_from_disk_persists_rankings() {
    let dir = TempDir::new().unwrap();
    Config::new("Ontdek Polen").save(dir.path()).unwrap();

    let app = ontdek_server::build_router(AppState::open(dir.path()).unwrap());
    let ids = seed_destinations(&app, &["A", "B"]).await;
    patch_json(
        &app,
        &format!("/api/destinations/{}", ids[1]),
        json!({ "ranking": 0 }),
    )
    .await;
    drop(app);

    let app = ontdek_server::build_router(AppState::open(dir.path()).unwrap());
    assert_eq!(order(&app).await, pairs(&[("b", 0), ("a", 1)]));
}
