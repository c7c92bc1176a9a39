//! End-to-end tests driving the console router in-process.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use pretty_assertions::assert_eq;
use quickstart_console::{ConsoleState, console_router, panel_router};
use quickstart_core::{
    AdminContext, ContentType, EntryMode, Field, FieldOption, Filter, ListOptions, PanelSchema,
    QuickstartConfig, Record, UiRouteMode,
};
use quickstart_panels::{InMemoryContentTypes, InMemoryRepository, Panel, PanelRegistry};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn rec(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn posts_schema() -> PanelSchema {
    PanelSchema {
        list_fields: vec![
            Field::new("title", "text"),
            Field::new("status", "text"),
            Field::new("slug", "text"),
        ],
        form_fields: vec![
            Field::new("title", "text"),
            Field::new("status", "select").with_options(vec![
                FieldOption::value("draft"),
                FieldOption::value("published"),
            ]),
        ],
        filters: vec![
            Filter::new("status", "select"),
            Filter::new("title", "text").with_label("Title contains"),
        ],
        ..Default::default()
    }
}

fn registry() -> Arc<PanelRegistry> {
    let registry = Arc::new(PanelRegistry::new());
    registry.register(Panel::new(
        "pages",
        PanelSchema::default(),
        Arc::new(InMemoryRepository::with_records(
            "pages",
            vec![
                rec(json!({"id": "home", "title": "Home", "field": "x"})),
                rec(json!({
                    "id": "p1",
                    "locale": "es",
                    "title": "Inicio",
                    "translation": {"meta": {
                        "requested_locale": "es",
                        "resolved_locale": "en",
                        "fallback_used": true
                    }}
                })),
            ],
        )),
    ));
    registry.register(Panel::new(
        "posts",
        posts_schema(),
        Arc::new(InMemoryRepository::with_records(
            "posts",
            vec![
                rec(json!({"id": "1", "title": "First", "status": "draft", "slug": "first"})),
                rec(json!({"id": "2", "title": "Second", "status": "published", "slug": "second"})),
            ],
        )),
    ));
    registry.register(Panel::new(
        "users",
        PanelSchema {
            ui_route_mode: UiRouteMode::Custom,
            list_fields: vec![Field::new("email", "text")],
            ..Default::default()
        },
        Arc::new(InMemoryRepository::with_records(
            "users",
            vec![rec(json!({"id": "u1", "email": "ada@example.com"}))],
        )),
    ));
    registry.register(Panel::new(
        "profile",
        PanelSchema {
            entry_mode: EntryMode::DetailCurrentUser,
            ..Default::default()
        },
        Arc::new(InMemoryRepository::with_records(
            "profile",
            vec![rec(json!({"id": "u1", "name": "Ada"}))],
        )),
    ));
    registry
}

fn content_types(pages_panel_slug: Option<&str>) -> InMemoryContentTypes {
    let mut pages = ContentType::new(
        "pages",
        json!({"type": "object", "properties": {
            "field": {"type": "string"},
            "title": {"type": "string"}
        }}),
    );
    if let Some(slug) = pages_panel_slug {
        pages.capabilities.insert("panel_slug".to_string(), json!(slug));
    }
    let mut articles = ContentType::new(
        "articles",
        json!({"properties": {"title": {"type": "string"}}, "required": ["title"]}),
    );
    articles.status = quickstart_core::ContentTypeStatus::Active;
    articles.name = "Articles".to_string();
    InMemoryContentTypes::new(vec![pages, articles])
}

fn config() -> QuickstartConfig {
    let mut config = QuickstartConfig::default();
    config
        .content
        .routes
        .insert("profile".to_string(), "/admin/me".to_string());
    config
}

fn state_with(config: QuickstartConfig, registry: Arc<PanelRegistry>, panel_slug: Option<&str>) -> ConsoleState {
    ConsoleState::new(config, registry).with_content_types(Arc::new(content_types(panel_slug)))
}

fn app() -> (Router, Arc<PanelRegistry>) {
    let registry = registry();
    let state = state_with(config(), registry.clone(), None);
    let router = console_router(state.clone()).merge(panel_router(state, "users", "/admin/users"));
    (router, registry)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(headers: &HeaderMap) -> &str {
    headers.get(header::LOCATION).unwrap().to_str().unwrap()
}

fn error_body(body: &str) -> Value {
    serde_json::from_str::<Value>(body).unwrap()["error"].clone()
}

#[tokio::test]
async fn test_list_page_and_filtered_api() {
    let (router, _) = app();

    let (status, _, body) = send(&router, get("/admin/content/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("posts-datatable"));
    assert!(body.contains("First"));
    assert!(body.contains("/admin/api/panels/posts"));

    let (status, _, body) = send(&router, get("/admin/api/panels/posts?status=draft")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["records"][0]["title"], "First");
    assert_eq!(json["page"], 1);
}

#[tokio::test]
async fn test_scalar_duplicates_collapse_or_reject() {
    let (router, registry) = app();

    let (status, headers, _) = send(
        &router,
        post_form("/admin/content/pages", "field=temp_123&field=temp_123"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    let target = location(&headers);
    assert!(target.starts_with("/admin/content/pages/"), "{}", target);
    assert!(target.ends_with("/edit"), "{}", target);

    let panel = registry.get("pages", None).unwrap();
    let (records, _) = panel
        .list(&AdminContext::default(), &ListOptions::all())
        .await
        .unwrap();
    assert!(records.iter().any(|r| r.get("field") == Some(&json!("temp_123"))));

    let (status, _, body) = send(
        &router,
        post_form("/admin/content/pages", "field=temp_123&field=temp_456"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body)["text_code"], "INVALID_FORM");
}

#[tokio::test]
async fn test_create_preserves_environment_and_locale() {
    let (router, _) = app();
    let (status, headers, _) = send(
        &router,
        post_form("/admin/content/pages?env=staging&locale=fr", "title=Bonjour"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    let target = location(&headers);
    assert!(target.ends_with("/edit?env=staging&locale=fr"), "{}", target);
}

fn register_esign_panels(registry: &PanelRegistry) {
    for name in ["esign_documents", "esign_agreements"] {
        registry.register(Panel::new(
            name,
            PanelSchema {
                list_fields: vec![Field::new("title", "text")],
                form_fields: vec![Field::new("title", "text")],
                ..Default::default()
            },
            Arc::new(InMemoryRepository::new(name)),
        ));
    }
}

#[tokio::test]
async fn test_create_redirects_to_detail_with_created_marker() {
    let (router, registry) = app();
    register_esign_panels(&registry);

    let (status, headers, _) = send(
        &router,
        post_form("/admin/content/esign_documents?env=staging&locale=fr", "title=Lease"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);

    let panel = registry.get("esign_documents", Some("staging")).unwrap();
    let ctx = AdminContext {
        environment: "staging".to_string(),
        ..Default::default()
    };
    let (records, _) = panel.list(&ctx, &ListOptions::all()).await.unwrap();
    assert_eq!(records.len(), 1);
    let id = records[0]["id"].as_str().unwrap().to_string();

    let target = location(&headers).to_string();
    assert_eq!(
        target,
        format!("/admin/content/esign_documents/{}?env=staging&locale=fr&created=1", id)
    );

    let (status, _, body) = send(&router, get(&target)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Created successfully"));
    assert!(body.contains("Lease"));
}

#[tokio::test]
async fn test_create_redirects_to_edit_with_created_marker() {
    let (router, registry) = app();
    register_esign_panels(&registry);

    let (status, headers, _) = send(
        &router,
        post_form("/admin/content/esign_agreements?env=staging&locale=fr", "title=Terms"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);

    let target = location(&headers).to_string();
    assert!(target.starts_with("/admin/content/esign_agreements/"), "{}", target);
    assert!(
        target.ends_with("/edit?env=staging&locale=fr&created=1"),
        "{}",
        target
    );

    let (status, _, body) = send(&router, get(&target)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Created successfully"));

    // Plain panels land on edit without the marker.
    let (_, headers, _) = send(&router, post_form("/admin/content/posts", "title=Third")).await;
    assert!(!location(&headers).contains("created="));
}

#[tokio::test]
async fn test_list_api_tolerates_huge_page() {
    let (router, _) = app();
    let (status, _, body) = send(
        &router,
        get("/admin/api/panels/posts?page=18446744073709551615&per_page=500"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["records"], json!([]));
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], u64::MAX);
}

#[tokio::test]
async fn test_fallback_translation_update_blocked() {
    let (router, _) = app();
    let (status, _, body) = send(
        &router,
        post_form("/admin/content/pages/p1?locale=es", "title=Hola"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let error = error_body(&body);
    assert_eq!(error["text_code"], "TRANSLATION_FALLBACK_EDIT_BLOCKED");
    assert_eq!(error["metadata"]["requested_locale"], "es");
    assert_eq!(error["metadata"]["resolved_locale"], "en");
    assert_eq!(error["metadata"]["fallback_used"], true);
}

#[tokio::test]
async fn test_update_and_delete_redirects() {
    let (router, registry) = app();

    let (status, headers, _) = send(
        &router,
        post_form("/admin/content/pages/home?locale=en", "title=Welcome"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), "/admin/content/pages/home/edit?locale=en");

    let (status, headers, _) = send(&router, post_form("/admin/content/pages/home/delete", "")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), "/admin/content/pages");

    let panel = registry.get("pages", None).unwrap();
    let err = panel.get(&AdminContext::default(), "home").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_alias_redirects() {
    let (router, _) = app();
    let (status, headers, _) = send(&router, get("/admin/pages?status=draft")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), "/admin/content/pages?status=draft");

    let (_, headers, _) = send(&router, get("/admin/pages/home/edit")).await;
    assert_eq!(location(&headers), "/admin/content/pages/home/edit");

    let state = state_with(config(), registry(), Some("news"));
    let router = console_router(state);
    let (status, headers, _) = send(&router, get("/admin/pages?status=draft")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), "/admin/content/news?status=draft");
}

#[tokio::test]
async fn test_schema_compatibility_report() {
    let (router, _) = app();
    let (status, _, body) = send(
        &router,
        post_json(
            "/admin/api/content_types/compatibility",
            json!({
                "slug": "articles",
                "schema": {
                    "properties": {"title": {"type": "integer"}, "body": {"type": "string"}},
                    "required": ["title", "body"]
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["compatible"], false);
    let paths: Vec<&str> = report["breaking_changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["properties.body", "properties.title.type"]);
    assert_eq!(report["warnings"], json!([]));
}

#[tokio::test]
async fn test_compatibility_requires_key_and_schema() {
    let (router, _) = app();
    let (status, _, body) = send(
        &router,
        post_json("/admin/api/content_types/compatibility", json!({"schema": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body)["text_code"], "TYPE_REQUIRED");

    let (status, _, body) = send(
        &router,
        post_json("/admin/api/content_types/compatibility", json!({"slug": "pages"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body)["text_code"], "SCHEMA_REQUIRED");

    let request = Request::builder()
        .method("POST")
        .uri("/admin/api/content_types/compatibility")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body)["text_code"], "INVALID_JSON");
}

#[tokio::test]
async fn test_activation_promotes_pending_versions() {
    let (router, _) = app();

    for (round, title_type) in [(1, "string"), (2, "integer")] {
        let schema = json!({"properties": {"title": {"type": title_type}}});
        let (status, _, _) = send(
            &router,
            post_json(
                "/admin/api/content_types/compatibility",
                json!({"slug": "pages", "schema": schema}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(
            &router,
            post_json("/admin/api/content_types/pages/status", json!({"status": "active"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let saved: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(saved["content_type"]["status"], "active");
        assert_eq!(saved["version"]["version"], round.to_string());
    }

    let (status, _, body) = send(&router, get("/admin/api/content_types/pages/versions")).await;
    assert_eq!(status, StatusCode::OK);
    let history: Value = serde_json::from_str(&body).unwrap();
    let versions = history["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], "2");
    assert_eq!(versions[0]["schema"]["properties"]["title"]["type"], "integer");
    assert_eq!(versions[1]["version"], "1");
    assert_eq!(versions[1]["schema"]["properties"]["title"]["type"], "string");
}

#[tokio::test]
async fn test_builder_feature_gate() {
    let mut config = config();
    config.features.content_type_builder = false;
    let router = console_router(state_with(config, registry(), None));

    let (status, _, body) = send(&router, get("/admin/api/content_types")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_body(&body)["text_code"], "FEATURE_DISABLED");

    let router = console_router(ConsoleState::new(QuickstartConfig::default(), registry()));
    let (status, _, body) = send(&router, get("/admin/api/content_types")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&body)["text_code"], "CONTENT_SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_custom_owned_panel_hidden_from_generic_routes() {
    let (router, _) = app();

    let (status, _, body) = send(&router, get("/admin/content/users")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_body(&body)["text_code"], "PANEL_NOT_FOUND");

    let (status, _, body) = send(&router, get("/admin/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ada@example.com"));

    let (status, _, body) = send(&router, get("/admin/users/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/admin/users/u1/edit"));
}

#[tokio::test]
async fn test_detail_current_user_entry_mode() {
    let (router, _) = app();

    let (status, _, _) = send(&router, get("/admin/me")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/admin/me")
        .header("x-user-id", "u1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ada"));
}

#[tokio::test]
async fn test_content_index_lists_active_types() {
    let (router, _) = app();
    let (status, _, body) = send(&router, get("/admin/content")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Articles"));
    assert!(body.contains("/admin/content/articles"));
    assert!(!body.contains("/admin/content/pages"));
}

#[tokio::test]
async fn test_new_form_requires_schema() {
    let (router, _) = app();

    let (status, _, body) = send(&router, get("/admin/content/pages/new")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="field""#));

    let (status, _, body) = send(&router, get("/admin/content/profile/new")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_body(&body)["text_code"], "SCHEMA_REQUIRED");
}

#[tokio::test]
async fn test_builder_api_honours_configured_body_limit() {
    let mut config = config();
    config.server.body_limit_bytes = 32;
    let router = console_router(state_with(config, registry(), None));

    let (status, _, body) = send(
        &router,
        post_json(
            "/admin/api/content_types/compatibility",
            json!({"slug": "pages", "schema": {"properties": {"title": {"type": "string"}}}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body)["text_code"], "INVALID_JSON");
}
