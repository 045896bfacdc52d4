use crate::common::{self, configured, post_deploy, Call, FakeContents};
use cads::config::{Config, ProjectCredentials};
use cads::github::{ContentsError, FileLookup};
use cads::server::api::deploy::MAX_BODY_BYTES;
use chrono::DateTime;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_deploy_with_project_expect_success_payload() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) = post_deploy(
        &app,
        json!({"filename": "a.txt", "content": "hi", "project": "foo"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["project"], "foo");
    assert_eq!(data["repo"], "u/r");
    assert_eq!(data["filename"], "a.txt");
    assert_eq!(data["url"], "X");
    assert_eq!(data["sha"], "S1");
    assert_eq!(data["commit"], "S2");
    let timestamp = data["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[actix_web::test]
async fn test_deploy_with_project_expect_project_credentials_used() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    post_deploy(
        &app,
        json!({"filename": "a.txt", "content": "hi", "project": "foo"}),
    )
    .await;
    let credentials = ProjectCredentials {
        repository: "u/r".into(),
        token: "t".into(),
    };
    let calls = contents.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::Lookup {
            credentials: credentials.clone(),
            path: "a.txt".into(),
        }
    );
    let Call::Put {
        credentials: put_credentials,
        path,
        body,
    } = &calls[1]
    else {
        panic!("second call should be the write");
    };
    assert_eq!(put_credentials, &credentials);
    assert_eq!(path, "a.txt");
    assert_eq!(body.content, "aGk=");
    assert_eq!(body.message, "CADS: Update a.txt");
}

#[actix_web::test]
async fn test_deploy_without_project_expect_default_label_and_repo() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) =
        post_deploy(&app, json!({"filename": "index.html", "content": "<p>"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["project"], "default");
    assert_eq!(body["data"]["repo"], "u/default");
}

#[actix_web::test]
async fn test_deploy_with_message_expect_message_used() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    post_deploy(
        &app,
        json!({"filename": "a.txt", "content": "hi", "message": "Deploy v22.8"}),
    )
    .await;
    assert_eq!(contents.put_body().message, "Deploy v22.8");
}

#[actix_web::test]
async fn test_deploy_when_file_missing_expect_no_sha_in_write() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    let body = serde_json::to_value(contents.put_body()).unwrap();
    assert!(body.get("sha").is_none());
}

#[actix_web::test]
async fn test_deploy_when_file_exists_expect_sha_in_write() {
    let contents = FakeContents::new(
        FileLookup::Found { sha: "abc".into() },
        Ok(common::upserted("X", "S1", "S2")),
    );
    let app = common::initialize_app(configured(), &contents).await;
    post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    let body = serde_json::to_value(contents.put_body()).unwrap();
    assert_eq!(body["sha"], "abc");
}

#[actix_web::test]
async fn test_deploy_when_lookup_unreachable_expect_write_as_new_file() {
    let contents = FakeContents::new(
        FileLookup::Unreachable("dns error".into()),
        Ok(common::upserted("X", "S1", "S2")),
    );
    let app = common::initialize_app(configured(), &contents).await;
    let (status, _) = post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    assert_eq!(status, 200);
    assert_eq!(contents.put_body().sha, None);
}

#[actix_web::test]
async fn test_deploy_when_filename_or_content_missing_expect_400_without_calls() {
    let bodies = [
        json!({"content": "hi"}),
        json!({"filename": "a.txt"}),
        json!({}),
        json!({"filename": "", "content": ""}),
        json!({"filename": "a.txt", "content": ""}),
    ];
    for request in bodies {
        let contents = FakeContents::fresh();
        let app = common::initialize_app(configured(), &contents).await;
        let (status, body) = post_deploy(&app, request.clone()).await;
        assert_eq!(status, 400, "{request}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "filename and content are required");
        assert_eq!(contents.call_count(), 0);
    }
}

#[actix_web::test]
async fn test_deploy_when_body_not_json_expect_400_uniform_shape() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let req = actix_web::test::TestRequest::post()
        .uri("/deploy")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert_eq!(contents.call_count(), 0);
}

#[actix_web::test]
async fn test_deploy_when_deploy_key_mismatch_expect_401_without_calls() {
    for supplied in [json!("wrong"), json!(null)] {
        let contents = FakeContents::fresh();
        let config = configured().with_deploy_key("secret");
        let app = common::initialize_app(config, &contents).await;
        let (status, body) = post_deploy(
            &app,
            json!({"filename": "a.txt", "content": "hi", "deployKey": supplied}),
        )
        .await;
        assert_eq!(status, 401);
        assert_eq!(body["success"], false);
        assert_eq!(contents.call_count(), 0);
    }
}

#[actix_web::test]
async fn test_deploy_when_deploy_key_matches_expect_success() {
    let contents = FakeContents::fresh();
    let config = configured().with_deploy_key("secret");
    let app = common::initialize_app(config, &contents).await;
    let (status, _) = post_deploy(
        &app,
        json!({"filename": "a.txt", "content": "hi", "deployKey": "secret"}),
    )
    .await;
    assert_eq!(status, 200);
}

#[actix_web::test]
async fn test_deploy_when_no_deploy_key_configured_expect_any_key_accepted() {
    for request in [
        json!({"filename": "a.txt", "content": "hi"}),
        json!({"filename": "a.txt", "content": "hi", "deployKey": "whatever"}),
    ] {
        let contents = FakeContents::fresh();
        let app = common::initialize_app(configured(), &contents).await;
        let (status, _) = post_deploy(&app, request).await;
        assert_eq!(status, 200);
    }
}

#[actix_web::test]
async fn test_deploy_when_project_unconfigured_expect_500_naming_project() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) = post_deploy(
        &app,
        json!({"filename": "a.txt", "content": "hi", "project": "ghost"}),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
    assert_eq!(contents.call_count(), 0);
}

#[actix_web::test]
async fn test_deploy_when_default_unconfigured_expect_500_naming_default() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(Config::default(), &contents).await;
    let (status, body) = post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("default"));
    assert_eq!(contents.call_count(), 0);
}

#[actix_web::test]
async fn test_deploy_when_write_rejected_with_message_expect_500_with_message() {
    let contents = FakeContents::new(
        FileLookup::Missing,
        Err(ContentsError::Rejected {
            status: 422,
            message: Some("Validation Failed".into()),
        }),
    );
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) = post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"success": false, "error": "Validation Failed"}));
}

#[actix_web::test]
async fn test_deploy_when_write_rejected_without_message_expect_fallback_error() {
    let contents = FakeContents::new(
        FileLookup::Found { sha: "stale".into() },
        Err(ContentsError::Rejected {
            status: 409,
            message: None,
        }),
    );
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) = post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "GitHub API error");
}

#[actix_web::test]
async fn test_deploy_when_write_transport_fails_expect_500_with_reason() {
    let contents = FakeContents::new(
        FileLookup::Missing,
        Err(ContentsError::Transport("connection reset by peer".into())),
    );
    let app = common::initialize_app(configured(), &contents).await;
    let (status, body) = post_deploy(&app, json!({"filename": "a.txt", "content": "hi"})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "connection reset by peer");
}

#[actix_web::test]
async fn test_deploy_when_body_over_limit_expect_413_uniform_shape() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let body = json!({"filename": "a.txt", "content": "x".repeat(5 * 1024 * 1024)});
    let req = actix_web::test::TestRequest::post()
        .uri("/deploy")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 413);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    let body: Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({"success": false, "error": format!("Request body exceeds {MAX_BODY_BYTES} bytes")})
    );
    assert_eq!(contents.call_count(), 0);
}

#[actix_web::test]
async fn test_deploy_when_body_under_limit_expect_success() {
    let contents = FakeContents::fresh();
    let app = common::initialize_app(configured(), &contents).await;
    let content = "x".repeat(3 * 1024 * 1024);
    let (status, _) = post_deploy(&app, json!({"filename": "a.txt", "content": content})).await;
    assert_eq!(status, 200);
    assert_eq!(contents.put_body().content.len(), 4 * 1024 * 1024);
}
