use std::time::Duration;

use playscrape::options::{AppOptions, CategoriesOptions, SuggestOptions};
use playscrape::{Client, ClientOptions, Error};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, retry_count: u32) -> Client {
    Client::new(ClientOptions {
        base_url: server.uri(),
        retry_count,
        retry_wait: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn unavailable_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/apps"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/store/apps/category/GAME">Games</a><a href="/store/apps/category/TOOLS">Tools</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let ids = client(&server, 2).categories(CategoriesOptions::default()).await.unwrap();
    assert_eq!(ids, vec!["GAME", "TOOLS", "APPLICATION"]);
}

#[tokio::test]
async fn missing_pages_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/apps/details"))
        .and(query_param("id", "com.gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).app(AppOptions::new("com.gone")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn client_errors_are_final() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_/PlayStoreUi/data/batchexecute"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).suggest(SuggestOptions::new("pan")).await.unwrap_err();
    match err {
        Error::Upstream { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad request");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn rpc_calls_post_a_form() {
    let server = MockServer::start().await;
    let body = playscrape::envelope::encode("IJ4APc", Some(&serde_json::json!([[[["panda"]]]])));
    Mock::given(method("POST"))
        .and(path("/_/PlayStoreUi/data/batchexecute"))
        .and(query_param("rpcids", "IJ4APc"))
        .and(header("content-type", "application/x-www-form-urlencoded;charset=UTF-8"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&server)
        .await;

    let terms = client(&server, 0).suggest(SuggestOptions::new("pan")).await.unwrap();
    assert_eq!(terms, vec!["panda"]);
}
