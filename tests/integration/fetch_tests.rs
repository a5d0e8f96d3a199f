use crate::common::{create_test_config, start_origin, USER_AGENT};
use linkscope::crawler::{build_http_client, PageFetcher};
use linkscope::{Address, LinkCounts};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher() -> PageFetcher {
    create_fetcher_with_limit(None)
}

fn create_fetcher_with_limit(max_body_bytes: Option<usize>) -> PageFetcher {
    let mut config = create_test_config("");
    if let Some(limit) = max_body_bytes {
        config.scraper.max_body_bytes = limit;
    }
    let client = build_http_client(&config.scraper, &config.user_agent)
        .expect("Failed to build HTTP client");
    PageFetcher::new(Arc::new(client))
}

fn address(base: &str, page: &str) -> Address {
    Address::parse(&format!("{}{}", base, page)).expect("Failed to parse address")
}

#[tokio::test]
async fn test_fetch_counts_links() {
    let origin = start_origin().await;
    let fetcher = create_fetcher();

    let outcome = fetcher
        .fetch(address(&origin.uri(), "/ok"), &CancellationToken::new())
        .await;

    assert!(outcome.success, "unexpected failure: {:?}", outcome.failure_reason);
    assert_eq!(
        outcome.counts(),
        LinkCounts {
            external: 3,
            internal: 2
        }
    );
}

#[tokio::test]
async fn test_fetch_not_found_is_failed_outcome() {
    let origin = start_origin().await;
    let fetcher = create_fetcher();

    let outcome = fetcher
        .fetch(address(&origin.uri(), "/missing"), &CancellationToken::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.counts(), LinkCounts::default());
    assert_eq!(outcome.failure_reason.as_deref(), Some("bad status code"));
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = create_fetcher()
        .fetch(address(&server.uri(), "/"), &CancellationToken::new())
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.internal, 1);
}

#[tokio::test]
async fn test_fetch_timeout_is_failed_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<a href=\"/x\">x</a>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let outcome = create_fetcher()
        .fetch(address(&server.uri(), "/slow"), &CancellationToken::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.counts(), LinkCounts::default());
    assert!(outcome
        .failure_reason
        .as_deref()
        .unwrap()
        .starts_with("request failed"));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Bind then drop a listener to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let outcome = create_fetcher()
        .fetch(
            address(&format!("http://127.0.0.1:{}", port), "/"),
            &CancellationToken::new(),
        )
        .await;

    assert!(!outcome.success);
    assert!(outcome
        .failure_reason
        .as_deref()
        .unwrap()
        .starts_with("request failed"));
}

#[tokio::test]
async fn test_fetch_oversized_body_is_failed_outcome() {
    let server = MockServer::start().await;
    let links = "<a href=\"/x\">x</a>".repeat(200);
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links.clone()))
        .mount(&server)
        .await;

    let outcome = create_fetcher_with_limit(Some(1024))
        .fetch(address(&server.uri(), "/big"), &CancellationToken::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.counts(), LinkCounts::default());
    assert_eq!(
        outcome.failure_reason.as_deref(),
        Some("page body exceeds 1024 bytes")
    );

    // The same page fits under a limit larger than its body
    let outcome = create_fetcher_with_limit(Some(links.len()))
        .fetch(address(&server.uri(), "/big"), &CancellationToken::new())
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.internal, 200);
}
