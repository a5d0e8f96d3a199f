use linkscope::config::{parse_config, Config};
use linkscope::crawler::build_coordinator;
use linkscope::storage::open_repository;
use linkscope::BatchOrchestrator;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_AGENT: &str = "TestBot/1.0.0 (+https://example.com/contact)";

/// Page with three external and two internal links
pub const MIXED_PAGE: &str = r#"
<html>
<body>
    <a href="https://golang.org/doc">Docs</a>
    <a href="https://www.rust-lang.org/">Rust</a>
    <a href="http://other.com/page">Other</a>
    <a href="/about">About</a>
    <a href="contact.html">Contact</a>
</body>
</html>
"#;

/// Creates a validated test configuration
///
/// `storage` is spliced into the `[storage]` table.
pub fn create_test_config(storage: &str) -> Config {
    let toml = format!(
        r#"
[server]
bind-address = "127.0.0.1:0"

[scraper]
max-concurrent-fetches = 4
request-timeout-secs = 1
connect-timeout-secs = 1

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[storage]
{}
"#,
        storage
    );
    parse_config(&toml).expect("test config should be valid")
}

pub fn create_orchestrator(config: &Config) -> Arc<BatchOrchestrator> {
    let repository = open_repository(&config.storage).expect("Failed to open storage");
    let coordinator = build_coordinator(config).expect("Failed to build coordinator");
    Arc::new(
        BatchOrchestrator::new(Arc::new(coordinator), repository)
            .with_batch_timeout(config.scraper.batch_timeout()),
    )
}

/// Starts a mock origin serving `/ok` (the mixed page) and `/missing` (404)
pub async fn start_origin() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MIXED_PAGE, "text/html"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}
