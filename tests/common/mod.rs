#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HUBSPOT_PAGE: &str = r#"<html><head>
<script type="text/javascript" id="hs-script-loader" async defer src="//js.hs-scripts.com/1234567.js"></script>
</head><body>Welcome</body></html>"#;

pub const PLAIN_PAGE: &str = "<html><body>hello</body></html>";

/// `host:port` of a mock server, usable as a scan domain.
pub fn domain_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// A local address that refuses connections.
pub fn refused_domain() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    address.to_string()
}

/// Creates a mock HTTP server that serves `html` as its homepage.
pub async fn mock_homepage(html: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server whose homepage redirects to `target_path`, which serves `html`.
pub async fn mock_redirecting_homepage(target_path: &str, html: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", target_path))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(target_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that returns the specified HTTP error status code.
pub async fn mock_error_server(status_code: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status_code))
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that delays responses to simulate network timeouts.
pub async fn mock_slow_server(delay: Duration) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(HUBSPOT_PAGE.to_string())
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    server
}
