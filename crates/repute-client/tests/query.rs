use repute_client::{ErrorKind, PoolStats, Reputation, ReputeClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE: &str = "rep.example.org";
const DISCOVERY_PATH: &str = "/.well-known/repute-template";
const QUERY_PATH: &str = "/repute/rep.example.org/example.com/sending-spam";

const BODY: &str = "<reputation><reputon>\
    <rater-authenticity>0.9</rater-authenticity>\
    <assertion>sending-spam</assertion>\
    <rated>example.com</rated>\
    <rating>0.7</rating>\
    <sample-size>42</sample-size>\
    <updated>1000000</updated>\
    <extension>dkim</extension>\
    </reputon></reputation>";

const EXPECTED: Reputation = Reputation {
    rating: 0.7,
    confidence: 0.9,
    sample_size: 42,
    updated: 1_000_000,
};

fn query_template(server: &MockServer) -> String {
    format!("{}/{{application}}/{{service}}/{{subject}}/{{assertion}}", server.uri())
}

fn client(server: &MockServer) -> ReputeClient {
    ReputeClient::builder(SERVICE)
        .discovery_template(format!("{}/.well-known/{{application}}-template", server.uri()))
        .build()
        .unwrap()
}

async fn mount_discovery(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("{}\n", query_template(server))),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_query(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn discovers_template_then_queries() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = client(&server);
    let rep = client.query("example.com").await.unwrap();

    assert_eq!(rep, Some(EXPECTED));
    assert_eq!(client.template(), Some(query_template(&server).as_str()));
    assert!(client.last_error().is_none());
}

#[tokio::test]
async fn template_is_discovered_once() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = client(&server);
    for _ in 0..3 {
        assert_eq!(client.query("example.com").await.unwrap(), Some(EXPECTED));
    }

    // Sequential queries keep reusing the same transport.
    assert_eq!(client.pool_stats(), PoolStats { idle: 1, created: 1 });
    server.verify().await;
}

#[tokio::test]
async fn preseeded_template_skips_discovery() {
    let server = MockServer::start().await;
    mount_discovery(&server, 0).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = ReputeClient::builder(SERVICE)
        .template(query_template(&server))
        .build()
        .unwrap();

    assert_eq!(client.query("example.com").await.unwrap(), Some(EXPECTED));
    server.verify().await;
}

#[tokio::test]
async fn header_preamble_in_body_is_tolerated() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(
        &server,
        ResponseTemplate::new(200).set_body_string(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\n\r\n{BODY}"
        )),
    )
    .await;

    let client = client(&server);
    assert_eq!(client.query("example.com").await.unwrap(), Some(EXPECTED));
}

#[tokio::test]
async fn no_matching_reputon_is_ok_without_data() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(
        &server,
        ResponseTemplate::new(200).set_body_string(
            "<reputation><reputon><extension>spf</extension>\
             <assertion>sending-spam</assertion><rating>1</rating></reputon></reputation>",
        ),
    )
    .await;

    let client = client(&server);
    assert_eq!(client.query("example.com").await.unwrap(), None);
    assert!(client.last_error().is_none());
}

#[tokio::test]
async fn non_200_query_is_query_error() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(503)).await;

    let client = client(&server);
    let err = client.query("example.com").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Query);
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(client.last_error(), Some(err.to_string()));
    // The template survives a failed query.
    assert!(client.template().is_some());
}

#[tokio::test]
async fn wrong_document_is_parse_error() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(
        &server,
        ResponseTemplate::new(200).set_body_string("<reputations><reputon/></reputations>"),
    )
    .await;

    let client = client(&server);
    let err = client.query("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(client.last_error().unwrap().starts_with("parse error"));
}

#[tokio::test]
async fn failed_discovery_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = client(&server);

    let err = client.query("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(client.template().is_none());

    assert_eq!(client.query("example.com").await.unwrap(), Some(EXPECTED));
    assert!(client.template().is_some());
    server.verify().await;
}

#[tokio::test]
async fn empty_discovery_body_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("\n"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.query("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(client.template().is_none());
}

#[tokio::test]
async fn oversized_response_is_short_write() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(
        &server,
        ResponseTemplate::new(200).set_body_string(BODY.repeat(10)),
    )
    .await;

    let client = ReputeClient::builder(SERVICE)
        .discovery_template(format!("{}/.well-known/{{application}}-template", server.uri()))
        .max_response_bytes(1024)
        .build()
        .unwrap();

    let err = client.query("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_start_shares_one_discovery() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = client(&server);
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.query("example.com").await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), Some(EXPECTED));
    }

    let stats = client.pool_stats();
    assert!(stats.created >= 1 && stats.created <= 16);
    assert_eq!(stats.idle, stats.created);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn max_idle_bounds_pool() {
    let server = MockServer::start().await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = ReputeClient::builder(SERVICE)
        .template(query_template(&server))
        .max_idle(2)
        .build()
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.query("example.com").await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap().is_some());
    }

    assert!(client.pool_stats().idle <= 2);
    client.close();
}

#[tokio::test]
async fn close_releases_idle_transports() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;
    mount_query(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

    let client = client(&server);
    client.query("example.com").await.unwrap();

    let observer = client.clone();
    client.close();
    assert_eq!(observer.pool_stats().idle, 0);
}
