//! End-to-end gateway flows over real HTTP against a mock ePortal.

mod common;

use std::time::Duration;

use campus_login::{Credentials, EPortal, FailureKind, GatewaySettings};
use common::{MockGateway, GATEWAY_BASE};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds() -> Credentials {
    Credentials::new("20230001", "secret")
}

fn settings(max_retries: u32) -> GatewaySettings {
    GatewaySettings::new(GATEWAY_BASE).with_retries(max_retries, Duration::ZERO)
}

#[tokio::test]
async fn login_posts_credentials_to_acsetting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eportal/"))
        .and(query_param("c", "ACSetting"))
        .and(query_param("a", "Login"))
        .and(header("user-agent", "CampusAutoLogin/1.0"))
        .and(body_string("DDDDD=20230001&upass=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<script>window.location='Dr.COMWebLoginID_3.htm'</script>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal.login(&creds(), &settings(3)).await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.http_status, Some(200));
}

#[tokio::test]
async fn failing_login_is_attempted_max_retries_plus_one_times() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eportal/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Dr.COMWebLoginID_2.htm"))
        .expect(3)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal.login(&creds(), &settings(2)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::Credentials));
}

#[tokio::test]
async fn login_without_auto_retry_makes_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal
        .login(&creds(), &settings(5).without_retry())
        .await;

    assert_eq!(outcome.failure, Some(FailureKind::HttpStatus));
    assert_eq!(outcome.http_status, Some(500));
    assert!(outcome.message.contains("500"));
}

#[tokio::test]
async fn logout_sends_mac_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eportal/"))
        .and(query_param("c", "ACSetting"))
        .and(query_param("a", "Logout"))
        .and(query_param("ver", "1.0"))
        .and(query_param("wlanusermac", "111111111111"))
        .respond_with(ResponseTemplate::new(200).set_body_string("注销成功"))
        .expect(1)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal.logout_default(&settings(0)).await;

    assert!(outcome.success, "{}", outcome.message);
}

#[tokio::test]
async fn usage_query_parses_jsonp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eportal/"))
        .and(query_param("c", "ServiceInterface"))
        .and(query_param("a", "loadUserFlow"))
        .and(query_param("account", "20230001"))
        .and(header("referer", GATEWAY_BASE))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"jQuery111307_1700000000000({"result":"ok","msg":"ok","userflow":"51200","useflow":"1024"})"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal.query_data_usage(&creds(), &settings(0)).await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.raw_used_mb, Some(1024));
    assert_eq!(outcome.raw_total_mb, Some(51200));
    assert_eq!(outcome.remaining_mb, Some(50176.0));
    assert_eq!(outcome.used_bytes, Some(1_073_741_824));
    assert_eq!(outcome.total_bytes, Some(53_687_091_200));

    let requests = server.received_requests().await.expect("recording enabled");
    let query = requests[0].url.query().unwrap_or_default().to_string();
    let callback = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "callback")
        .map(|(_, v)| v.into_owned())
        .expect("callback param");
    assert!(callback.starts_with("jQuery"), "{query}");
    let stamp = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "_")
        .map(|(_, v)| v.into_owned())
        .expect("timestamp param");
    assert!(callback.ends_with(&format!("_{stamp}")));
}

#[tokio::test]
async fn usage_query_rejection_carries_gateway_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"cb({"result":"fail","msg":"no account"})"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let portal = EPortal::new(MockGateway::new(&server));
    let outcome = portal.query_data_usage(&creds(), &settings(3)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::PayloadSemantic));
    assert!(outcome.message.contains("no account"));
    assert_eq!(outcome.raw_used_mb, None);
}

#[tokio::test]
async fn unreachable_gateway_yields_transport_outcome() {
    let portal = EPortal::new(MockGateway::unreachable());

    let login = portal.login(&creds(), &settings(1)).await;
    assert!(!login.success);
    assert_eq!(login.http_status, None);
    assert_eq!(login.failure, Some(FailureKind::Transport));

    let usage = portal.query_data_usage(&creds(), &settings(0)).await;
    assert_eq!(usage.failure, Some(FailureKind::Transport));
    assert_eq!(usage.http_status, None);
}
