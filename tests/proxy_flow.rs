//! End-to-end tests: client → proxy → mock origin.

use std::time::Duration;

use axum::http::StatusCode;
use rewrite_proxy::config::ProxyConfig;

mod common;

use common::{client, closed_addr, start_origin, start_proxy, start_silent_origin, MockResponse};

fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.fetch.use_env_proxy = false;
    config
}

const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, b'I', b'H', b'D', b'R',
    0x00, 0xff, 0xfe, 0x80, 0x7f,
];

#[tokio::test]
async fn test_html_is_rewritten() {
    let origin = start_origin(vec![(
        "/",
        MockResponse::html(concat!(
            "<html><head><link rel=\"stylesheet\" href=\"/site.css\">",
            "<style>body{background:url('bg.png')}</style></head>",
            "<body><img src=\"logo.png\"><a href=\"https://other.example/x\">x</a>",
            "<img src=\"data:image/png;base64,AAAA\"></body></html>"
        )),
    )])
    .await;
    let proxy = start_proxy(test_config()).await;
    let encoded_origin = format!("http%3A%2F%2F127.0.0.1%3A{}", origin.port());

    let res = client()
        .get(proxy.url(&format!("http://{origin}/")))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let body = res.text().await.unwrap();
    assert!(
        body.contains(&format!("<img src=\"/proxy?url={encoded_origin}%2Flogo.png\">")),
        "{body}"
    );
    assert!(body.contains(&format!("href=\"/proxy?url={encoded_origin}%2Fsite.css\"")), "{body}");
    assert!(body.contains(&format!("url(\"/proxy?url={encoded_origin}%2Fbg.png\")")), "{body}");
    assert!(body.contains("href=\"/proxy?url=https%3A%2F%2Fother.example%2Fx\""), "{body}");
    assert!(body.contains("src=\"data:image/png;base64,AAAA\""), "{body}");
}

#[tokio::test]
async fn test_binary_passthrough_is_byte_identical() {
    let origin = start_origin(vec![(
        "/logo.png",
        MockResponse::new(200, "image/png", PNG).with_header("Cache-Control", "public, max-age=3600"),
    )])
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/logo.png")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["cache-control"], "public, max-age=3600");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(&res.bytes().await.unwrap()[..], PNG);
}

#[tokio::test]
async fn test_opaque_status_is_forwarded() {
    let origin = start_origin(vec![]).await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/nothing.js")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "missing");
}

#[tokio::test]
async fn test_html_error_page_is_still_rewritten() {
    let origin = start_origin(vec![(
        "/gone",
        MockResponse::new(404, "text/html", "<h1>Not here</h1><a href=\"/home\">home</a>"),
    )])
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/gone")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(
        body.contains(&format!("/proxy?url=http%3A%2F%2F127.0.0.1%3A{}%2Fhome", origin.port())),
        "{body}"
    );
}

#[tokio::test]
async fn test_redirects_followed_and_final_url_is_base() {
    let origin = start_origin(vec![
        ("/old", MockResponse::redirect("/docs/page.html")),
        ("/docs/page.html", MockResponse::html("<img src=\"pic.png\">")),
    ])
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/old")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(
        body.contains(&format!(
            "/proxy?url=http%3A%2F%2F127.0.0.1%3A{}%2Fdocs%2Fpic.png",
            origin.port()
        )),
        "{body}"
    );
}

#[tokio::test]
async fn test_redirect_loop_is_bad_gateway() {
    let origin = start_origin(vec![("/loop", MockResponse::redirect("/loop"))]).await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/loop")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = res.text().await.unwrap();
    assert!(body.contains("too many redirects"), "{body}");
}

#[tokio::test]
async fn test_latin1_page_is_served_as_utf8() {
    let origin = start_origin(vec![(
        "/",
        MockResponse::new(
            200,
            "text/html; charset=iso-8859-1",
            &b"<p>caf\xe9</p><img src=\"a.png\">"[..],
        ),
    )])
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    let body = String::from_utf8(res.bytes().await.unwrap().to_vec()).expect("body is UTF-8");
    assert!(body.contains("<p>café</p>"), "{body}");
    assert!(
        body.contains(&format!(
            "<img src=\"/proxy?url=http%3A%2F%2F127.0.0.1%3A{}%2Fa.png\">",
            origin.port()
        )),
        "{body}"
    );
}

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(format!("http://{}/proxy", proxy.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.text().await.unwrap(), "Missing required query parameter: url");
}

#[tokio::test]
async fn test_malformed_and_unsupported_urls_are_rejected() {
    let proxy = start_proxy(test_config()).await;

    for target in ["not-a-url", "http://", "ftp://files.example/a"] {
        let res = client().get(proxy.url(target)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{target}");
    }
}

#[tokio::test]
async fn test_unreachable_origin_is_bad_gateway_and_proxy_stays_up() {
    let dead = closed_addr().await;
    let origin = start_origin(vec![("/", MockResponse::html("<p>alive</p>"))]).await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{dead}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = res.text().await.unwrap();
    assert!(body.starts_with("Error fetching URL:"), "{body}");

    let res = client()
        .get(proxy.url(&format!("http://{origin}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("alive"));
}

#[tokio::test]
async fn test_slow_origin_times_out() {
    let silent = start_silent_origin().await;
    let mut config = test_config();
    config.fetch.timeout_secs = 1;
    let proxy = start_proxy(config).await;

    let res = tokio::time::timeout(
        Duration::from_secs(10),
        client().get(proxy.url(&format!("http://{silent}/"))).send(),
    )
    .await
    .expect("proxy must answer instead of hanging")
    .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = res.text().await.unwrap();
    assert!(body.contains("timed out"), "{body}");
}

#[tokio::test]
async fn test_upstream_server_error_is_bad_gateway() {
    let origin = start_origin(vec![(
        "/boom",
        MockResponse::new(500, "text/html", "<h1>oops</h1>"),
    )])
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/boom")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.unwrap().contains("500"));
}

#[tokio::test]
async fn test_oversized_body_is_bad_gateway() {
    let origin = start_origin(vec![(
        "/big.bin",
        MockResponse::new(200, "application/octet-stream", vec![0u8; 4096]),
    )])
    .await;
    let mut config = test_config();
    config.fetch.max_body_bytes = 1024;
    let proxy = start_proxy(config).await;

    let res = client()
        .get(proxy.url(&format!("http://{origin}/big.bin")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_custom_proxy_path() {
    let origin = start_origin(vec![("/", MockResponse::html("<a href=\"next\">n</a>"))]).await;
    let mut config = test_config();
    config.rewrite.proxy_path = "/p".into();
    let proxy = start_proxy(config).await;

    let res = client()
        .get(format!("http://{}/p?url=http://{origin}/", proxy.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("href=\"/p?url=http%3A%2F%2F127.0.0.1%3A"), "{body}");
}
