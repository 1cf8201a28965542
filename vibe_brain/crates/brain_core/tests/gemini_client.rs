use brain_core::config::{GeminiAuth, GeminiConfig};
use brain_core::gemini::{extract_candidate_text, GeminiClient, GeminiError, TextGenerator};
use brain_core::system_prompt::response_schema;
use brain_core::{VibeParams, VibeSettingsResolver};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serves exactly one HTTP response and hands back the raw request it received.
async fn serve_once(status_line: &'static str, body: String) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.expect("write");
        let _ = stream.shutdown().await;
        request
    });
    (addr, handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + content_length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn split_request(raw: &str) -> (String, Value) {
    let (head, body) = raw.split_once("\r\n\r\n").expect("request head");
    let body = serde_json::from_str(body).expect("request body json");
    (head.to_string(), body)
}

fn envelope(text: &str) -> String {
    json!({
        "candidates": [
            {
                "content": { "role": "model", "parts": [ { "text": text } ] },
                "finishReason": "STOP"
            }
        ]
    })
    .to_string()
}

fn client_for(addr: SocketAddr, auth: GeminiAuth) -> GeminiClient {
    let config = GeminiConfig::default()
        .with_model("gemini-test")
        .with_auth(auth)
        .with_base_url(&format!("http://{addr}"))
        .expect("base url");
    GeminiClient::new(config).expect("client")
}

#[tokio::test]
async fn api_key_request_shape() {
    let (addr, server) = serve_once("200 OK", envelope(r#"{"ok":true}"#)).await;
    let client = client_for(addr, GeminiAuth::api_key("test-key"));

    let schema = response_schema();
    let text = client
        .generate_json("describe the room", &schema)
        .await
        .expect("generate");
    assert_eq!(text, r#"{"ok":true}"#);

    let (head, body) = split_request(&server.await.expect("server task"));
    let request_line = head.lines().next().expect("request line");
    assert_eq!(
        request_line,
        "POST /v1beta/models/gemini-test:generateContent HTTP/1.1"
    );
    let head_lower = head.to_ascii_lowercase();
    assert!(head_lower.contains("x-goog-api-key: test-key"));
    assert!(!head_lower.contains("authorization:"));

    assert_eq!(body["contents"][0]["parts"][0]["text"], "describe the room");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(body["generationConfig"]["responseSchema"], schema);
}

#[tokio::test]
async fn base_path_and_padded_model_reach_the_endpoint() {
    let (addr, server) = serve_once("200 OK", envelope("{}")).await;
    let config = GeminiConfig::default()
        .with_model(" gemini-test\n")
        .with_auth(GeminiAuth::api_key("k"))
        .with_base_url(&format!("http://{addr}/proxy"))
        .expect("base url");
    let client = GeminiClient::new(config).expect("client");
    assert_eq!(client.model(), "gemini-test");

    client
        .generate_json("x", &response_schema())
        .await
        .expect("generate");

    let (head, _) = split_request(&server.await.expect("server task"));
    assert_eq!(
        head.lines().next().expect("request line"),
        "POST /proxy/v1beta/models/gemini-test:generateContent HTTP/1.1"
    );
}

#[tokio::test]
async fn access_token_is_sent_as_bearer() {
    let (addr, server) = serve_once("200 OK", envelope("{}")).await;
    let client = client_for(addr, GeminiAuth::access_token("tok-123"));

    client
        .generate_json("x", &response_schema())
        .await
        .expect("generate");

    let (head, _) = split_request(&server.await.expect("server task"));
    let head_lower = head.to_ascii_lowercase();
    assert!(head_lower.contains("authorization: bearer tok-123"));
    assert!(!head_lower.contains("x-goog-api-key"));
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let (addr, server) = serve_once(
        "403 Forbidden",
        json!({ "error": { "code": 403, "message": "Method doesn't allow unregistered callers" } })
            .to_string(),
    )
    .await;
    let client = client_for(addr, GeminiAuth::None);

    let err = client
        .generate_json("x", &response_schema())
        .await
        .unwrap_err();
    match err {
        GeminiError::Auth(msg) => assert!(msg.contains("unregistered callers")),
        other => panic!("expected auth error, got: {other:?}"),
    }

    let (head, _) = split_request(&server.await.expect("server task"));
    let head_lower = head.to_ascii_lowercase();
    assert!(!head_lower.contains("x-goog-api-key"));
    assert!(!head_lower.contains("authorization:"));
}

#[tokio::test]
async fn server_error_is_bad_status() {
    let (addr, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
    let client = client_for(addr, GeminiAuth::api_key("k"));

    let err = client
        .generate_json("x", &response_schema())
        .await
        .unwrap_err();
    match err {
        GeminiError::BadStatus { status, .. } => assert_eq!(status.as_u16(), 503),
        other => panic!("expected bad status, got: {other:?}"),
    }
}

#[tokio::test]
async fn resolves_through_real_client() {
    let (addr, _server) = serve_once(
        "200 OK",
        envelope(
            r#"{"intensity":70,"spatialWidth":85,"distance":40,"ambienceNotes":"damp, echoing canopy"}"#,
        ),
    )
    .await;
    let resolver = VibeSettingsResolver::new(client_for(addr, GeminiAuth::api_key("k")));

    let params = resolver
        .resolve("a rainy forest at night")
        .await
        .expect("resolve");
    assert_eq!(
        params,
        VibeParams {
            intensity: 70.0,
            spatial_width: 85.0,
            distance: 40.0,
            ambience_notes: "damp, echoing canopy".to_string(),
        }
    );
}

#[test]
fn candidate_text_joins_parts_and_skips_thoughts() {
    let body = json!({
        "candidates": [
            {
                "content": {
                    "parts": [
                        { "text": "thinking about rain", "thought": true },
                        { "text": "{\"intensity\":" },
                        { "text": "1}" }
                    ]
                }
            }
        ]
    })
    .to_string();
    assert_eq!(
        extract_candidate_text(&body).expect("text"),
        "{\"intensity\":1}"
    );
}

#[test]
fn blocked_prompt_is_reported() {
    let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
    match extract_candidate_text(&body) {
        Err(GeminiError::Blocked(reason)) => assert_eq!(reason, "SAFETY"),
        other => panic!("expected blocked, got: {other:?}"),
    }
}

#[test]
fn malformed_envelope_is_rejected() {
    assert!(matches!(
        extract_candidate_text("<html>502</html>"),
        Err(GeminiError::Envelope(_))
    ));
    assert!(matches!(
        extract_candidate_text(r#"{"candidates":[]}"#),
        Err(GeminiError::Envelope(_))
    ));
    assert!(matches!(
        extract_candidate_text(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#),
        Err(GeminiError::Envelope(_))
    ));
}
