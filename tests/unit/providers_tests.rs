/*!
 * Tests for the Ollama provider and the prompt-driven generation client,
 * run against a local one-shot HTTP server
 */

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use polyglot_relay::app_config::ProviderConfig;
use polyglot_relay::errors::ProviderError;
use polyglot_relay::language_utils::DetectedLanguage;
use polyglot_relay::providers::Provider;
use polyglot_relay::providers::ollama::Ollama;
use polyglot_relay::translation::{GenerationClient, LlmGenerationClient};

/// Accept one connection, answer it with `status` and `body`, return the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}", address), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(header_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffer).to_string()
}

fn ollama(endpoint: &str) -> Ollama {
    Ollama::new_with_config(endpoint, "llama3", 0.2, Duration::from_secs(5)).unwrap()
}

fn client(endpoint: &str) -> LlmGenerationClient<Ollama> {
    let config = ProviderConfig::default();
    LlmGenerationClient::new(ollama(endpoint), config.translate_prompt, config.detect_prompt)
}

#[tokio::test]
async fn test_translate_withOllamaResponse_shouldReturnTrimmedText() {
    let (endpoint, server) =
        serve_once("200 OK", r#"{"model":"llama3","response":"  안녕 팀 \n","done":true}"#).await;

    let translated = client(&endpoint).translate("hello team", "ko", Some("en")).await.unwrap();

    assert_eq!(translated, "안녕 팀");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/generate"));
    assert!(request.contains(r#""prompt":"hello team""#));
    assert!(request.contains("from English (en) to Korean (ko)"));
    assert!(request.contains(r#""stream":false"#));
}

#[tokio::test]
async fn test_detect_language_withLanguageName_shouldNormalizeToCode() {
    let (endpoint, _server) =
        serve_once("200 OK", r#"{"model":"llama3","response":"Japanese.","done":true}"#).await;

    let detected = client(&endpoint).detect_language("こんにちは").await.unwrap();

    assert_eq!(detected, DetectedLanguage::Code("ja".to_string()));
}

#[tokio::test]
async fn test_detect_language_withUndeterminedAnswer_shouldReturnUndetermined() {
    let (endpoint, _server) = serve_once("200 OK", r#"{"model":"llama3","response":"und","done":true}"#).await;

    let detected = client(&endpoint).detect_language("asdf qwer").await.unwrap();

    assert_eq!(detected, DetectedLanguage::Undetermined);
}

#[tokio::test]
async fn test_complete_withRateLimitStatus_shouldMapToRateLimitExceeded() {
    let (endpoint, _server) = serve_once("429 Too Many Requests", r#"{"error":"busy"}"#).await;

    let error = client(&endpoint).translate("hello team", "ko", None).await.unwrap_err();

    assert!(matches!(error, ProviderError::RateLimitExceeded(body) if body.contains("busy")));
}

#[tokio::test]
async fn test_complete_withServerError_shouldMapToApiError() {
    let (endpoint, _server) = serve_once("500 Internal Server Error", r#"{"error":"model crashed"}"#).await;

    let error = client(&endpoint).translate("hello team", "ko", None).await.unwrap_err();

    assert!(matches!(error, ProviderError::ApiError { status_code: 500, .. }));
}

#[tokio::test]
async fn test_complete_withMalformedBody_shouldMapToParseError() {
    let (endpoint, _server) = serve_once("200 OK", "not json").await;

    let error = client(&endpoint).translate("hello team", "ko", None).await.unwrap_err();

    assert!(matches!(error, ProviderError::ParseError(_)));
}

#[tokio::test]
async fn test_test_connection_withVersionEndpoint_shouldSucceed() {
    let (endpoint, server) = serve_once("200 OK", r#"{"version":"0.5.7"}"#).await;

    ollama(&endpoint).test_connection().await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/version"));
}

#[tokio::test]
async fn test_test_connection_withNothingListening_shouldReturnConnectionError() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let error = ollama(&format!("http://{}", address)).test_connection().await.unwrap_err();

    assert!(matches!(error, ProviderError::ConnectionError(_)));
}

#[test]
fn test_new_with_config_withInvalidEndpoint_shouldFail() {
    assert!(Ollama::new_with_config("", "llama3", 0.2, Duration::from_secs(5)).is_err());
    assert!(Ollama::new_with_config("http://", "llama3", 0.2, Duration::from_secs(5)).is_err());
    assert_eq!(ollama("localhost:11434/").base_url(), "http://localhost:11434");
}
