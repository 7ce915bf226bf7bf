//! `OpenAiChat` against a one-shot local HTTP responder.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use werewolf_agents::{LlmEndpoint, OpenAiChat};
use werewolf_coordination::{ChatMessage, GenerationError, TextGenerator};

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    line.to_lowercase()
                        .strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answer exactly one request, returning what was received.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{addr}/v1"), handle)
}

fn endpoint(url: String, api_key: Option<&str>) -> LlmEndpoint {
    LlmEndpoint {
        url,
        api_key: api_key.map(String::from),
        timeout_secs: 10,
        temperature: Some(0.5),
        max_tokens: None,
    }
}

fn messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are Kyle, a character in a game of Werewolf."),
        ChatMessage::user("It is your turn to speak."),
    ]
}

#[tokio::test]
async fn test_successful_completion() {
    let payload = serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Kyle: I trust Emily."}}]
    });
    let (url, server) = serve_once("200 OK", payload.to_string()).await;
    let chat = OpenAiChat::new(endpoint(url, Some("sk-test"))).unwrap();

    let content = chat.generate("gpt-3.5-turbo", &messages()).await.unwrap();
    assert_eq!(content, "Kyle: I trust Emily.");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request
        .to_lowercase()
        .contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""model":"gpt-3.5-turbo""#));
    assert!(request.contains(r#""temperature":0.5"#));
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let (url, server) =
        serve_once("500 Internal Server Error", r#"{"error":"overloaded"}"#.to_string()).await;
    let chat = OpenAiChat::new(endpoint(url, None)).unwrap();

    let err = chat.generate("gpt-3.5-turbo", &messages()).await.unwrap_err();
    match err {
        GenerationError::Api { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    let request = server.await.unwrap();
    assert!(!request.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_empty_content_is_error() {
    let payload = serde_json::json!({"choices": [{"message": {"content": ""}}]});
    let (url, _server) = serve_once("200 OK", payload.to_string()).await;
    let chat = OpenAiChat::new(endpoint(url, None)).unwrap();
    assert!(matches!(
        chat.generate("m", &messages()).await,
        Err(GenerationError::Empty { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_request_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let chat = OpenAiChat::new(endpoint(format!("http://{addr}/v1"), None)).unwrap();
    assert!(matches!(
        chat.generate("m", &messages()).await,
        Err(GenerationError::RequestFailed(_))
    ));
}
