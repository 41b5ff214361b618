//! Tests for `HttpBackend` and `LogExporter` against a loopback stub server
//! that replays canned HTTP responses and records what it was sent.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use interview_chat::backend::{ChatBackend, HttpBackend};
use interview_chat::config::ClientConfig;
use interview_chat::controller::{ChatSessionController, RequestState, SendStatus};
use interview_chat::error::{DirectoryError, LogDownloadError, SendFailure};
use interview_chat::logs::{status_message, LogExporter, MSG_FAILURE, MSG_MISSING_SECRET, MSG_SUCCESS};
use interview_chat::protocol::ChatRequest;
use interview_chat::transcript::Sender;

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

struct Canned {
    status: u16,
    content_type: &'static str,
    body: String,
}

fn json(status: u16, body: &str) -> Canned {
    Canned {
        status,
        content_type: "application/json",
        body: body.to_string(),
    }
}

fn text(status: u16, body: &str) -> Canned {
    Canned {
        status,
        content_type: "text/html",
        body: body.to_string(),
    }
}

struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    /// Serve `responses` in order, one per connection.
    async fn start(responses: Vec<Canned>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            for canned in responses {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let recorded = read_request(&mut stream).await;
                log.lock().unwrap().push(recorded);
                let head = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    canned.status,
                    canned.content_type,
                    canned.body.len(),
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(canned.body.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    fn backend(&self) -> HttpBackend {
        HttpBackend::new(ClientConfig::new(&self.base_url).unwrap())
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before a full request arrived");
        buf.extend_from_slice(&chunk[..n]);

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut req = httparse::Request::new(&mut headers);
        if let Ok(httparse::Status::Complete(head_len)) = req.parse(&buf) {
            let content_length = req
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("content-length"))
                .and_then(|h| std::str::from_utf8(h.value).ok())
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_len + content_length {
                return Recorded {
                    method: req.method.unwrap_or_default().to_string(),
                    path: req.path.unwrap_or_default().to_string(),
                    body: String::from_utf8_lossy(&buf[head_len..head_len + content_length]).into_owned(),
                };
            }
        }
    }
}

fn sample_request() -> ChatRequest {
    ChatRequest {
        message: "Tell me what happened".to_string(),
        persona: "Det. Rivera".to_string(),
        student_name: "Sam".to_string(),
        session_id: "session-1".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Persona directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_personas_success() {
    let server = StubServer::start(vec![json(
        200,
        r#"{"available_personas":["Det. Rivera","Witness A"]}"#,
    )])
    .await;
    let set = server.backend().fetch_personas().await.unwrap();
    assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Det. Rivera", "Witness A"]);

    let reqs = server.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "GET");
    assert_eq!(reqs[0].path, "/");
}

#[tokio::test]
async fn test_fetch_personas_missing_field_is_empty() {
    let server = StubServer::start(vec![json(200, r#"{"status":"ok"}"#)]).await;
    let set = server.backend().fetch_personas().await.unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_fetch_personas_null_field_is_empty() {
    let server = StubServer::start(vec![json(200, r#"{"available_personas":null}"#)]).await;
    let mut c = ChatSessionController::new(server.backend());
    c.initialize().await;
    assert!(c.directory().is_loaded());
    assert!(c.directory().personas().is_empty());
}

#[tokio::test]
async fn test_fetch_personas_http_error() {
    let server = StubServer::start(vec![json(503, r#"{"detail":"down"}"#)]).await;
    let err = server.backend().fetch_personas().await.unwrap_err();
    assert_eq!(err, DirectoryError::Http { status: 503 });
}

#[tokio::test]
async fn test_fetch_personas_malformed_body() {
    let server = StubServer::start(vec![text(200, "<html>hello</html>")]).await;
    let err = server.backend().fetch_personas().await.unwrap_err();
    assert!(matches!(err, DirectoryError::Malformed { .. }), "{err:?}");
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_send_chat_posts_full_payload() {
    let server = StubServer::start(vec![json(200, r#"{"response":"I was at the store."}"#)]).await;
    let reply = server.backend().send_chat(&sample_request()).await.unwrap();
    assert_eq!(reply, "I was at the store.");

    let reqs = server.requests();
    assert_eq!(reqs[0].method, "POST");
    assert_eq!(reqs[0].path, "/chat");
    let body: serde_json::Value = serde_json::from_str(&reqs[0].body).unwrap();
    assert_eq!(body["message"], "Tell me what happened");
    assert_eq!(body["persona"], "Det. Rivera");
    assert_eq!(body["student_name"], "Sam");
    assert_eq!(body["session_id"], "session-1");
}

#[tokio::test]
async fn test_send_chat_http_error_carries_detail() {
    let server = StubServer::start(vec![json(500, r#"{"detail":"persona crashed"}"#)]).await;
    let err = server.backend().send_chat(&sample_request()).await.unwrap_err();
    assert_eq!(
        err,
        SendFailure::Http {
            status: 500,
            detail: Some("persona crashed".to_string()),
        }
    );
}

#[tokio::test]
async fn test_send_chat_http_error_with_html_body() {
    let server = StubServer::start(vec![text(502, "<h1>Bad Gateway</h1>")]).await;
    let err = server.backend().send_chat(&sample_request()).await.unwrap_err();
    assert_eq!(err, SendFailure::Http { status: 502, detail: None });
}

#[tokio::test]
async fn test_send_chat_application_error_on_200() {
    let server = StubServer::start(vec![json(200, r#"{"error":"Persona not found"}"#)]).await;
    let err = server.backend().send_chat(&sample_request()).await.unwrap_err();
    assert_eq!(err, SendFailure::Backend { detail: "Persona not found".to_string() });
}

#[tokio::test]
async fn test_send_chat_non_json_200_is_malformed() {
    let server = StubServer::start(vec![text(200, "ok")]).await;
    let err = server.backend().send_chat(&sample_request()).await.unwrap_err();
    assert!(matches!(err, SendFailure::Malformed { .. }), "{err:?}");
}

#[tokio::test]
async fn test_send_chat_missing_response_is_malformed() {
    let server = StubServer::start(vec![json(200, r#"{"reply":"wrong key"}"#)]).await;
    let err = server.backend().send_chat(&sample_request()).await.unwrap_err();
    assert!(matches!(err, SendFailure::Malformed { .. }), "{err:?}");
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = StubServer::start(vec![json(200, r#"{"response":"hi"}"#)]).await;
    let cfg = ClientConfig::new(&format!("{}/api/", server.base_url)).unwrap();
    HttpBackend::new(cfg).send_chat(&sample_request()).await.unwrap();
    assert_eq!(server.requests()[0].path, "/api/chat");
}

// ---------------------------------------------------------------------------
// Log download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_download_logs_encodes_secret() {
    let server = StubServer::start(vec![json(200, r#"[{"student":"Sam"}]"#)]).await;
    let bytes = server.backend().download_logs("s=cret&x").await.unwrap();
    assert_eq!(bytes, br#"[{"student":"Sam"}]"#.to_vec());
    assert_eq!(server.requests()[0].path, "/download-logs?secret=s%3Dcret%26x");
}

#[tokio::test]
async fn test_download_logs_forbidden() {
    let server = StubServer::start(vec![json(403, r#"{"detail":"bad secret"}"#)]).await;
    let err = server.backend().download_logs("nope").await.unwrap_err();
    assert!(matches!(err, LogDownloadError::Http { status: 403 }), "{err:?}");
}

#[tokio::test]
async fn test_log_exporter_writes_file() {
    let server = StubServer::start(vec![json(200, r#"[{"student":"Sam"}]"#)]).await;
    let backend = server.backend();
    let path = std::env::temp_dir().join(format!("student_logs-{}.json", uuid::Uuid::new_v4()));

    let result = LogExporter::new(&backend).export("secret", &path).await;
    assert_eq!(status_message(&result), MSG_SUCCESS);
    assert_eq!(result.unwrap(), 19);
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, r#"[{"student":"Sam"}]"#);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_log_exporter_empty_secret_sends_nothing() {
    let server = StubServer::start(vec![]).await;
    let backend = server.backend();
    let path = std::env::temp_dir().join("never-written.json");
    let result = LogExporter::new(&backend).export("  ", &path).await;
    assert!(matches!(result, Err(LogDownloadError::MissingSecret)));
    assert_eq!(status_message(&result), MSG_MISSING_SECRET);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_log_exporter_reports_failure() {
    let server = StubServer::start(vec![json(401, r#"{"detail":"Unauthorized"}"#)]).await;
    let backend = server.backend();
    let path = std::env::temp_dir().join(format!("student_logs-{}.json", uuid::Uuid::new_v4()));
    let result = LogExporter::new(&backend).export("wrong", &path).await;
    assert_eq!(status_message(&result), MSG_FAILURE);
    assert!(!path.exists());
}

// ---------------------------------------------------------------------------
// Controller over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_controller_over_http_success_then_500() {
    let server = StubServer::start(vec![
        json(200, r#"{"available_personas":["Det. Rivera","Witness A"]}"#),
        json(200, r#"{"response":"I was at the store."}"#),
        json(500, r#"{"detail":"Internal Server Error"}"#),
    ])
    .await;

    let mut c = ChatSessionController::new(server.backend());
    c.initialize().await;
    c.select_persona("Det. Rivera").unwrap();
    c.confirm_name("Sam").unwrap();

    c.set_draft("Tell me what happened");
    assert_eq!(c.send().await, SendStatus::Replied);

    c.set_draft("And then?");
    assert!(matches!(c.send().await, SendStatus::Failed(SendFailure::Http { status: 500, .. })));
    assert_eq!(c.request_state(), RequestState::Idle);

    let senders: Vec<Sender> = c.transcript().iter().map(|m| m.sender()).collect();
    assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::User, Sender::System]);
    assert_eq!(c.transcript().messages()[1].text(), "I was at the store.");

    let reqs = server.requests();
    let first: serde_json::Value = serde_json::from_str(&reqs[1].body).unwrap();
    let second: serde_json::Value = serde_json::from_str(&reqs[2].body).unwrap();
    assert_eq!(first["session_id"], second["session_id"]);
    assert_eq!(first["session_id"], c.session().session_id());
}

#[tokio::test]
async fn test_controller_over_http_unreachable_backend() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let backend = HttpBackend::new(ClientConfig::new(&format!("http://127.0.0.1:{port}")).unwrap());
    let mut c = ChatSessionController::new(backend);
    c.initialize().await;
    assert!(c.directory().is_failed());
    assert!(c.transcript().is_empty());
}
