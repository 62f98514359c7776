#![allow(dead_code)]

pub mod mock_listener;
pub mod mock_tts;
pub mod mock_tutor;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tutortalk::session::{SessionController, SessionOptions};
use tutortalk::speech_output::SpeechOutput;

pub use mock_listener::MockListener;
pub use mock_tts::MockTts;
pub use mock_tutor::MockTutor;

/// Options used by most session tests: replies are spoken
pub fn test_options() -> SessionOptions {
    SessionOptions {
        listen_timeout: Duration::from_secs(8),
        phrase_limit: Duration::from_secs(10),
        speak_replies: true,
    }
}

/// A controller wired to mocks, plus handles to inspect them
pub struct TestSession {
    pub controller: SessionController,
    pub tutor: Arc<MockTutor>,
    pub listener: Arc<MockListener>,
    pub tts: Arc<MockTts>,
}

impl TestSession {
    pub fn new(tutor: MockTutor, listener: MockListener) -> Self {
        let tutor = Arc::new(tutor);
        let listener = Arc::new(listener);
        let tts = Arc::new(MockTts::new());
        let voice = SpeechOutput::new(tts.clone(), tokio::runtime::Handle::current());
        let controller =
            SessionController::new(tutor.clone(), listener.clone(), voice, test_options());
        Self {
            controller,
            tutor,
            listener,
            tts,
        }
    }
}

/// Canned HTTP endpoint that answers every request with one response
pub struct FakeHttpServer {
    pub base_url: String,
    /// Raw bodies of the requests received so far
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl FakeHttpServer {
    pub async fn start(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake server");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status} Fake\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            requests,
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read one request and return its body
async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf[header_end..]).to_string()
}
