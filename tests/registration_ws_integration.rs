//! Integration tests for the registration WebSocket + REST system.
//!
//! Each test spins up an Axum server on a random port, connects via
//! tokio-tungstenite, and exercises the real WS / REST contract with stub
//! transcription and LLM collaborators.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use async_trait::async_trait;
use base64::Engine;

use enroll_assist::assistant::AssistantBridge;
use enroll_assist::error::{LlmError, TranscribeError};
use enroll_assist::llm::LlmProvider;
use enroll_assist::registration::{Registrar, SessionStore, Student};
use enroll_assist::store::{LibSqlBackend, StudentStore};
use enroll_assist::voice::{Transcriber, VoiceBridge};
use enroll_assist::ws::{AppState, registration_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The eight question prompts, in script order.
const QUESTION_PROMPTS: [&str; 8] = [
    "Hi there! What's your full name?",
    "Great! What's your email address?",
    "Can you provide your phone number?",
    "What's your date of birth?",
    "Please provide your address.",
    "Do you have a driving license? (Yes/No)",
    "If you have a license, please provide the license number.",
    "What transmission do you prefer? (Automatic/Manual)",
];

const TERMINAL_PROMPT: &str = "Thanks for the info! You're now registered.";

/// Stub LLM provider for integration tests (no real API calls).
struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Ok("Our office opens at 9am.".to_string())
    }
}

/// Transcriber stub that always succeeds with a fixed transcript.
struct FixedTranscriber(&'static str);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &Path) -> Result<String, TranscribeError> {
        Ok(self.0.to_string())
    }
}

/// Transcriber stub that always fails with unrecognizable audio.
struct DeafTranscriber;

#[async_trait]
impl Transcriber for DeafTranscriber {
    async fn transcribe(&self, _audio: &Path) -> Result<String, TranscribeError> {
        Err(TranscribeError::Unrecognized)
    }
}

/// Start an Axum server on a random port.
/// Returns (port, sessions, students) so tests can inspect state directly.
async fn start_server(
    transcriber: Arc<dyn Transcriber>,
) -> (u16, Arc<SessionStore>, Arc<dyn StudentStore>) {
    let sessions = SessionStore::new();
    let students: Arc<dyn StudentStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let registrar = Arc::new(Registrar::new(Arc::clone(&sessions), Arc::clone(&students)));
    let voice = Arc::new(VoiceBridge::new(transcriber, Arc::clone(&registrar)));
    let assistant = Arc::new(AssistantBridge::new(Arc::new(StubLlm), Arc::clone(&sessions)));

    let app = registration_routes(AppState {
        registrar,
        voice,
        assistant,
        students: Arc::clone(&students),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, sessions, students)
}

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect(port: u16) -> Ws {
    let (ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
        .await
        .expect("WS connect failed");
    ws
}

async fn send_event(ws: &mut Ws, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .unwrap();
}

/// Receive one outbound `message` event and return its text.
async fn recv_message(ws: &mut Ws) -> String {
    let msg = ws.next().await.unwrap().unwrap();
    let json: Value = match &msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {other:?}"),
    };
    assert_eq!(json["type"], "message");
    json["text"].as_str().unwrap().to_string()
}

fn message_event(text: &str, user_id: &str) -> Value {
    json!({"type": "message", "text": text, "user_id": user_id})
}

fn student_data_event(data: Value, user_id: &str) -> Value {
    json!({"type": "student_data", "data": data, "user_id": user_id})
}

// ── Conversation flow ────────────────────────────────────────────────

#[tokio::test]
async fn full_script_walk_registers_student() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, students) = start_server(Arc::new(FixedTranscriber("hi"))).await;
        let mut ws = connect(port).await;

        // First contact: prompt for step 0.
        send_event(&mut ws, message_event("hi", "u1")).await;
        assert_eq!(recv_message(&mut ws).await, QUESTION_PROMPTS[0]);

        // Structured data lands in the session and is acknowledged.
        send_event(
            &mut ws,
            student_data_event(
                json!({"first_name": "Alice", "email": "alice@example.com"}),
                "u1",
            ),
        )
        .await;
        let ack = recv_message(&mut ws).await;
        assert!(ack.starts_with("Received your data: "), "got: {ack}");

        // Remaining question prompts, in script order.
        for prompt in &QUESTION_PROMPTS[1..] {
            send_event(&mut ws, message_event("answer", "u1")).await;
            assert_eq!(recv_message(&mut ws).await, *prompt);
        }

        // Ninth message: terminal prompt + registration result.
        send_event(&mut ws, message_event("done", "u1")).await;
        assert_eq!(recv_message(&mut ws).await, TERMINAL_PROMPT);
        assert_eq!(
            recv_message(&mut ws).await,
            "Registration successful for Alice!"
        );

        // Session is gone; exactly one record was stored.
        assert!(sessions.get("u1").await.is_none());
        let stored = students.list_students().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].student.email, "alice@example.com");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn student_data_without_session_is_ignored() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;
        let mut ws = connect(port).await;

        // No session yet — the event produces no acknowledgement and no session.
        send_event(
            &mut ws,
            student_data_event(json!({"email": "ghost@example.com"}), "u1"),
        )
        .await;

        // The next reply on the wire is the step-0 prompt, not an ack.
        send_event(&mut ws, message_event("hi", "u1")).await;
        assert_eq!(recv_message(&mut ws).await, QUESTION_PROMPTS[0]);

        let session = sessions.get("u1").await.unwrap();
        assert!(session.fields.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn duplicate_email_failure_is_verbatim_and_discards_session() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        // Occupy the email before the conversation finishes.
        let mut taken = Student::from_fields(&serde_json::Map::new());
        taken.email = "taken@example.com".to_string();
        students.save_student(&taken).await.unwrap();

        let mut ws = connect(port).await;
        send_event(&mut ws, message_event("hi", "u1")).await;
        recv_message(&mut ws).await;
        send_event(
            &mut ws,
            student_data_event(json!({"email": "taken@example.com"}), "u1"),
        )
        .await;
        recv_message(&mut ws).await;

        for _ in 1..8 {
            send_event(&mut ws, message_event("hi", "u1")).await;
            recv_message(&mut ws).await;
        }

        send_event(&mut ws, message_event("hi", "u1")).await;
        assert_eq!(recv_message(&mut ws).await, TERMINAL_PROMPT);
        assert_eq!(recv_message(&mut ws).await, "Email already registered");

        // The session was discarded rather than preserved for retry.
        assert!(sessions.get("u1").await.is_none());
        assert_eq!(students.list_students().await.unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

// ── Voice ────────────────────────────────────────────────────────────

#[tokio::test]
async fn voice_message_is_equivalent_to_typed_message() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hello"))).await;
        let mut ws = connect(port).await;

        let audio = base64::engine::general_purpose::STANDARD.encode(b"RIFF....WAVE");
        send_event(
            &mut ws,
            json!({"type": "voice_message", "audio": audio, "user_id": "u2"}),
        )
        .await;
        let voice_reply = recv_message(&mut ws).await;

        // A fresh user typing the same text gets the same prompt.
        send_event(&mut ws, message_event("hello", "u3")).await;
        let typed_reply = recv_message(&mut ws).await;

        assert_eq!(voice_reply, typed_reply);
        assert_eq!(voice_reply, QUESTION_PROMPTS[0]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unrecognizable_audio_gets_apology_and_keeps_session_untouched() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, _students) = start_server(Arc::new(DeafTranscriber)).await;
        let mut ws = connect(port).await;

        let audio = base64::engine::general_purpose::STANDARD.encode(b"static");
        send_event(
            &mut ws,
            json!({"type": "voice_message", "audio": audio, "user_id": "u2"}),
        )
        .await;
        assert_eq!(
            recv_message(&mut ws).await,
            "Sorry, I couldn't understand the audio. Please try again."
        );
        assert!(sessions.get("u2").await.is_none());

        // The user can still start normally afterwards.
        send_event(&mut ws, message_event("hi", "u2")).await;
        assert_eq!(recv_message(&mut ws).await, QUESTION_PROMPTS[0]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn undecodable_audio_payload_reports_an_error() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;
        let mut ws = connect(port).await;

        send_event(
            &mut ws,
            json!({"type": "voice_message", "audio": "%%% not base64 %%%", "user_id": "u2"}),
        )
        .await;
        let reply = recv_message(&mut ws).await;
        assert!(reply.starts_with("An error occurred: "), "got: {reply}");
    })
    .await
    .expect("test timed out");
}

// ── Assistant side-channel ───────────────────────────────────────────

#[tokio::test]
async fn chat_with_bot_relays_reply_without_advancing() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;
        let mut ws = connect(port).await;

        send_event(
            &mut ws,
            json!({"type": "chat_with_bot", "text": "When do you open?", "user_id": "u1"}),
        )
        .await;
        assert_eq!(recv_message(&mut ws).await, "Our office opens at 9am.");

        // A session was lazily created but never advanced.
        let session = sessions.get("u1").await.unwrap();
        assert_eq!(session.step, enroll_assist::registration::RegistrationStep::default());

        // The registration flow starts from the beginning afterwards.
        send_event(&mut ws, message_event("hi", "u1")).await;
        assert_eq!(recv_message(&mut ws).await, QUESTION_PROMPTS[0]);
    })
    .await
    .expect("test timed out");
}

// ── Concurrency ──────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_users_complete_without_interference() {
    timeout(TEST_TIMEOUT, async {
        let (port, sessions, students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        let mut handles = Vec::new();
        for i in 0..4 {
            handles.push(tokio::spawn(async move {
                let user = format!("user-{i}");
                let mut ws = connect(port).await;

                send_event(&mut ws, message_event("hi", &user)).await;
                assert_eq!(recv_message(&mut ws).await, QUESTION_PROMPTS[0]);

                send_event(
                    &mut ws,
                    student_data_event(
                        json!({
                            "first_name": format!("User{i}"),
                            "email": format!("user{i}@example.com"),
                        }),
                        &user,
                    ),
                )
                .await;
                recv_message(&mut ws).await;

                for prompt in &QUESTION_PROMPTS[1..] {
                    send_event(&mut ws, message_event("answer", &user)).await;
                    assert_eq!(recv_message(&mut ws).await, *prompt);
                }

                send_event(&mut ws, message_event("done", &user)).await;
                assert_eq!(recv_message(&mut ws).await, TERMINAL_PROMPT);
                assert_eq!(
                    recv_message(&mut ws).await,
                    format!("Registration successful for User{i}!")
                );
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(sessions.is_empty().await);
        assert_eq!(students.list_students().await.unwrap().len(), 4);
    })
    .await
    .expect("test timed out");
}

// ── REST Endpoints ───────────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "enroll-assist");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_lists_registered_students() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        let mut student = Student::from_fields(&serde_json::Map::new());
        student.first_name = "Alice".to_string();
        student.email = "alice@example.com".to_string();
        let stored = students.save_student(&student).await.unwrap();

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/students"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["first_name"], "Alice");

        let resp = reqwest::get(format!(
            "http://127.0.0.1:{port}/api/students/{}",
            stored.id
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["email"], "alice@example.com");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_invalid_student_id_returns_400() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        let resp = reqwest::get(format!(
            "http://127.0.0.1:{port}/api/students/not-a-uuid"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    timeout(TEST_TIMEOUT, async {
        let (port, _sessions, _students) =
            start_server(Arc::new(FixedTranscriber("hi"))).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/definitely-not-a-route"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Page not found");
    })
    .await
    .expect("test timed out");
}
