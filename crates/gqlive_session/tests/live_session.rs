//! End-to-end session scenarios: a real config directory, a mock GraphQL
//! server, and the full resolve -> collect -> execute -> sink flow.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gqlive_client::StreamSettings;
use gqlive_core::OperationLiteral;
use gqlive_session::{OperationSession, Prompter, Renderer, SessionOptions, SessionOutcome};

struct ScriptedPrompter {
    answers: Mutex<Vec<Option<String>>>,
    choice: Option<String>,
}

impl ScriptedPrompter {
    fn silent() -> Self {
        Self {
            answers: Mutex::new(Vec::new()),
            choice: None,
        }
    }

    fn with_answers(answers: Vec<&str>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().rev().map(|a| Some(a.to_string())).collect()),
            choice: None,
        }
    }

    fn with_choice(choice: &str) -> Self {
        Self {
            answers: Mutex::new(Vec::new()),
            choice: Some(choice.to_string()),
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn prompt(&self, _message: &str) -> Option<String> {
        self.answers.lock().unwrap().pop().flatten()
    }

    async fn select(&self, _message: &str, options: &[String]) -> Option<String> {
        match &self.choice {
            Some(choice) => Some(choice.clone()),
            None => options.first().cloned(),
        }
    }
}

#[derive(Default)]
struct RecordingRenderer {
    frames: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, content: &str) {
        self.frames.lock().unwrap().push(content.to_string());
    }
}

fn workspace_with_schema(url: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".graphqlrc.yml"), format!("schema: {url}\n")).unwrap();
    dir
}

fn no_delay() -> SessionOptions {
    SessionOptions {
        settle_delay: Duration::ZERO,
        stream: StreamSettings::default(),
    }
}

fn session(
    dir: &tempfile::TempDir,
    text: &str,
    prompter: ScriptedPrompter,
    renderer: &Arc<RecordingRenderer>,
) -> OperationSession {
    let literal = OperationLiteral::from_text("queries/op.graphql", text).unwrap();
    OperationSession::new(
        dir.path(),
        literal,
        Arc::new(prompter),
        Arc::clone(renderer) as Arc<dyn Renderer>,
    )
    .with_options(no_delay())
}

#[tokio::test]
async fn variable_free_query_fills_the_buffer_with_pretty_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"x": 1},
            "errors": null,
        })))
        .mount(&server)
        .await;

    let dir = workspace_with_schema(&server.uri());
    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(&dir, "query { x }", ScriptedPrompter::silent(), &renderer);

    let outcome = session.run().await;

    assert_eq!(outcome, SessionOutcome::Executed);
    let expected = serde_json::to_string_pretty(&serde_json::json!({
        "data": {"x": 1},
        "errors": null,
    }))
    .unwrap();
    assert_eq!(session.sink().snapshot(), expected);
    assert_eq!(renderer.count(), 1, "render fires exactly once for a query");
}

#[tokio::test]
async fn prompted_variables_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "variables": {"id": "42", "limit": 10},
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"ok": true}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = workspace_with_schema(&server.uri());
    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(
        &dir,
        "query Q($id: ID!, $limit: Int) { items(id: $id, limit: $limit) }",
        ScriptedPrompter::with_answers(vec!["42", "10"]),
        &renderer,
    );

    assert_eq!(session.run().await, SessionOutcome::Executed);
    assert_eq!(renderer.count(), 1);
    assert!(session.sink().snapshot().contains("\"ok\": true"));
}

#[tokio::test]
async fn config_failure_never_reaches_the_executor() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(&dir, "query { x }", ScriptedPrompter::silent(), &renderer);

    let outcome = session.run().await;

    assert_eq!(outcome, SessionOutcome::ConfigFailed);
    let snapshot = session.sink().snapshot();
    assert_eq!(
        snapshot,
        format!(
            "Error: no GraphQL config file found in {}",
            dir.path().display()
        )
    );
    // The single render carries the error text and nothing else.
    assert_eq!(renderer.count(), 1);
    assert_eq!(renderer.frames.lock().unwrap()[0], snapshot);
}

#[tokio::test]
async fn embedded_error_indicator_surfaces_as_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "InternalError: upstream gone"},
        })))
        .mount(&server)
        .await;

    let dir = workspace_with_schema(&server.uri());
    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(&dir, "query { status }", ScriptedPrompter::silent(), &renderer);

    assert_eq!(session.run().await, SessionOutcome::Executed);

    let snapshot = session.sink().snapshot();
    assert!(snapshot.contains("InternalError"));
    // The error text, not the structured {data, errors} shape.
    assert!(serde_json::from_str::<serde_json::Value>(&snapshot)
        .map(|v| v.get("data").is_none())
        .unwrap_or(true));
}

#[tokio::test]
async fn named_endpoint_selection_goes_through_the_prompter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"env": "prod"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".graphqlrc.yml"),
        format!(
            "schema: ./schema.graphql\nendpoints:\n  dev: http://127.0.0.1:9/graphql\n  prod: {}\n",
            server.uri()
        ),
    )
    .unwrap();

    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(
        &dir,
        "query { env }",
        ScriptedPrompter::with_choice("prod"),
        &renderer,
    );

    assert_eq!(session.run().await, SessionOutcome::Executed);
    assert!(session.sink().snapshot().contains("\"env\": \"prod\""));
}

/// Minimal graphql-transport-ws server: ack the init, answer one
/// subscribe with the given payloads, then complete.
async fn serve_subscription(listener: TcpListener, payloads: Vec<serde_json::Value>) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &tokio_tungstenite::tungstenite::handshake::server::Request,
         mut response: tokio_tungstenite::tungstenite::handshake::server::Response| {
            if let Some(protocol) = req.headers().get("Sec-WebSocket-Protocol").cloned() {
                response.headers_mut().insert("Sec-WebSocket-Protocol", protocol);
            }
            Ok(response)
        },
    )
    .await
    .unwrap();

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else { continue };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        match value["type"].as_str() {
            Some("connection_init") => {
                ws.send(Message::Text(r#"{"type":"connection_ack"}"#.into()))
                    .await
                    .unwrap();
            }
            Some("subscribe") => {
                let id = value["id"].as_str().unwrap();
                for payload in &payloads {
                    let next = serde_json::json!({"type": "next", "id": id, "payload": payload});
                    ws.send(Message::Text(next.to_string().into())).await.unwrap();
                }
                let complete = serde_json::json!({"type": "complete", "id": id});
                ws.send(Message::Text(complete.to_string().into()))
                    .await
                    .unwrap();
                break;
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn subscription_messages_accumulate_newest_first() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(serve_subscription(
        listener,
        vec![
            serde_json::json!({"data": {"tick": "M1"}, "errors": null}),
            serde_json::json!({"data": {"tick": "M2"}}),
        ],
    ));

    let dir = workspace_with_schema(&format!("http://127.0.0.1:{port}/graphql"));
    let renderer = Arc::new(RecordingRenderer::default());
    let session = session(
        &dir,
        "subscription { tick }",
        ScriptedPrompter::silent(),
        &renderer,
    );

    assert_eq!(session.run().await, SessionOutcome::Executed);

    // The forwarder runs in the background; wait for both messages.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while renderer.count() < 2 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for pushed messages, buffer: {:?}",
            session.sink().snapshot()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(renderer.count(), 2, "one render per pushed message");
    let snapshot = session.sink().snapshot();
    let m2 = snapshot.find("M2").expect("M2 present");
    let m1 = snapshot.find("M1").expect("M1 present");
    assert!(m2 < m1, "newest message first: {snapshot}");
}
