use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{Bytes, to_bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use super::{AppState, breakdown};
use crate::breakdown::ExtractionMode;
use crate::breakdown::types::BreakdownResponse;
use crate::llm::TextGenerator;

struct StubGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(msg.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

async fn call(stub: Arc<StubGenerator>, body: &str) -> (StatusCode, Value) {
    let state = AppState {
        generator: stub,
        extraction: ExtractionMode::Balanced,
    };
    let resp = breakdown(State(state), Bytes::from(body.to_string()))
        .await
        .into_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn todo_reply() -> String {
    let obj = json!({
        "overview": "A simple todo app",
        "priorities": {
            "p0": {
                "frontend": {"components": [
                    {"name": "TaskList", "description": "Shows tasks", "requirements": ["list", "toggle"]}
                ]},
                "backend": {"services": [
                    {"name": "TaskService", "description": "CRUD for tasks", "requirements": ["REST"]}
                ], "dataModel": ["Task has title and done flag"]}
            }
        },
        "systemArchitecture": {
            "components": ["web client", "api"],
            "connections": ["client calls api"],
            "dataFlow": ["tasks flow from api to client"]
        },
        "developmentSteps": [
            {"phase": "Foundation", "tasks": ["scaffold"], "priority": "P0"}
        ]
    });
    format!("Sure! {obj}")
}

#[tokio::test]
async fn todo_app_backfills_p1_and_p2() {
    let stub = StubGenerator::replying(&todo_reply());
    let (status, body) = call(stub.clone(), r#"{"idea":"a todo app"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let typed: BreakdownResponse = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(typed.overview, "A simple todo app");
    assert_eq!(typed.priorities.p0.frontend.components[0].name, "TaskList");
    let empty = json!({"frontend": {"components": []}, "backend": {"services": [], "dataModel": []}});
    assert_eq!(body["priorities"]["p1"], empty);
    assert_eq!(body["priorities"]["p2"], empty);

    let prompts = stub.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"a todo app\""));
    assert!(prompts[0].contains("Depth level: 1\n"));
    assert!(!prompts[0].contains("Focus area:"));
}

#[tokio::test]
async fn depth_and_focus_area_reach_the_prompt() {
    let stub = StubGenerator::replying(&todo_reply());
    let (status, _) = call(
        stub.clone(),
        r#"{"idea":"a todo app","depth":2,"focusArea":"offline sync"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prompt = &stub.prompts()[0];
    assert!(prompt.contains("Depth level: 2\n"));
    assert!(prompt.contains("Focus area: offline sync"));
}

#[tokio::test]
async fn loosely_typed_depth_and_focus_area_are_accepted() {
    let stub = StubGenerator::replying(&todo_reply());
    let (status, _) = call(
        stub.clone(),
        r#"{"idea":"a todo app","depth":"2","focusArea":7}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prompt = &stub.prompts()[0];
    assert!(prompt.contains("Depth level: \"2\"\n"));
    assert!(prompt.contains("Focus area: 7\n"));
}

#[tokio::test]
async fn invalid_idea_is_400_without_model_call() {
    for body in [
        r#"{}"#,
        r#"{"idea": ""}"#,
        r#"{"idea": 5}"#,
        r#"{"idea": {"text": "x"}}"#,
        r#"{"depth": 3}"#,
    ] {
        let stub = StubGenerator::replying(&todo_reply());
        let (status, resp) = call(stub.clone(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(resp, json!({"error": "invalid input"}));
        assert!(stub.prompts().is_empty());
    }
}

#[tokio::test]
async fn unreadable_body_is_500() {
    let stub = StubGenerator::replying(&todo_reply());
    let (status, resp) = call(stub.clone(), "idea=a todo app").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"error": "internal server error"}));
    assert!(stub.prompts().is_empty());
}

#[tokio::test]
async fn reply_without_object_is_422() {
    let stub = StubGenerator::replying("I'm sorry, I can't produce that right now.");
    let (status, resp) = call(stub, r#"{"idea":"a todo app"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp, json!({"error": "failed to parse model response"}));
}

#[tokio::test]
async fn reply_missing_required_key_is_422() {
    for missing in [
        "overview",
        "priorities",
        "systemArchitecture",
        "developmentSteps",
    ] {
        let mut obj: Value =
            serde_json::from_str(todo_reply().trim_start_matches("Sure! ")).unwrap();
        obj.as_object_mut().unwrap().remove(missing);
        let stub = StubGenerator::replying(&obj.to_string());
        let (status, resp) = call(stub, r#"{"idea":"a todo app"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{missing}");
        assert_eq!(resp, json!({"error": "failed to parse model response"}));
    }
}

#[tokio::test]
async fn broken_json_is_422() {
    let stub = StubGenerator::replying("```json\n{\"overview\": \"x\", \"priorities\": }\n```");
    let (status, _) = call(stub, r#"{"idea":"a todo app"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upstream_failure_is_500() {
    let stub = StubGenerator::failing("connection refused");
    let (status, resp) = call(stub, r#"{"idea":"a todo app"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"error": "internal server error"}));
}

#[tokio::test]
async fn greedy_mode_is_honoured() {
    // prose braces before the object: balanced finds the object, greedy does not
    let text = format!("Plan {{draft}} follows. {}", todo_reply().trim_start_matches("Sure! "));
    let state = AppState {
        generator: StubGenerator::replying(&text),
        extraction: ExtractionMode::Greedy,
    };
    let resp = breakdown(State(state), Bytes::from_static(br#"{"idea":"a todo app"}"#))
        .await
        .into_response();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let stub = StubGenerator::replying(&text);
    let (status, _) = call(stub, r#"{"idea":"a todo app"}"#).await;
    assert_eq!(status, StatusCode::OK);
}
