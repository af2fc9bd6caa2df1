//! Scripted collaborators for controller and snapshot tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use webinspector::agent::{
    EvaluationRequest, Evaluator, PlanRequest, Planner, PlannerResponse, Reporter,
};
use webinspector::browser::Browser;
use webinspector::core::{
    Config, Coordinates, InspectorError, Result, ScrollDirection, TestResult, VariableString,
};
use webinspector::dom::script::capture_script;

/// A browser call as observed by the page
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Launch(String),
    Click(Coordinates),
    /// Text the page actually received
    Type(Coordinates, String),
    Scroll(ScrollDirection),
    Navigate(String),
    Close,
}

struct FakeState {
    pages: Vec<Value>,
    current: usize,
    calls: Vec<Call>,
    url: String,
    fail_launch: bool,
    captures: usize,
}

/// In-memory browser serving canned page captures. Each click moves to the
/// next page, if there is one.
pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    pub fn new(first_page: Value) -> Self {
        Self {
            state: Mutex::new(FakeState {
                pages: vec![first_page],
                current: 0,
                calls: Vec::new(),
                url: String::new(),
                fail_launch: false,
                captures: 0,
            }),
        }
    }

    /// Page shown after the next click
    pub fn then(self, page: Value) -> Self {
        self.state.lock().unwrap().pages.push(page);
        self
    }

    pub fn failing_launch(self) -> Self {
        self.state.lock().unwrap().fail_launch = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clicks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Click(_)))
            .count()
    }

    pub fn typed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Type(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn captures(&self) -> usize {
        self.state.lock().unwrap().captures
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn launch(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_launch {
            return Err(InspectorError::browser(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            )));
        }
        state.url = url.to_string();
        state.calls.push(Call::Launch(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn wait_for_stable(&self) -> Result<()> {
        Ok(())
    }

    async fn click(&self, at: Coordinates) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Click(at));
        if state.current + 1 < state.pages.len() {
            state.current += 1;
        }
        Ok(())
    }

    async fn type_at(&self, at: Coordinates, text: &VariableString) -> Result<()> {
        self.record(Call::Type(at, text.resolved_value()));
        Ok(())
    }

    async fn scroll(&self, direction: ScrollDirection) -> Result<()> {
        self.record(Call::Scroll(direction));
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.calls.push(Call::Navigate(url.to_string()));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        if script == capture_script() {
            state.captures += 1;
            return Ok(state.pages[state.current].clone());
        }
        // overlay scripts
        Ok(Value::Bool(true))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

/// Planner answering from a script; errors once the script runs out
pub struct ScriptedPlanner {
    responses: Mutex<VecDeque<Result<PlannerResponse>>>,
    requests: Mutex<Vec<PlanRequest>>,
}

impl ScriptedPlanner {
    /// Each entry is a raw model answer, parsed like a real one
    pub fn new(answers: &[&str]) -> Self {
        Self {
            responses: Mutex::new(answers.iter().map(|a| PlannerResponse::parse(a)).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlannerResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InspectorError::planner("script exhausted")))
    }
}

/// Evaluator with a fixed verdict
pub struct ScriptedEvaluator {
    verdict: Option<TestResult>,
    calls: AtomicUsize,
    last_request: Mutex<Option<EvaluationRequest>>,
}

impl ScriptedEvaluator {
    pub fn returning(verdict: TestResult) -> Self {
        Self {
            verdict: Some(verdict),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EvaluationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<TestResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.verdict
            .clone()
            .ok_or_else(|| InspectorError::evaluation("model unavailable"))
    }
}

/// Reporter keeping every message it was given
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn push(&self, kind: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(format!("{}: {}", kind, message));
    }
}

impl Reporter for RecordingReporter {
    fn loading(&self, message: &str) {
        self.push("loading", message);
    }
    fn success(&self, message: &str) {
        self.push("success", message);
    }
    fn failure(&self, message: &str) {
        self.push("failure", message);
    }
    fn info(&self, message: &str) {
        self.push("info", message);
    }
}

/// Config with no waiting between actions
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.agent.settle_delay_ms = 0;
    config.agent.max_retries = 5;
    config.agent.max_actions_per_task = 5;
    config.agent.replan_on_dom_change = true;
    config.agent.run_timeout_secs = None;
    config.browser.viewport_expansion = 0;
    config.browser.highlight = true;
    config
}

/// An indexable element 40px tall at row `row`
pub fn element(parent: usize, tag: &str, attributes: Value, row: usize) -> Value {
    json!({
        "type": "element",
        "parent": parent,
        "tag": tag,
        "attributes": attributes,
        "xpath": format!("html/body/{}[{}]", tag, row + 1),
        "rect": {"x": 20.0, "y": 20.0 + 50.0 * row as f64, "width": 200.0, "height": 40.0},
        "offsetWidth": 200.0,
        "offsetHeight": 40.0,
        "visibility": "visible",
        "display": "block",
        "listeners": [],
        "hit": true
    })
}

pub fn text(parent: usize, content: &str) -> Value {
    json!({"type": "text", "parent": parent, "text": content, "visible": true})
}

/// A page capture: `body` followed by `children`, all parented to the body
/// unless they name another parent.
pub fn page(children: Vec<Value>) -> Value {
    let mut nodes = vec![json!({
        "type": "element",
        "tag": "body",
        "xpath": "html/body",
        "rect": {"x": 0.0, "y": 0.0, "width": 1280.0, "height": 720.0},
        "offsetWidth": 1280.0,
        "offsetHeight": 720.0,
        "hit": false
    })];
    nodes.extend(children);
    json!({
        "viewport": {"width": 1280.0, "height": 720.0, "scrollX": 0.0, "scrollY": 0.0},
        "nodes": nodes
    })
}

pub fn login_page() -> Value {
    page(vec![
        element(0, "input", json!({"type": "text", "name": "username"}), 0),
        element(0, "input", json!({"type": "password", "name": "password"}), 1),
        element(0, "button", json!({"type": "submit"}), 2),
        text(3, "Sign in"),
    ])
}

pub fn dashboard_page() -> Value {
    page(vec![
        element(0, "h1", json!({}), 0),
        text(1, "Welcome back"),
        element(0, "a", json!({"href": "/settings"}), 1),
        element(0, "a", json!({"href": "/logout"}), 2),
        element(0, "button", json!({"aria-label": "Menu"}), 3),
    ])
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
