//! Browser actions the planner can request
//!
//! On the wire an action is `{"name": "...", "params": {...}, "description": "..."}`.
//! Parsing goes through [`RawAction`] and rejects unknown names and malformed
//! parameters, so the controller only ever sees well-formed actions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::core::InspectorError;

/// What an action does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    ClickElement { index: usize },
    FillInput { index: usize, text: String },
    ScrollDown,
    ScrollUp,
    GoToUrl { url: String },
    /// Rebuild the page snapshot
    TakeScreenshot,
    TriggerSuccess { reason: String },
    TriggerFailure { reason: String },
}

impl ActionKind {
    /// Wire name of the action
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::ClickElement { .. } => "clickElement",
            ActionKind::FillInput { .. } => "fillInput",
            ActionKind::ScrollDown => "scrollDown",
            ActionKind::ScrollUp => "scrollUp",
            ActionKind::GoToUrl { .. } => "goToUrl",
            ActionKind::TakeScreenshot => "takeScreenshot",
            ActionKind::TriggerSuccess { .. } => "triggerSuccess",
            ActionKind::TriggerFailure { .. } => "triggerFailure",
        }
    }

    fn params(&self) -> Value {
        match self {
            ActionKind::ClickElement { index } => json!({ "index": index }),
            ActionKind::FillInput { index, text } => json!({ "index": index, "text": text }),
            ActionKind::GoToUrl { url } => json!({ "url": url }),
            ActionKind::TriggerSuccess { reason } | ActionKind::TriggerFailure { reason } => {
                json!({ "reason": reason })
            }
            ActionKind::ScrollDown | ActionKind::ScrollUp | ActionKind::TakeScreenshot => {
                json!({})
            }
        }
    }
}

/// A planned action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct Action {
    pub kind: ActionKind,
    pub description: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether this action ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            ActionKind::TriggerSuccess { .. } | ActionKind::TriggerFailure { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::ClickElement { index } => write!(f, "clickElement [{}]", index),
            ActionKind::FillInput { index, text } => write!(f, "fillInput [{}] \"{}\"", index, text),
            ActionKind::GoToUrl { url } => write!(f, "goToUrl {}", url),
            kind => write!(f, "{}", kind.name()),
        }
    }
}

/// Loose wire form of an [`Action`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAction {
    pub name: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        Self {
            name: action.kind.name().to_string(),
            params: Some(action.kind.params()),
            description: action.description,
        }
    }
}

impl TryFrom<RawAction> for Action {
    type Error = InspectorError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let empty = Map::new();
        let params = match &raw.params {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => &empty,
            Some(other) => {
                return Err(InspectorError::planner(format!(
                    "params of '{}' must be an object, got {}",
                    raw.name, other
                )))
            }
        };

        let kind = match raw.name.as_str() {
            "clickElement" => ActionKind::ClickElement {
                index: index_param(&raw.name, params)?,
            },
            "fillInput" => ActionKind::FillInput {
                index: index_param(&raw.name, params)?,
                text: string_param(&raw.name, params, "text")?,
            },
            "scrollDown" => ActionKind::ScrollDown,
            "scrollUp" => ActionKind::ScrollUp,
            "goToUrl" => ActionKind::GoToUrl {
                url: string_param(&raw.name, params, "url")?,
            },
            "takeScreenshot" => ActionKind::TakeScreenshot,
            "triggerSuccess" => ActionKind::TriggerSuccess {
                reason: optional_string_param(params, "reason"),
            },
            "triggerFailure" => ActionKind::TriggerFailure {
                reason: optional_string_param(params, "reason"),
            },
            other => {
                return Err(InspectorError::planner(format!("Unknown action '{}'", other)))
            }
        };

        Ok(Self {
            kind,
            description: raw.description,
        })
    }
}

/// Element index; numeric strings are accepted, labels are not
fn index_param(action: &str, params: &Map<String, Value>) -> Result<usize, InspectorError> {
    let index = match params.get("index") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    index
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| {
            InspectorError::planner(format!(
                "'{}' needs a numeric element index, got {}",
                action,
                params.get("index").unwrap_or(&Value::Null)
            ))
        })
}

fn string_param(
    action: &str,
    params: &Map<String, Value>,
    key: &str,
) -> Result<String, InspectorError> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(InspectorError::planner(format!(
            "'{}' needs a '{}' parameter",
            action, key
        ))),
    }
}

fn optional_string_param(params: &Map<String, Value>, key: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Drop terminal actions from multi-action plans, then cap the plan length.
///
/// A terminal action is only honoured when it is the whole plan.
pub fn sanitize(mut actions: Vec<Action>, max_actions: usize) -> Vec<Action> {
    if actions.len() >= 2 && actions.iter().any(Action::is_terminal) {
        let before = actions.len();
        actions.retain(|a| !a.is_terminal());
        tracing::debug!(
            dropped = before - actions.len(),
            "Dropped terminal actions from multi-action plan"
        );
    }
    actions.truncate(max_actions);
    actions
}
