//! Planner collaborator
//!
//! The planner looks at the page and the run history and proposes the next
//! task. [`LlmPlanner`] asks a vision model through any [`LLMProvider`].

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::agent::action::Action;
use crate::agent::prompts;
use crate::core::{InspectorError, Message, Result};
use crate::llm::{GenerateOptions, LLMProvider};

/// Everything the planner gets to see in one cycle
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Ledger summary JSON
    pub summary: String,
    /// Serialized page elements
    pub dom: String,
    pub url: String,
    /// Screenshot as a data URI
    pub screenshot: Option<String>,
    pub max_actions: usize,
}

/// Planner's assessment of where the run stands
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentState {
    pub evaluation_previous_goal: String,
    pub memory: String,
    pub next_goal: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerResponse {
    #[serde(default)]
    pub current_state: CurrentState,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl PlannerResponse {
    /// Parse a model answer, tolerating code fences and surrounding prose
    pub fn parse(text: &str) -> Result<Self> {
        let json = extract_json(text)
            .ok_or_else(|| InspectorError::planner("Response contains no JSON object"))?;
        serde_json::from_str(json)
            .map_err(|e| InspectorError::planner(format!("Invalid plan: {}", e)))
    }
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: &PlanRequest) -> Result<PlannerResponse>;
}

/// Planner backed by a language model
pub struct LlmPlanner {
    llm: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
}

impl LlmPlanner {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlannerResponse> {
        let mut user = Message::user(prompts::planner_user(request));
        if let Some(screenshot) = &request.screenshot {
            user = user.with_image(screenshot.clone());
        }
        let messages = [
            Message::system(prompts::planner_system(request.max_actions)),
            user,
        ];

        let options = GenerateOptions {
            temperature: Some(self.temperature),
            json: true,
            ..Default::default()
        };

        let response = self
            .llm
            .chat(&self.model, &messages, Some(options))
            .await?;
        tracing::debug!(model = %self.model, chars = response.content.len(), "Planner answered");

        PlannerResponse::parse(&response.content)
    }
}

/// Slice from the first `{` to the last `}`
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
