//! Evaluator collaborator
//!
//! Gives the final verdict once the planner claims success.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::agent::planner::extract_json;
use crate::agent::prompts;
use crate::core::{InspectorError, Message, Result, TestResult, TestStatus};
use crate::llm::{GenerateOptions, LLMProvider};

#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Masked user story
    pub end_goal: String,
    /// Ledger summary JSON
    pub summary: String,
    pub url: String,
    pub screenshot: Option<String>,
    /// Reason given with the success trigger
    pub claimed_reason: String,
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<TestResult>;
}

#[derive(Debug, Deserialize)]
struct Verdict {
    status: String,
    #[serde(default)]
    reason: String,
}

/// Parse `{"status": "passed"|"failed", "reason": ...}` out of a model answer
pub fn parse_verdict(text: &str) -> Result<TestResult> {
    let json = extract_json(text)
        .ok_or_else(|| InspectorError::evaluation("Response contains no JSON object"))?;
    let verdict: Verdict = serde_json::from_str(json)
        .map_err(|e| InspectorError::evaluation(format!("Invalid verdict: {}", e)))?;

    let status = match verdict.status.trim().to_ascii_lowercase().as_str() {
        "passed" | "pass" | "success" | "completed" => TestStatus::Passed,
        "failed" | "fail" | "failure" => TestStatus::Failed,
        other => {
            return Err(InspectorError::evaluation(format!(
                "Unknown verdict status '{}'",
                other
            )))
        }
    };
    Ok(TestResult {
        status,
        reason: verdict.reason,
    })
}

/// Evaluator backed by a language model
pub struct LlmEvaluator {
    llm: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
}

impl LlmEvaluator {
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
impl Evaluator for LlmEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<TestResult> {
        let mut user = Message::user(prompts::evaluator_user(request));
        if let Some(screenshot) = &request.screenshot {
            user = user.with_image(screenshot.clone());
        }
        let messages = [Message::system(prompts::evaluator_system()), user];
        let options = GenerateOptions {
            temperature: Some(self.temperature),
            json: true,
            ..Default::default()
        };

        let response = self
            .llm
            .chat(&self.model, &messages, Some(options))
            .await?;
        let result = parse_verdict(&response.content)?;
        tracing::debug!(model = %self.model, status = %result.status, "Evaluator answered");
        Ok(result)
    }
}
