//! Run commands
//!
//! Builds one controller per test case and runs single cases or batch files.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{AgentController, LlmEvaluator, LlmPlanner};
use crate::browser::{AgentBrowser, Browser};
use crate::cli::reporter::ConsoleReporter;
use crate::core::{
    Config, InspectorError, Result, TestResult, Variable, VariableSet, VariableString,
};
use crate::llm::{LLMProvider, OllamaClient};

/// A batch file
#[derive(Debug, Clone, Deserialize)]
pub struct CaseFile {
    #[serde(default)]
    pub context: CaseContext,
    pub cases: Vec<TestCase>,
}

/// Settings shared by every case of a batch file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseContext {
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub start_url: String,
    pub user_story: String,
}

impl CaseFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InspectorError::with_context(format!("Failed to read {}", path.display()), e)
        })?;
        let file: CaseFile = serde_json::from_str(&content).map_err(|e| {
            InspectorError::with_context(format!("Failed to parse {}", path.display()), e)
        })?;
        if file.cases.is_empty() {
            return Err(InspectorError::config(format!(
                "{} contains no cases",
                path.display()
            )));
        }
        Ok(file)
    }
}

/// Outcome of one case, with the story masked
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub case: usize,
    pub start_url: String,
    pub user_story: String,
    #[serde(flatten)]
    pub result: TestResult,
}

/// Runs test cases against the configured models
pub struct Runner {
    config: Config,
    llm: Arc<dyn LLMProvider>,
    quiet: bool,
}

impl Runner {
    pub fn new(config: Config) -> Result<Self> {
        let llm = Arc::new(OllamaClient::from_config(&config)?);
        Ok(Self::with_provider(config, llm))
    }

    pub fn with_provider(config: Config, llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            config,
            llm,
            quiet: false,
        }
    }

    /// Only print failures while running
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the model server, both models and agent-browser are usable
    pub async fn check_dependencies(&self) -> Result<()> {
        self.llm.list_models().await.map_err(|e| {
            InspectorError::with_context(
                format!("{} is not reachable at {}", self.llm.name(), self.config.ollama_url()),
                e,
            )
        })?;

        for model in [&self.config.models.planner, &self.config.models.evaluator] {
            if !self.llm.is_model_available(model).await? {
                return Err(InspectorError::ModelNotFound(model.clone()));
            }
        }

        if !AgentBrowser::is_available().await {
            return Err(InspectorError::AgentBrowserNotFound);
        }
        Ok(())
    }

    /// Run one case in its own browser session
    pub async fn run_case(
        &self,
        number: usize,
        session: String,
        case: TestCase,
        variables: VariableSet,
    ) -> CaseReport {
        let story = VariableString::new(case.user_story.as_str(), variables.clone());
        let start_url = VariableString::new(case.start_url.as_str(), variables.clone());
        let mut report = CaseReport {
            case: number,
            start_url: start_url.masked_value(),
            user_story: story.masked_value(),
            result: TestResult::failed("Not run"),
        };

        if let Err(e) = url::Url::parse(&start_url.resolved_value()) {
            report.result = TestResult::failed(format!("Invalid start URL: {}", e));
            return report;
        }

        tracing::info!(case = number, %session, "Starting case");

        let browser: Arc<dyn Browser> =
            Arc::new(AgentBrowser::from_config(&self.config.browser).with_session(session));
        let models = &self.config.models;
        let planner = Arc::new(
            LlmPlanner::new(self.llm.clone(), models.planner.clone())
                .with_temperature(models.temperature),
        );
        let evaluator = Arc::new(
            LlmEvaluator::new(self.llm.clone(), models.evaluator.clone())
                .with_temperature(models.temperature),
        );
        let reporter =
            Arc::new(ConsoleReporter::new(format!("case {}", number)).quiet(self.quiet));

        let mut controller =
            AgentController::new(browser.clone(), planner, evaluator, &self.config)
                .with_reporter(reporter)
                .with_variables(variables);

        let run = controller.launch(&case.start_url, &case.user_story);
        report.result = match self.config.agent.run_timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                Ok(result) => result,
                Err(_) => TestResult::failed(format!("Run timed out after {}s", secs)),
            },
            None => run.await,
        };

        tracing::debug!(case = number, progress = %controller.ledger().report(), "Run progress");

        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "Could not close browser session");
        }
        report
    }

    /// Run every case, `batch.concurrency` at a time, keeping input order
    pub async fn run_cases(&self, cases: Vec<TestCase>, variables: VariableSet) -> Vec<CaseReport> {
        let base = self.config.browser.session_name.clone();
        let concurrency = self.config.batch.concurrency.max(1);

        futures::stream::iter(cases.into_iter().enumerate().map(|(i, case)| {
            let number = i + 1;
            self.run_case(number, format!("{}-{}", base, number), case, variables.clone())
        }))
        .buffered(concurrency)
        .collect()
        .await
    }

    pub async fn run_file(&self, path: &Path) -> Result<Vec<CaseReport>> {
        let file = CaseFile::load(path)?;
        let variables: VariableSet = Arc::from(file.context.variables);
        tracing::info!(cases = file.cases.len(), path = %path.display(), "Running batch file");
        Ok(self.run_cases(file.cases, variables).await)
    }
}
