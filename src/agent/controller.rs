//! Agent controller
//!
//! Runs one test case: snapshot the page, ask the planner for a task, execute
//! its actions, and repeat until a terminal action or the failure budget ends
//! the run. A claimed success is handed to the evaluator for the verdict.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::action::{sanitize, Action, ActionKind};
use crate::agent::evaluator::{EvaluationRequest, Evaluator};
use crate::agent::ledger::TaskLedger;
use crate::agent::planner::{PlanRequest, Planner};
use crate::agent::reporter::{NoopReporter, Reporter};
use crate::agent::state::{RunLoopState, RunState};
use crate::agent::task::Task;
use crate::browser::{Browser, InlineScreenshotter, Screenshotter};
use crate::core::config::AgentConfig;
use crate::core::{
    redact_secrets, Config, Coordinates, InspectorError, Result, ScrollDirection, TestResult,
    VariableSet, VariableString,
};
use crate::dom::{SnapshotBuilder, ViewportExpansion, EMPTY_TREE_HASH};

pub use crate::agent::state::MAX_RETRIES_REASON;

/// Reason recorded on actions and tasks cancelled because the page changed
pub const STALE_PLAN_REASON: &str =
    "The page changed since this plan was made; the remaining actions were cancelled";

/// Goal of the placeholder task recorded when planning fails
pub const KEEP_TRYING_GOAL: &str = "Keep trying";

const NO_ACTION_REASON: &str = "The plan contained no executable action";

/// What executing one action means for the run
#[derive(Debug)]
enum Outcome {
    Continue,
    Succeeded(String),
    Failed(String),
}

/// Drives a single browser session through one user story
pub struct AgentController {
    browser: Arc<dyn Browser>,
    snapshots: SnapshotBuilder,
    planner: Arc<dyn Planner>,
    evaluator: Arc<dyn Evaluator>,
    screenshotter: Arc<dyn Screenshotter>,
    reporter: Arc<dyn Reporter>,
    variables: VariableSet,
    ledger: TaskLedger,
    settings: AgentConfig,
    highlight: bool,
    state: RunLoopState,
}

impl AgentController {
    pub fn new(
        browser: Arc<dyn Browser>,
        planner: Arc<dyn Planner>,
        evaluator: Arc<dyn Evaluator>,
        config: &Config,
    ) -> Self {
        let snapshots = SnapshotBuilder::new(
            browser.clone(),
            ViewportExpansion::from_setting(config.browser.viewport_expansion),
        )
        .with_highlights(config.browser.highlight);

        Self {
            browser,
            snapshots,
            planner,
            evaluator,
            screenshotter: Arc::new(InlineScreenshotter::new()),
            reporter: Arc::new(NoopReporter),
            variables: Arc::from(Vec::new()),
            ledger: TaskLedger::new(),
            settings: config.agent.clone(),
            highlight: config.browser.highlight,
            state: RunLoopState::new(config.agent.max_retries),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_screenshotter(mut self, screenshotter: Arc<dyn Screenshotter>) -> Self {
        self.screenshotter = screenshotter;
        self
    }

    pub fn with_variables(mut self, variables: VariableSet) -> Self {
        self.variables = variables;
        self
    }

    pub fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    pub fn run_state(&self) -> &RunState {
        &self.state.state
    }

    /// Open `start_url` and run the story to a verdict. Never returns an error:
    /// every failure becomes a failed [`TestResult`].
    ///
    /// Both arguments are templates; only the browser sees resolved values.
    pub async fn launch(&mut self, start_url: &str, user_story: &str) -> TestResult {
        let url = VariableString::new(start_url, self.variables.clone());
        self.reporter.loading(&format!("Opening {}", url.masked_value()));
        if let Err(e) = self.browser.launch(&url.resolved_value()).await {
            let reason = format!(
                "Could not open {}: {}",
                url.masked_value(),
                self.redact(&e.to_string())
            );
            self.state.fail(reason.clone());
            self.reporter.failure(&reason);
            return TestResult::failed(reason);
        }

        let story = VariableString::new(user_story, self.variables.clone());
        if let Err(e) = self.ledger.set_end_goal(story.masked_value()) {
            self.state.fail(e.to_string());
            return TestResult::failed(e.to_string());
        }

        self.run().await
    }

    /// Plan/execute until the run reaches a terminal state
    pub async fn run(&mut self) -> TestResult {
        while self.state.should_continue() {
            self.state.next_cycle();
            tracing::info!(
                cycle = self.state.cycle,
                failures = self.state.consecutive_failures,
                "Planning"
            );

            let (mut task, plan_hash) = self.plan().await;

            if task.actions.is_empty() {
                if !task.is_finished() {
                    task.fail(NO_ACTION_REASON);
                }
                self.state.record_failure();
                self.reporter.failure(&format!(
                    "{} ({})",
                    task.goal,
                    task.reason.as_deref().unwrap_or(NO_ACTION_REASON)
                ));
                self.ledger.persist(task);
                continue;
            }

            self.reporter.info(&format!("Task: {}", task.goal));
            self.execute_task(&mut task, &plan_hash).await;
            self.ledger.persist(task);
        }

        let result = match self.state.state.clone() {
            RunState::Succeeded { reason } => self.evaluate(reason).await,
            RunState::Failed { reason } => TestResult::failed(reason),
            RunState::Running => TestResult::failed("Run stopped before reaching a verdict"),
        };

        if result.is_passed() {
            self.reporter.success(&result.reason);
        } else {
            self.reporter.failure(&result.reason);
        }
        tracing::info!(status = %result.status, cycles = self.state.cycle, "Run finished");
        result
    }

    /// Snapshot the page and ask the planner for the next task.
    /// Returns the task and the page hash it was planned against.
    async fn plan(&mut self) -> (Task, String) {
        self.reporter.loading("Looking at the page");

        let snapshot = self.snapshots.snapshot().await;
        let (dom, hash) = match &snapshot {
            Some(s) => (s.serialized.clone(), s.hash.clone()),
            None => (String::new(), EMPTY_TREE_HASH.to_string()),
        };

        let url = match self.browser.current_url().await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the current URL");
                String::new()
            }
        };

        let screenshot = match self
            .screenshotter
            .take_screenshot(self.browser.as_ref())
            .await
        {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::warn!(error = %e, "Could not take a screenshot");
                None
            }
        };

        let request = PlanRequest {
            summary: self.ledger.serialized_summary(),
            dom,
            url,
            screenshot,
            max_actions: self.settings.max_actions_per_task,
        };

        self.reporter.loading("Planning next steps");
        let task = match self.planner.plan(&request).await {
            Ok(response) => {
                let actions = sanitize(response.actions, self.settings.max_actions_per_task);
                let state = response.current_state;
                tracing::debug!(goal = %state.next_goal, actions = actions.len(), "Planner proposed a task");
                Task::new(state.next_goal, actions)
                    .with_memory(state.memory)
                    .with_evaluation(state.evaluation_previous_goal)
            }
            Err(e) => {
                let reason = self.redact(&e.to_string());
                tracing::warn!(error = %reason, "Planning failed");
                let mut task = Task::new(KEEP_TRYING_GOAL, Vec::new());
                task.fail(reason);
                task
            }
        };

        (task, hash)
    }

    async fn execute_task(&mut self, task: &mut Task, plan_hash: &str) {
        self.snapshots.clear_highlights().await;

        for i in 0..task.actions.len() {
            if i > 0 && self.settings.replan_on_dom_change {
                let live_hash = self.snapshots.current_hash().await;
                if live_hash != plan_hash {
                    tracing::info!(action = i, "Page changed under the plan, replanning");
                    task.cancel_pending_from(i, STALE_PLAN_REASON);
                    task.cancel(STALE_PLAN_REASON);
                    self.reporter.info(STALE_PLAN_REASON);
                    return;
                }
            }

            let action = task.actions[i].action.clone();
            self.reporter.loading(&self.describe(&action));

            match self.execute_action(&action).await {
                Ok(Outcome::Continue) => {
                    task.actions[i].complete();
                    self.state.record_success();
                    if self.settings.settle_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.settings.settle_delay_ms))
                            .await;
                    }
                }
                Ok(Outcome::Succeeded(reason)) => {
                    task.actions[i].complete();
                    task.complete();
                    self.state.succeed(reason);
                    return;
                }
                Ok(Outcome::Failed(reason)) => {
                    task.actions[i].complete();
                    task.complete();
                    self.state.fail(reason);
                    return;
                }
                Err(e) => {
                    let reason = self.redact(&e.to_string());
                    tracing::warn!(action = %action.name(), error = %reason, "Action failed");
                    self.reporter.failure(&reason);
                    task.actions[i].fail(reason.clone());
                    task.cancel_pending_from(i + 1, "A previous action failed");
                    task.fail(reason);
                    self.state.record_failure();
                    return;
                }
            }
        }

        task.complete();
    }

    async fn execute_action(&mut self, action: &Action) -> Result<Outcome> {
        match &action.kind {
            ActionKind::ClickElement { index } => {
                let at = self.resolve(*index)?;
                if self.highlight {
                    self.snapshots.highlight_pointer(at).await;
                }
                self.browser.click(at).await?;
            }
            ActionKind::FillInput { index, text } => {
                let at = self.resolve(*index)?;
                if self.highlight {
                    self.snapshots.highlight_pointer(at).await;
                }
                let value = VariableString::new(text.as_str(), self.variables.clone());
                self.browser.type_at(at, &value).await?;
            }
            ActionKind::ScrollDown => self.browser.scroll(ScrollDirection::Down).await?,
            ActionKind::ScrollUp => self.browser.scroll(ScrollDirection::Up).await?,
            ActionKind::GoToUrl { url } => {
                let url = VariableString::new(url.as_str(), self.variables.clone());
                self.browser.navigate(&url.resolved_value()).await?;
            }
            ActionKind::TakeScreenshot => {
                self.snapshots.clear_highlights().await;
                self.snapshots.snapshot().await;
            }
            ActionKind::TriggerSuccess { reason } => {
                return Ok(Outcome::Succeeded(reason.clone()))
            }
            ActionKind::TriggerFailure { reason } => return Ok(Outcome::Failed(reason.clone())),
        }
        Ok(Outcome::Continue)
    }

    fn resolve(&self, index: usize) -> Result<Coordinates> {
        self.snapshots
            .resolve(index)
            .ok_or(InspectorError::UnknownIndex(index))
    }

    fn redact(&self, text: &str) -> String {
        redact_secrets(&self.variables, text)
    }

    /// Reporter line for an action, with secrets masked
    fn describe(&self, action: &Action) -> String {
        let masked = |text: &str| VariableString::new(text, self.variables.clone()).masked_value();
        match &action.kind {
            ActionKind::FillInput { index, text } => {
                format!("Typing \"{}\" into [{}]", masked(text), index)
            }
            ActionKind::GoToUrl { url } => format!("Navigating to {}", masked(url)),
            _ => match &action.description {
                Some(description) => format!("{}: {}", action.name(), description),
                None => action.to_string(),
            },
        }
    }

    async fn evaluate(&self, claimed_reason: String) -> TestResult {
        self.reporter.loading("Checking the result");
        if let Err(e) = self.browser.wait_for_stable().await {
            tracing::debug!(error = %e, "Page did not settle before evaluation");
        }

        let url = self.browser.current_url().await.unwrap_or_default();
        let screenshot = match self
            .screenshotter
            .take_screenshot(self.browser.as_ref())
            .await
        {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::warn!(error = %e, "Could not take a screenshot for evaluation");
                None
            }
        };

        let request = EvaluationRequest {
            end_goal: self.ledger.end_goal().unwrap_or_default().to_string(),
            summary: self.ledger.serialized_summary(),
            url,
            screenshot,
            claimed_reason,
        };

        match self.evaluator.evaluate(&request).await {
            Ok(result) => result,
            Err(e) => TestResult::failed(format!(
                "Evaluation failed: {}",
                self.redact(&e.to_string())
            )),
        }
    }
}
