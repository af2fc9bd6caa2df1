//! Agent module - planning, execution and bookkeeping of one test run
//!
//! Contains the controller state machine together with the planner and
//! evaluator seams it drives.

pub mod action;
pub mod controller;
pub mod evaluator;
pub mod ledger;
pub mod planner;
pub mod prompts;
pub mod reporter;
pub mod state;
pub mod task;

pub use action::{sanitize, Action, ActionKind, RawAction};
pub use controller::{AgentController, KEEP_TRYING_GOAL, MAX_RETRIES_REASON, STALE_PLAN_REASON};
pub use evaluator::{EvaluationRequest, Evaluator, LlmEvaluator};
pub use ledger::TaskLedger;
pub use planner::{CurrentState, LlmPlanner, PlanRequest, Planner, PlannerResponse};
pub use reporter::{NoopReporter, Reporter};
pub use state::{RunLoopState, RunState};
pub use task::{Status, Task, TaskAction};
