//! Planned tasks and their actions

use serde::Serialize;

use crate::agent::action::Action;

/// Lifecycle of a task or one of its actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

fn new_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// One action of a task, with its outcome
#[derive(Debug, Clone, Serialize)]
pub struct TaskAction {
    pub id: String,
    #[serde(flatten)]
    pub action: Action,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TaskAction {
    pub fn new(action: Action) -> Self {
        Self {
            id: new_id(),
            action,
            status: Status::Pending,
            reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn complete(&mut self) {
        self.status = Status::Completed;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = Status::Failed;
        self.reason = Some(reason.into());
    }

    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = Status::Cancelled;
        self.reason = Some(reason.into());
    }
}

/// One planning step: a goal and the actions meant to reach it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub goal: String,
    /// Planner's own notes, echoed back on the next cycle
    pub memory: String,
    pub evaluation_previous_goal: String,
    pub actions: Vec<TaskAction>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Task {
    pub fn new(goal: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            id: new_id(),
            goal: goal.into(),
            memory: String::new(),
            evaluation_previous_goal: String::new(),
            actions: actions.into_iter().map(TaskAction::new).collect(),
            status: Status::Pending,
            reason: None,
        }
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = memory.into();
        self
    }

    pub fn with_evaluation(mut self, evaluation: impl Into<String>) -> Self {
        self.evaluation_previous_goal = evaluation.into();
        self
    }

    pub fn is_finished(&self) -> bool {
        self.status != Status::Pending
    }

    pub fn complete(&mut self) {
        self.status = Status::Completed;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = Status::Failed;
        self.reason = Some(reason.into());
    }

    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = Status::Cancelled;
        self.reason = Some(reason.into());
    }

    /// Cancel every still-pending action from `start` onwards
    pub fn cancel_pending_from(&mut self, start: usize, reason: &str) {
        for action in self.actions.iter_mut().skip(start) {
            if action.is_pending() {
                action.cancel(reason);
            }
        }
    }
}
