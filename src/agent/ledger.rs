//! Task ledger
//!
//! Append/update log of the tasks planned during one run. Its JSON summary is
//! the only memory the planner has between cycles.

use serde_json::json;

use crate::agent::task::Task;
use crate::core::{InspectorError, Result};

#[derive(Debug, Clone, Default)]
pub struct TaskLedger {
    end_goal: Option<String>,
    tasks: Vec<Task>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the objective of the run. Allowed once.
    pub fn set_end_goal(&mut self, goal: impl Into<String>) -> Result<()> {
        if self.end_goal.is_some() {
            return Err(InspectorError::EndGoalAlreadySet);
        }
        self.end_goal = Some(goal.into());
        Ok(())
    }

    pub fn end_goal(&self) -> Option<&str> {
        self.end_goal.as_deref()
    }

    pub fn append(&mut self, task: Task) -> Result<()> {
        if self.position(&task.id).is_some() {
            return Err(InspectorError::DuplicateTask(task.id));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Replace the task with the same id
    pub fn update(&mut self, task: Task) -> Result<()> {
        let index = self
            .position(&task.id)
            .ok_or_else(|| InspectorError::UnknownTask(task.id.clone()))?;
        self.tasks[index] = task;
        Ok(())
    }

    /// Append the task, or update it in place if already recorded
    pub fn persist(&mut self, task: Task) {
        match self.position(&task.id) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.push(task),
        }
    }

    pub fn latest(&self) -> Option<&Task> {
        self.tasks.last()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// JSON handed to the planner: the end goal and the latest task
    pub fn serialized_summary(&self) -> String {
        let summary = json!({
            "endGoal": self.end_goal,
            "latestTask": self.latest(),
        });
        serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string())
    }

    /// Human-readable progress of the whole run
    pub fn report(&self) -> String {
        let mut out = format!("Goal: {}\n", self.end_goal.as_deref().unwrap_or("(not set)"));
        for (i, task) in self.tasks.iter().enumerate() {
            out.push_str(&format!("{}. [{}] {}", i + 1, task.status, task.goal));
            if let Some(reason) = &task.reason {
                out.push_str(&format!(" ({})", reason));
            }
            out.push('\n');
            for action in &task.actions {
                out.push_str(&format!("   - {} [{}]\n", action.action, action.status));
            }
        }
        out
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}
