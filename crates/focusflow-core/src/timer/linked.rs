use serde::{Deserialize, Serialize};

use crate::model::TaskId;

/// The task focus time is attributed to.
///
/// Independent of timer state: it changes only through explicit
/// link/unlink calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTask {
    #[serde(default)]
    task: Option<(TaskId, String)>,
}

impl LinkedTask {
    pub fn link(&mut self, id: TaskId, title: impl Into<String>) {
        self.task = Some((id, title.into()));
    }

    pub fn unlink(&mut self) {
        self.task = None;
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task.as_ref().map(|(id, _)| *id)
    }

    pub fn label(&self) -> String {
        match &self.task {
            None => "(no task linked)".to_string(),
            Some((id, title)) if title.trim().is_empty() => format!("Task #{id}"),
            Some((_, title)) => title.clone(),
        }
    }
}
