//! SQL tasks generated for one action

use serde::{Deserialize, Serialize};

/// How the execution engine interprets a task's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Plain statement; succeeds when the warehouse accepts it
    #[default]
    Statement,
    /// Row-count check; fails when the count is greater than zero
    Assertion,
}

/// One SQL statement to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub statement: String,
}

impl Task {
    pub fn statement(sql: impl Into<String>) -> Self {
        Self {
            task_type: TaskType::Statement,
            statement: sql.into(),
        }
    }

    pub fn assertion(sql: impl Into<String>) -> Self {
        Self {
            task_type: TaskType::Assertion,
            statement: sql.into(),
        }
    }
}

/// Ordered task list builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tasks {
    tasks: Vec<Task>,
}

impl Tasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: Task) -> &mut Self {
        self.tasks.push(task);
        self
    }

    pub fn add_all(&mut self, tasks: impl IntoIterator<Item = Task>) -> &mut Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn build(self) -> Vec<Task> {
        self.tasks
    }
}

impl IntoIterator for Tasks {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}
