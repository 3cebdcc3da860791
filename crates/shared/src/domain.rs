use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskFieldError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(TaskFieldError::UnknownPriority(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFieldError {
    #[error("task name must not be empty")]
    EmptyName,
    #[error("unknown priority '{0}', expected high, medium or low")]
    UnknownPriority(String),
}

/// Trims a task name, rejecting names that are empty once trimmed.
pub fn normalize_task_name(raw: &str) -> Result<String, TaskFieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskFieldError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" medium ".parse::<Priority>(), Ok(Priority::Medium));
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(TaskFieldError::UnknownPriority(_))
        ));
    }

    #[test]
    fn priority_defaults_to_low() {
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn normalize_task_name_trims_and_rejects_blank() {
        assert_eq!(normalize_task_name("  Buy milk \n").as_deref(), Ok("Buy milk"));
        assert_eq!(normalize_task_name("   "), Err(TaskFieldError::EmptyName));
        assert_eq!(normalize_task_name(""), Err(TaskFieldError::EmptyName));
    }
}
