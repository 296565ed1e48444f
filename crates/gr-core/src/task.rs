//! Task identifier extraction from commit messages.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ConfigError;
use crate::types::TaskId;

/// Default task pattern: two to four letters, a dash, one to five digits.
pub const DEFAULT_TASK_PATTERN: &str = r"[A-Za-z]{2,4}-\d{1,5}";

static DEFAULT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TASK_PATTERN).unwrap());

/// A compiled, validated task pattern.
#[derive(Clone)]
pub struct TaskPattern {
    regex: Regex,
}

impl TaskPattern {
    /// Compiles `pattern`, reporting syntax errors as [`ConfigError::InvalidTaskPattern`].
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidTaskPattern {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self { regex })
    }

    /// Returns the source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for TaskPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

impl fmt::Debug for TaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TaskPattern").field(&self.as_str()).finish()
    }
}

/// Returns the first task referenced by `message`, uppercased.
///
/// The pattern is searched anywhere in the message. Empty matches count as no
/// match.
pub fn extract_task(message: &str, pattern: &TaskPattern) -> Option<TaskId> {
    pattern
        .regex
        .find_iter(message)
        .find(|m| !m.as_str().trim().is_empty())
        .and_then(|m| TaskId::new(m.as_str()).ok())
}
