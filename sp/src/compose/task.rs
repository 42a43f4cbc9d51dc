//! Task types
//!
//! An explicit allow-list. A prompt id's leading segment names its task;
//! anything outside the list degrades to [`TaskType::General`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::template::PromptId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ProjectSetup,
    FeatureImplementation,
    BugFix,
    Refactoring,
    Testing,
    Documentation,
    CodeReview,
    PerformanceOptimization,
    Migration,
    General,
}

impl TaskType {
    /// Every specific task type, `General` excluded
    pub const SPECIFIC: [TaskType; 9] = [
        TaskType::ProjectSetup,
        TaskType::FeatureImplementation,
        TaskType::BugFix,
        TaskType::Refactoring,
        TaskType::Testing,
        TaskType::Documentation,
        TaskType::CodeReview,
        TaskType::PerformanceOptimization,
        TaskType::Migration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::ProjectSetup => "project_setup",
            TaskType::FeatureImplementation => "feature_implementation",
            TaskType::BugFix => "bug_fix",
            TaskType::Refactoring => "refactoring",
            TaskType::Testing => "testing",
            TaskType::Documentation => "documentation",
            TaskType::CodeReview => "code_review",
            TaskType::PerformanceOptimization => "performance_optimization",
            TaskType::Migration => "migration",
            TaskType::General => "general",
        }
    }

    /// Allow-listed name to task type
    pub fn parse(name: &str) -> Option<Self> {
        if name == "general" || name == "default" {
            return Some(TaskType::General);
        }
        Self::SPECIFIC.into_iter().find(|t| t.as_str() == name)
    }

    /// Task a prompt id belongs to; unknown task segments become `General`
    pub fn from_prompt_id(id: &PromptId) -> Self {
        match id.task() {
            None => TaskType::General,
            Some(task) => Self::parse(task).unwrap_or_else(|| {
                warn!(%task, prompt_id = %id, "Unrecognized task type, using general");
                TaskType::General
            }),
        }
    }

    /// Lower-case phrases hinting at this task in a request
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            TaskType::ProjectSetup => &[
                "set up",
                "setup",
                "scaffold",
                "bootstrap",
                "initialize",
                "new project",
                "boilerplate",
            ],
            TaskType::FeatureImplementation => &["implement", "add support", "new feature", "feature", "build a"],
            TaskType::BugFix => &["bug", "fix", "crash", "broken", "error", "fails", "regression"],
            TaskType::Refactoring => &["refactor", "clean up", "restructure", "simplify", "reorganize", "extract"],
            TaskType::Testing => &["test", "coverage", "unit test", "integration test", "assert"],
            TaskType::Documentation => &["document", "docs", "readme", "docstring", "comment"],
            TaskType::CodeReview => &["review", "feedback", "audit", "critique"],
            TaskType::PerformanceOptimization => &[
                "performance",
                "optimize",
                "slow",
                "faster",
                "latency",
                "throughput",
                "memory usage",
            ],
            TaskType::Migration => &["migrate", "migration", "upgrade", "port to", "convert to"],
            TaskType::General => &[],
        }
    }

    /// Number of keyword hints found in already lower-cased text
    pub fn score(&self, lowered: &str) -> usize {
        self.keywords().iter().filter(|k| lowered.contains(*k)).count()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
