#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. One change record per changed file (sorted by file)
//! 2. One failure record per file that could not be processed (sorted by file)
//! 3. One summary record

use crate::engine::{ExecutionResult, FileOutcome};
use serde::Serialize;
use std::path::PathBuf;

/// JSONL output formatter
pub struct JsonlFormatter;

impl JsonlFormatter {
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format the execution result as JSONL
    pub fn format(&self, result: &ExecutionResult) -> String {
        let mut changes: Vec<ChangeRecord> = Vec::new();
        let mut failures: Vec<FailureRecord> = Vec::new();
        for file in &result.files {
            match &file.outcome {
                FileOutcome::Changed { recipes } => changes.push(ChangeRecord {
                    record_type: "change",
                    file: file.path.clone(),
                    recipes: recipes.iter().map(|r| r.as_str().to_string()).collect(),
                }),
                FileOutcome::Failed { message } => failures.push(FailureRecord {
                    record_type: "failure",
                    file: file.path.clone(),
                    message: message.clone(),
                }),
                FileOutcome::Unchanged => {}
            }
        }
        changes.sort_by(|a, b| a.file.cmp(&b.file));
        failures.sort_by(|a, b| a.file.cmp(&b.file));

        let summary = SummaryRecord {
            record_type: "summary",
            files_checked: result.files_checked() as u64,
            files_changed: changes.len() as u64,
            files_failed: failures.len() as u64,
            recipes_executed: result.recipes_executed as u64,
        };

        let mut output = String::new();
        for change in &changes {
            push_line(&mut output, change);
        }
        for failure in &failures {
            push_line(&mut output, failure);
        }
        push_line(&mut output, &summary);
        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, result: &ExecutionResult) {
        print!("{}", self.format(result));
    }
}

fn push_line(output: &mut String, record: &impl Serialize) {
    if let Ok(json) = serde_json::to_string(record) {
        output.push_str(&json);
        output.push('\n');
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct ChangeRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    file: PathBuf,
    recipes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FailureRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    file: PathBuf,
    message: String,
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    files_checked: u64,
    files_changed: u64,
    files_failed: u64,
    recipes_executed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FileResult;
    use crate::types::RecipeName;
    use serde_json::Value;

    fn result() -> ExecutionResult {
        let recipe = RecipeName::new("spring.batch.MigrateItemWriterWrite").unwrap();
        ExecutionResult {
            files: vec![
                FileResult {
                    path: PathBuf::from("src/b/Writer.java"),
                    outcome: FileOutcome::Changed {
                        recipes: vec![recipe.clone()],
                    },
                },
                FileResult {
                    path: PathBuf::from("src/a/Plain.java"),
                    outcome: FileOutcome::Unchanged,
                },
                FileResult {
                    path: PathBuf::from("src/a/Writer.java"),
                    outcome: FileOutcome::Changed { recipes: vec![recipe] },
                },
                FileResult {
                    path: PathBuf::from("src/Broken.java"),
                    outcome: FileOutcome::Failed {
                        message: "Syntax error at 1:14".to_string(),
                    },
                },
            ],
            recipes_executed: 1,
        }
    }

    fn lines(output: &str) -> Vec<Value> {
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_record_order() {
        let records = lines(&JsonlFormatter::new().format(&result()));
        let kinds: Vec<&str> = records.iter().map(|r| r["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["change", "change", "failure", "summary"]);
        assert_eq!(records[0]["file"], "src/a/Writer.java");
        assert_eq!(records[1]["file"], "src/b/Writer.java");
        assert_eq!(records[0]["recipes"][0], "spring.batch.MigrateItemWriterWrite");
        assert_eq!(records[2]["message"], "Syntax error at 1:14");
    }

    #[test]
    fn test_summary_counts() {
        let records = lines(&JsonlFormatter::new().format(&result()));
        let summary = records.last().unwrap();
        assert_eq!(summary["files_checked"], 4);
        assert_eq!(summary["files_changed"], 2);
        assert_eq!(summary["files_failed"], 1);
        assert_eq!(summary["recipes_executed"], 1);
    }

    #[test]
    fn test_empty_result_has_only_summary() {
        let output = JsonlFormatter::new().format(&ExecutionResult::default());
        assert_eq!(
            output,
            "{\"type\":\"summary\",\"files_checked\":0,\"files_changed\":0,\"files_failed\":0,\"recipes_executed\":0}\n"
        );
    }
}
