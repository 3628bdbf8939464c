#![forbid(unsafe_code)]

//! Human-readable run report
//!
//! ```text
//! changed  src/main/java/app/Writer.java (spring.batch.MigrateItemWriterWrite)
//! failed   src/main/java/app/Broken.java: Syntax error at 3:1
//!
//! 1 of 12 files changed, 1 failed
//! ```

use crate::config::ColorOption;
use crate::engine::{ExecutionResult, FileOutcome, FileResult};
use std::io::{self, IsTerminal};
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Human-readable formatter for execution results
pub struct HumanFormatter {
    color: ColorOption,
}

impl HumanFormatter {
    pub fn new(color: ColorOption) -> Self {
        HumanFormatter { color }
    }

    /// Writes the report to `out`, coloring the status column if `out`
    /// supports it
    pub fn write_to(&self, out: &mut dyn WriteColor, result: &ExecutionResult) -> io::Result<()> {
        let mut files: Vec<&FileResult> = result
            .files
            .iter()
            .filter(|f| !matches!(f.outcome, FileOutcome::Unchanged))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        for file in &files {
            match &file.outcome {
                FileOutcome::Changed { recipes } => {
                    write_status(out, "changed", Color::Green)?;
                    let names: Vec<&str> = recipes.iter().map(|r| r.as_str()).collect();
                    writeln!(out, "{} ({})", file.path.display(), names.join(", "))?;
                }
                FileOutcome::Failed { message } => {
                    write_status(out, "failed", Color::Red)?;
                    writeln!(out, "{}: {}", file.path.display(), message)?;
                }
                FileOutcome::Unchanged => {}
            }
        }

        if !files.is_empty() {
            writeln!(out)?;
        }
        let changed = result.changed().count();
        let failed = result.failed().count();
        write!(out, "{} of {} files changed", changed, result.files_checked())?;
        if failed > 0 {
            write!(out, ", {} failed", failed)?;
        }
        writeln!(out)
    }

    /// Format the report as plain text
    pub fn format(&self, result: &ExecutionResult) -> String {
        let mut buffer = Buffer::no_color();
        if self.write_to(&mut buffer, result).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    /// Write the report to stdout, honoring the color setting
    pub fn write_to_stdout(&self, result: &ExecutionResult) -> io::Result<()> {
        let choice = match self.color {
            ColorOption::Always => ColorChoice::Always,
            ColorOption::Never => ColorChoice::Never,
            ColorOption::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            ColorOption::Auto => ColorChoice::Never,
        };
        let mut stdout = StandardStream::stdout(choice);
        self.write_to(&mut stdout, result)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new(ColorOption::Auto)
    }
}

fn write_status(out: &mut dyn WriteColor, status: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{:<8}", status)?;
    out.reset()?;
    write!(out, " ")
}
