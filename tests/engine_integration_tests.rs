//! Integration tests for configured runs
//!
//! This test suite verifies the complete pipeline:
//! - Loading rewrites.toml
//! - Custom declarative recipes and stub directories
//! - File discovery with FileWalker
//! - Sequential execution with RewriteEngine
//! - JSONL and human reports

mod common;

use common::TestResult;
use rewrites::config::Config;
use rewrites::engine::{FileEntry, FileOutcome};
use rewrites::output::{HumanFormatter, JsonlFormatter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_file(dir: &Path, relative_path: &str, content: &str) -> PathBuf {
    let path = dir.join(relative_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

const WRITER: &str = r#"package app;

import java.util.List;
import org.springframework.batch.item.ItemWriter;

public class ConsoleWriter implements ItemWriter<String> {
    public void write(List<? extends String> items) {
        items.forEach(System.out::println);
    }
}
"#;

const CALLER: &str = r#"package app;

import java.util.ArrayList;
import org.springframework.batch.item.ItemWriter;

class Caller {
    void run(ItemWriter<String> writer) throws Exception {
        writer.write(new ArrayList<>());
    }
}
"#;

const GREETER_STUB: &str = r#"package com.acme;

public interface Greeter {
    String greet(String name);
}
"#;

const GREETER_USE: &str = r#"package app;

import com.acme.Greeter;

class Welcome {
    String welcome(Greeter greeter) {
        return greeter.greet("world");
    }
}
"#;

const RENAME_GREET: &str = r#"
[recipe]
name = "acme.RenameGreet"
display_name = "Rename `Greeter.greet`"
description = "Greeter.greet is now Greeter.hello."

[[steps]]
type = "change-method-name"
method_pattern = "com.acme.Greeter greet(java.lang.String)"
match_overrides = true
new_name = "hello"
"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    create_file(dir.path(), "src/app/ConsoleWriter.java", WRITER);
    create_file(dir.path(), "src/app/Caller.java", CALLER);
    create_file(dir.path(), "src/app/Welcome.java", GREETER_USE);
    create_file(dir.path(), "src/app/Broken.java", "class Broken {");
    create_file(dir.path(), "src/generated/Gen.java", CALLER);
    create_file(dir.path(), "stubs/com/acme/Greeter.java", GREETER_STUB);
    create_file(dir.path(), "recipes/rename-greet.toml", RENAME_GREET);
    create_file(dir.path(), "README.md", "not java");
    dir
}

const CONFIG: &str = r#"
[rewrites]
version = "1"
exclude = ["**/generated/**"]
recipes = [
    "spring.batch.MigrateItemWriterWrite",
    "acme.RenameGreet",
]

[classpath]
paths = ["stubs"]

[recipes]
custom = ["recipes"]
"#;

#[test]
fn test_configured_run_rewrites_project() -> TestResult {
    let dir = project();
    let root = dir.path();
    let config = Config::parse(CONFIG)?;

    let files: Vec<_> = config.walker(root)?.walk().collect::<Result<_, _>>()?;
    let mut names: Vec<String> = files
        .iter()
        .filter_map(|f| f.path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    // Stub sources are walked like any other Java file
    assert_eq!(
        names,
        vec!["Broken.java", "Caller.java", "ConsoleWriter.java", "Greeter.java", "Welcome.java"]
    );
    let files = files
        .into_iter()
        .filter(|f| f.path.starts_with(root.join("src")))
        .collect();

    let engine = config.engine(root)?.with_write(true);
    let result = engine.execute(files);

    assert_eq!(result.files_checked(), 4);
    assert_eq!(result.changed().count(), 3);
    assert_eq!(result.failed().count(), 1);
    let broken = assert_some!(result.files.iter().find(|f| f.path.ends_with("Broken.java")));
    assert!(matches!(broken.outcome, FileOutcome::Failed { .. }));

    let writer = fs::read_to_string(root.join("src/app/ConsoleWriter.java"))?;
    assert!(writer.contains("import org.springframework.batch.item.Chunk;"), "{}", writer);
    assert!(!writer.contains("import java.util.List;"), "{}", writer);
    assert!(
        writer.contains("    @Override\n    public void write(Chunk<? extends String> items) throws Exception {\n        items.forEach(System.out::println);\n    }"),
        "{}",
        writer
    );

    let caller = fs::read_to_string(root.join("src/app/Caller.java"))?;
    assert!(caller.contains("writer.write(new Chunk<>(new ArrayList<>()));"), "{}", caller);

    let welcome = fs::read_to_string(root.join("src/app/Welcome.java"))?;
    assert!(welcome.contains("return greeter.hello(\"world\");"), "{}", welcome);

    // Excluded and failed files are left as they were
    assert_eq!(fs::read_to_string(root.join("src/generated/Gen.java"))?, CALLER);
    assert_eq!(fs::read_to_string(root.join("src/app/Broken.java"))?, "class Broken {");
    Ok(())
}

#[test]
fn test_second_run_changes_nothing() -> TestResult {
    let dir = project();
    let root = dir.path();
    let config = Config::parse(CONFIG)?;

    let walk = |config: &Config| -> TestResult<Vec<FileEntry>> {
        Ok(config
            .walker(root)?
            .walk()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|f| f.path.starts_with(root.join("src")))
            .collect())
    };

    config.engine(root)?.with_write(true).execute(walk(&config)?);
    let second = config.engine(root)?.with_write(true).execute(walk(&config)?);
    assert_eq!(second.changed().count(), 0);
    Ok(())
}

#[test]
fn test_dry_run_reports() -> TestResult {
    let dir = project();
    let root = dir.path();
    let config = Config::parse(CONFIG)?;
    let files = config
        .walker(root)?
        .walk()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|f| f.path.starts_with(root.join("src/app")))
        .collect();

    let result = config.engine(root)?.execute(files);
    assert_eq!(fs::read_to_string(root.join("src/app/Caller.java"))?, CALLER);

    let jsonl = JsonlFormatter::new().format(&result);
    let last = assert_some!(jsonl.lines().last());
    let summary: serde_json::Value = serde_json::from_str(last)?;
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["files_changed"], 3);
    assert_eq!(summary["files_failed"], 1);
    assert_eq!(summary["recipes_executed"], 2);

    let human = HumanFormatter::default().format(&result);
    assert!(human.ends_with("3 of 4 files changed, 1 failed\n"), "{}", human);
    assert!(human.contains("acme.RenameGreet"), "{}", human);
    Ok(())
}

#[test]
fn test_config_file_on_disk() -> TestResult {
    let dir = project();
    let path = create_file(dir.path(), "rewrites.toml", CONFIG);
    let config = Config::load(&path)?;
    assert_eq!(config.rewrites.recipes.len(), 2);
    Ok(())
}
