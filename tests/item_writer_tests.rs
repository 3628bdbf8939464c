//! Integration tests for the ItemWriter recipes
//!
//! Covers the Spring Batch 5 `ItemWriter.write(Chunk)` migration end to end:
//! - Implementations of `write(List)` (declaration rewrite and parameter
//!   adaptation)
//! - Calls passing a `List` or `null`
//! - Inputs that must be left alone

mod common;

use common::{assert_rewrite, assert_unchanged, rewrite_run};

const WRITE: &str = "spring.batch.MigrateItemWriterWrite";
const INVOCATION: &str = "spring.batch.MigrateItemWriterWriteInvocation";

#[test]
fn test_invocation_with_new_array_list() {
    assert_rewrite(
        INVOCATION,
        r#"import java.util.ArrayList;
import org.springframework.batch.item.ItemWriter;
import org.springframework.batch.item.support.ListItemWriter;

class MyTest {

    public static void main(String[] args) {
        ListItemWriter<String> itemWriter = new ListItemWriter<>();
        itemWriter.write(new ArrayList<>());
    }

}
"#,
        r#"import java.util.ArrayList;
import org.springframework.batch.item.Chunk;
import org.springframework.batch.item.ItemWriter;
import org.springframework.batch.item.support.ListItemWriter;

class MyTest {

    public static void main(String[] args) {
        ListItemWriter<String> itemWriter = new ListItemWriter<>();
        itemWriter.write(new Chunk<>(new ArrayList<>()));
    }

}
"#,
    );
}

#[test]
fn test_invocation_with_null() {
    assert_rewrite(
        INVOCATION,
        r#"import org.springframework.batch.item.ItemWriter;
import org.springframework.batch.item.support.ListItemWriter;

class MyTest {

    public static void main(String[] args) {
        ListItemWriter<String> itemWriter = new ListItemWriter<>();
        itemWriter.write(null);
    }

}
"#,
        r#"import org.springframework.batch.item.Chunk;
import org.springframework.batch.item.ItemWriter;
import org.springframework.batch.item.support.ListItemWriter;

class MyTest {

    public static void main(String[] args) {
        ListItemWriter<String> itemWriter = new ListItemWriter<>();
        itemWriter.write(new Chunk<>(null));
    }

}
"#,
    );
}

#[test]
fn test_write_recipe_wraps_null_with_formal_type() {
    let source = r#"import org.springframework.batch.item.ItemWriter;

class MyTest {
    void run(ItemWriter<String> writer) throws Exception {
        writer.write(null);
    }
}
"#;
    let out = assert_ok!(rewrite_run(WRITE, source));
    assert!(out.contains("writer.write(new Chunk<>(null));"), "{}", out);
    assert!(out.contains("import org.springframework.batch.item.Chunk;"), "{}", out);
}

#[test]
fn test_implementation_migrated() {
    assert_rewrite(
        WRITE,
        r#"package com.example;

import java.util.ArrayList;
import java.util.Collection;
import java.util.List;
import org.springframework.batch.item.ItemWriter;

public class ConsoleItemWriter implements ItemWriter<String> {

    private final List<String> written = new ArrayList<>();

    @Deprecated
    public void write(final List<? extends String> items) {
        for (String item : items) {
            System.out.println(item);
        }
        written.addAll(items);
        int count = items.size();
        Collection<? extends String> all = items;
        log(items);
    }

    private void log(Collection<? extends String> items) {
    }
}
"#,
        r#"package com.example;

import java.util.ArrayList;
import java.util.Collection;
import java.util.List;
import org.springframework.batch.item.Chunk;
import org.springframework.batch.item.ItemWriter;

public class ConsoleItemWriter implements ItemWriter<String> {

    private final List<String> written = new ArrayList<>();

    @Deprecated
    @Override
    public void write(final Chunk<? extends String> items) throws Exception {
        for (String item : items) {
            System.out.println(item);
        }
        written.addAll(items.getItems());
        int count = items.getItems().size();
        Collection<? extends String> all = items.getItems();
        log(items.getItems());
    }

    private void log(Collection<? extends String> items) {
    }
}
"#,
    );
}

#[test]
fn test_delegating_writer() {
    let source = r#"import java.util.List;
import org.springframework.batch.item.ItemWriter;

class Delegating implements ItemWriter<String> {
    private ItemWriter<String> delegate;

    @Override
    public void write(List<? extends String> items) throws Exception {
        delegate.write(items);
    }
}
"#;
    let out = assert_ok!(rewrite_run(WRITE, source));
    assert!(
        out.contains("    @Override\n    public void write(Chunk<? extends String> items) throws Exception {\n        delegate.write(new Chunk<>(items.getItems()));\n    }"),
        "{}",
        out
    );
    assert!(!out.contains("import java.util.List;"), "{}", out);
    assert_eq!(out.matches("@Override").count(), 1);
}

#[test]
fn test_abstract_declaration_without_body() {
    let source = r#"import java.util.List;
import org.springframework.batch.item.ItemWriter;

abstract class Base implements ItemWriter<String> {
    public abstract void write(List<? extends String> items);
}
"#;
    let out = assert_ok!(rewrite_run(WRITE, source));
    assert!(
        out.contains("    @Override\n    public abstract void write(Chunk<? extends String> items) throws Exception;"),
        "{}",
        out
    );
}

#[test]
fn test_unrelated_write_methods_untouched() {
    assert_unchanged(
        WRITE,
        r#"import java.util.List;

class Report {
    public void write(List<String> lines) {
        lines.size();
    }
}
"#,
    );
    assert_unchanged(
        INVOCATION,
        r#"import java.util.List;

class Report {
    void write(List<String> lines) {}
    void run(List<String> lines) {
        write(lines);
    }
}
"#,
    );
}

#[test]
fn test_lambda_writer_untouched() {
    assert_unchanged(
        WRITE,
        r#"import org.springframework.batch.item.ItemWriter;

class Config {
    ItemWriter<String> writer() {
        return items -> items.forEach(System.out::println);
    }
}
"#,
    );
}

#[test]
fn test_object_uses_keep_the_list() {
    let source = r#"import java.util.List;
import java.util.Objects;
import org.springframework.batch.item.ItemWriter;

class Auditing implements ItemWriter<String> {
    private Object last;

    @Override
    public void write(List<? extends String> items) throws Exception {
        System.out.println(items);
        Object o = items;
        boolean same = Objects.equals(items, last);
        last = items;
        for (String item : items) {
        }
    }
}
"#;
    let out = assert_ok!(rewrite_run(WRITE, source));
    assert!(out.contains("public void write(Chunk<? extends String> items) throws Exception {"), "{}", out);
    assert!(out.contains("System.out.println(items.getItems());"), "{}", out);
    assert!(out.contains("Object o = items.getItems();"), "{}", out);
    assert!(out.contains("boolean same = Objects.equals(items.getItems(), last);"), "{}", out);
    assert!(out.contains("last = items.getItems();"), "{}", out);
    // Chunk is Iterable, so the loop needs no change
    assert!(out.contains("for (String item : items) {"), "{}", out);
}
