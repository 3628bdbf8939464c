#![forbid(unsafe_code)]

//! Deferred import changes
//!
//! Visitors never edit the import list directly. They register
//! [`ImportEffect`]s on the visit context, and [`finalize`] applies them once
//! the traversal of the unit is complete:
//!
//! - an added import is skipped if the unit does not refer to the type's
//!   simple name, if the type is already visible (imported, in `java.lang` or
//!   in the same package), or if another import already claims the name;
//! - a removed import is only dropped if nothing refers to its simple name
//!   any more.
//!
//! New imports are placed next to the imports sharing the longest package
//! prefix with them, in name order within that group.

use crate::tree::{CompilationUnit, Expression, Import, Meta, Modifier, NodeRef, Opaque, Slice, TypeTreeKind};
use std::collections::HashSet;

/// A requested change to the imports of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEffect {
    Add(String),
    Remove(String),
}

/// Applies `effects` to `unit`, adds before removes
pub fn finalize(mut unit: CompilationUnit, effects: &[ImportEffect]) -> CompilationUnit {
    if effects.is_empty() {
        return unit;
    }
    let used = used_names(&unit);
    for effect in effects {
        if let ImportEffect::Add(fqn) = effect {
            add_import(&mut unit, fqn, &used);
        }
    }
    for effect in effects {
        if let ImportEffect::Remove(fqn) = effect {
            remove_import(&mut unit, fqn, &used);
        }
    }
    unit
}

fn simple_name(fqn: &str) -> &str {
    fqn.rsplit(['.', '$']).next().unwrap_or(fqn)
}

fn package_of(fqn: &str) -> &str {
    fqn.rsplit_once('.').map(|(package, _)| package).unwrap_or("")
}

fn add_import(unit: &mut CompilationUnit, fqn: &str, used: &HashSet<String>) {
    let name = simple_name(fqn);
    let package = package_of(fqn);
    if !used.contains(name) || package == "java.lang" || package == unit.package_name() {
        return;
    }
    let visible = unit.imports.iter().filter(|import| !import.is_static).any(|import| {
        if import.wildcard {
            import.name == package
        } else {
            import.name == fqn || import.simple_name() == Some(name)
        }
    });
    if visible {
        return;
    }

    let index = insertion_index(&unit.imports, fqn);
    let meta = insertion_meta(unit, index);
    tracing::debug!(import = %fqn, "adding import");
    unit.imports.insert(
        index,
        Import {
            meta,
            name: fqn.to_string(),
            is_static: false,
            wildcard: false,
        },
    );
}

fn common_segments(a: &str, b: &str) -> usize {
    a.split('.').zip(b.split('.')).take_while(|(x, y)| x == y).count()
}

/// Position for a new import of `fqn` among the non-static imports sharing
/// the longest package prefix with it
fn insertion_index(imports: &[Import], fqn: &str) -> usize {
    let candidates: Vec<(usize, usize)> = imports
        .iter()
        .enumerate()
        .filter(|(_, import)| !import.is_static)
        .map(|(index, import)| (index, common_segments(&import.name, fqn)))
        .collect();
    let Some(longest) = candidates.iter().map(|(_, shared)| *shared).max() else {
        return imports.len();
    };
    if longest == 0 {
        return imports.len();
    }
    let group: Vec<usize> = candidates
        .into_iter()
        .filter(|(_, shared)| *shared == longest)
        .map(|(index, _)| index)
        .collect();
    group
        .iter()
        .copied()
        .find(|&index| imports[index].name.as_str() > fqn)
        .or_else(|| group.last().map(|&index| index + 1))
        .unwrap_or(imports.len())
}

/// Slot for an import inserted at `index`: an empty slot before the import
/// currently there, or after the last import, package or at the top
fn insertion_meta(unit: &CompilationUnit, index: usize) -> Meta {
    let mut meta = Meta::synthetic();
    let Some(text) = unit.meta.text.as_ref() else {
        return meta;
    };
    let before = unit.imports.get(index).and_then(|import| import.meta.slot.as_ref());
    let after = index
        .checked_sub(1)
        .and_then(|previous| unit.imports.get(previous))
        .and_then(|import| import.meta.slot.as_ref());
    let package = unit.package.as_ref().and_then(|package| package.meta.slot.as_ref());
    let first_type = unit.types.first().and_then(|ty| NodeRef::from(ty).meta().slot.as_ref());

    // Line breaks before and after the new import
    let (slot, leading, trailing) = if let Some(next) = before {
        (text.empty_at(next.start()), 0, 1)
    } else if let Some(previous) = after {
        (text.empty_at(previous.end()), 1, 0)
    } else if let Some(package) = package {
        (text.empty_at(package.end()), 2, 0)
    } else if let Some(first) = first_type {
        (text.empty_at(first.start()), 0, 2)
    } else {
        (text.empty_at(text.end()), 1, 1)
    };
    let newline = text.line_ending();
    meta.slot = Some(slot);
    meta.leading = newline.repeat(leading);
    meta.trailing = newline.repeat(trailing);
    meta
}

fn remove_import(unit: &mut CompilationUnit, fqn: &str, used: &HashSet<String>) {
    let name = simple_name(fqn);
    if used.contains(name) {
        return;
    }
    let Some(index) = unit
        .imports
        .iter()
        .position(|import| !import.is_static && !import.wildcard && import.name == fqn)
    else {
        return;
    };
    let import = unit.imports.remove(index);
    tracing::debug!(import = %fqn, "removing unused import");
    if let Some(slot) = &import.meta.slot {
        let source = slot.source();
        let mut end = slot.end();
        if source[end..].starts_with("\r\n") {
            end += 2;
        } else if source[end..].starts_with('\n') {
            end += 1;
        }
        unit.meta.elided.push(slot.start()..end);
    }
}

/// Simple names the unit refers to outside its imports: first segments of
/// type names, annotation names, and unresolved or type identifiers
fn used_names(unit: &CompilationUnit) -> HashSet<String> {
    let mut used = HashSet::new();
    let first_segment = |name: &str| name.split('.').next().unwrap_or(name).to_string();
    for ty in &unit.types {
        for node in NodeRef::from(ty).descendants() {
            match node {
                NodeRef::Type(tree) => {
                    if let TypeTreeKind::Named(name) = &tree.kind {
                        used.insert(first_segment(name));
                    }
                }
                NodeRef::Modifier(Modifier::Annotation(annotation)) => {
                    used.insert(first_segment(&annotation.name));
                }
                NodeRef::Expression(Expression::Identifier(ident)) if ident.variable.is_none() => {
                    used.insert(ident.name.clone());
                }
                NodeRef::Opaque(opaque) if opaque.children.is_empty() => {
                    used.extend(words(opaque));
                }
                _ => {}
            }
        }
    }
    used
}

/// Identifier-like words in the text of a childless opaque node, e.g. the
/// bounds of a type parameter list
fn words(opaque: &Opaque) -> Vec<String> {
    let Some(text) = opaque.meta.text.as_ref().map(Slice::as_str) else {
        return Vec::new();
    };
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .filter(|word| word.chars().next().is_some_and(char::is_alphabetic))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::parse::parse_unit;
    use crate::tree::print;
    use std::sync::Arc;

    fn run(source: &str, effects: &[ImportEffect]) -> String {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        let unit = parse_unit(source, &mut env).unwrap();
        print(&finalize(unit, effects))
    }

    fn add(fqn: &str) -> ImportEffect {
        ImportEffect::Add(fqn.to_string())
    }

    fn remove(fqn: &str) -> ImportEffect {
        ImportEffect::Remove(fqn.to_string())
    }

    #[test]
    fn test_add_next_to_related_imports_in_order() {
        let source = "import java.util.ArrayList;\nimport org.springframework.batch.item.ItemWriter;\nimport org.springframework.batch.item.support.ListItemWriter;\n\nclass A { Chunk<String> c; ItemWriter<String> w; ListItemWriter<String> l; ArrayList<String> a; }\n";
        assert_eq!(
            run(source, &[add("org.springframework.batch.item.Chunk")]),
            "import java.util.ArrayList;\nimport org.springframework.batch.item.Chunk;\nimport org.springframework.batch.item.ItemWriter;\nimport org.springframework.batch.item.support.ListItemWriter;\n\nclass A { Chunk<String> c; ItemWriter<String> w; ListItemWriter<String> l; ArrayList<String> a; }\n"
        );
    }

    #[test]
    fn test_add_after_last_of_group() {
        let source = "import java.util.List;\nimport java.util.Map;\nimport org.example.Other;\n\nclass A { Set<String> s; List<String> l; Map<String, String> m; Other o; }\n";
        assert_eq!(
            run(source, &[add("java.util.Set")]),
            "import java.util.List;\nimport java.util.Map;\nimport java.util.Set;\nimport org.example.Other;\n\nclass A { Set<String> s; List<String> l; Map<String, String> m; Other o; }\n"
        );
    }

    #[test]
    fn test_add_without_imports() {
        assert_eq!(
            run("package p;\n\nclass A { java.util.List<Chunk<String>> c; }\n", &[add("org.springframework.batch.item.Chunk")]),
            "package p;\n\nimport org.springframework.batch.item.Chunk;\n\nclass A { java.util.List<Chunk<String>> c; }\n"
        );
        assert_eq!(
            run("class A { Chunk<String> c; }\n", &[add("org.springframework.batch.item.Chunk")]),
            "import org.springframework.batch.item.Chunk;\n\nclass A { Chunk<String> c; }\n"
        );
    }

    #[test]
    fn test_add_skipped_when_visible_or_unused() {
        let source = "package p;\n\nimport java.util.*;\n\nclass A { List<String> l; Q q; }\n";
        for fqn in ["java.util.List", "java.lang.String", "p.Q", "org.example.Unused"] {
            assert_eq!(run(source, &[add(fqn)]), source, "{}", fqn);
        }
    }

    #[test]
    fn test_add_skipped_on_name_clash() {
        let source = "import com.example.List;\n\nclass A { List l; }\n";
        assert_eq!(run(source, &[add("java.util.List")]), source);
    }

    #[test]
    fn test_remove_only_when_unused() {
        let source = "import java.util.List;\nimport java.util.Set;\n\nclass A { Set<String> s; }\n";
        assert_eq!(
            run(source, &[remove("java.util.List"), remove("java.util.Set")]),
            "import java.util.Set;\n\nclass A { Set<String> s; }\n"
        );
    }

    #[test]
    fn test_crlf_source_keeps_its_line_endings() {
        let source = "package p;\r\n\r\nimport java.util.List;\r\nimport org.springframework.batch.item.ItemWriter;\r\n\r\nclass A { Chunk<String> c; ItemWriter<String> w; }\r\n";
        assert_eq!(
            run(source, &[add("org.springframework.batch.item.Chunk"), remove("java.util.List")]),
            "package p;\r\n\r\nimport org.springframework.batch.item.Chunk;\r\nimport org.springframework.batch.item.ItemWriter;\r\n\r\nclass A { Chunk<String> c; ItemWriter<String> w; }\r\n"
        );
        assert_eq!(
            run("package p;\r\n\r\nclass A { Chunk<String> c; }\r\n", &[add("org.springframework.batch.item.Chunk")]),
            "package p;\r\n\r\nimport org.springframework.batch.item.Chunk;\r\n\r\nclass A { Chunk<String> c; }\r\n"
        );
    }

    #[test]
    fn test_annotation_and_static_receiver_count_as_uses() {
        let source = "import java.util.Collections;\nimport org.example.Marker;\n\n@Marker\nclass A { Object o = Collections.emptyList(); }\n";
        assert_eq!(
            run(source, &[remove("java.util.Collections"), remove("org.example.Marker")]),
            source
        );
    }
}
