//! Signature patterns for methods and constructors
//!
//! A pattern reads `<declaring type> <method name>(<parameter types>)`, e.g.
//! `org.springframework.batch.item.ItemWriter write(java.util.List)`.
//!
//! - In type names `*` matches any part of one name segment and `..` any
//!   number of package segments (`org..ItemWriter`).
//! - In the method name `*` matches any name; `<constructor>` matches
//!   constructors.
//! - In the parameter list `..` matches any number of parameters, `*` exactly
//!   one parameter of any type. Other entries are erased type names, with
//!   `T...` standing for the array type `T[]`.
//!
//! Matching is done against resolved [`MethodType`]s only. A method whose
//! signature contains an unresolved type never matches.

use crate::classpath::TypeEnv;
use crate::error::RecipeError;
use crate::tree::{JavaType, MethodDecl, MethodInvocation, MethodType, NewClass};
use regex::Regex;

#[derive(Debug, Clone)]
enum ParamPattern {
    /// `..`
    Rest,
    /// `*`
    Any,
    Type(Regex),
}

impl ParamPattern {
    fn matches(&self, erased: &str) -> bool {
        match self {
            ParamPattern::Rest | ParamPattern::Any => true,
            ParamPattern::Type(regex) => regex.is_match(erased),
        }
    }
}

/// A compiled method signature pattern
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    pattern: String,
    declaring_type: Regex,
    name: Regex,
    params: Vec<ParamPattern>,
    /// Also match methods that override a method of a matching supertype
    match_overrides: bool,
}

impl MethodMatcher {
    /// Compiles `pattern`
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::InvalidMethodPattern` if the pattern is not of the
    /// form `<type> <name>(<params>)`.
    pub fn new(pattern: &str, match_overrides: bool) -> Result<Self, RecipeError> {
        let invalid = |message: &str| RecipeError::InvalidMethodPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };

        let trimmed = pattern.trim();
        let open = trimmed.find('(').ok_or_else(|| invalid("missing parameter list"))?;
        let params = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| invalid("parameter list must end with ')'"))?;
        let (declaring_type, name) = trimmed[..open]
            .trim()
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| invalid("expected '<type> <name>' before the parameter list"))?;
        let declaring_type = declaring_type.trim();
        if declaring_type.is_empty() || name.is_empty() {
            return Err(invalid("expected '<type> <name>' before the parameter list"));
        }
        if params.contains('<') {
            return Err(invalid("parameter types must be erased, without type arguments"));
        }

        let name = if name == "<constructor>" {
            "^<init>$".to_string()
        } else {
            name_regex(name)
        };
        let compile = |source: &str| Regex::new(source).map_err(|e| invalid(&e.to_string()));

        let mut param_patterns = Vec::new();
        if !params.trim().is_empty() {
            for param in params.split(',').map(str::trim) {
                let param_pattern = match param {
                    "" => return Err(invalid("empty parameter type")),
                    ".." => ParamPattern::Rest,
                    "*" => ParamPattern::Any,
                    other => {
                        let erased = match other.strip_suffix("...") {
                            Some(component) => format!("{}[]", component),
                            None => other.to_string(),
                        };
                        ParamPattern::Type(compile(&name_regex(&erased))?)
                    }
                };
                param_patterns.push(param_pattern);
            }
        }

        Ok(MethodMatcher {
            pattern: trimmed.to_string(),
            declaring_type: compile(&name_regex(declaring_type))?,
            name: compile(&name)?,
            params: param_patterns,
            match_overrides,
        })
    }

    /// The pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn match_overrides(&self) -> bool {
        self.match_overrides
    }

    /// True if the resolved method `method` matches this pattern. `None`
    /// never matches.
    pub fn matches(&self, method: Option<&MethodType>, env: &TypeEnv) -> bool {
        let Some(method) = method else {
            return false;
        };
        if !self.name.is_match(&method.name) {
            return false;
        }
        let Some(erased) = method
            .parameter_types
            .iter()
            .map(JavaType::erased_name)
            .collect::<Option<Vec<_>>>()
        else {
            return false;
        };
        if !match_params(&self.params, &erased) {
            return false;
        }
        self.matches_declaring_type(method, env)
    }

    pub fn matches_invocation(&self, call: &MethodInvocation, env: &TypeEnv) -> bool {
        self.matches(call.method_type.as_ref(), env)
    }

    pub fn matches_declaration(&self, method: &MethodDecl, env: &TypeEnv) -> bool {
        self.matches(method.method_type.as_ref(), env)
    }

    pub fn matches_constructor(&self, new_class: &NewClass, env: &TypeEnv) -> bool {
        self.matches(new_class.constructor_type.as_ref(), env)
    }

    fn matches_declaring_type(&self, method: &MethodType, env: &TypeEnv) -> bool {
        if self.declaring_type.is_match(&method.declaring_type) {
            return true;
        }
        if !self.match_overrides {
            return false;
        }
        let arity = method.parameter_types.len();
        env.ancestors(&JavaType::class(method.declaring_type.as_str()))
            .iter()
            .filter_map(JavaType::fqn)
            .any(|fqn| {
                self.declaring_type.is_match(fqn)
                    && env
                        .class(fqn)
                        .is_some_and(|info| info.declares_method(&method.name, arity))
            })
    }
}

/// Translates a type or method name pattern into an anchored regex
fn name_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' if chars.peek() == Some(&'.') => {
                chars.next();
                out.push_str(r"[.$](?:[^.$]+[.$])*");
            }
            '.' | '$' => out.push_str(r"[.$]"),
            '*' => out.push_str(r"[^.$]*"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

fn match_params(patterns: &[ParamPattern], erased: &[String]) -> bool {
    match patterns.split_first() {
        None => erased.is_empty(),
        Some((ParamPattern::Rest, rest)) => {
            (0..=erased.len()).any(|skip| match_params(rest, &erased[skip..]))
        }
        Some((pattern, rest)) => erased
            .split_first()
            .is_some_and(|(first, tail)| pattern.matches(first) && match_params(rest, tail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::TypeTable;
    use crate::parse::parse_unit;
    use crate::tree::{Member, Primitive};
    use std::sync::Arc;

    fn env() -> TypeEnv {
        TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()))
    }

    fn method(declaring_type: &str, name: &str, params: Vec<JavaType>) -> MethodType {
        MethodType {
            declaring_type: declaring_type.to_string(),
            name: name.to_string(),
            parameter_types: params,
            return_type: JavaType::Primitive(Primitive::Void),
            varargs: false,
        }
    }

    fn list_of(arg: &str) -> JavaType {
        JavaType::Parameterized {
            fqn: "java.util.List".to_string(),
            args: vec![JavaType::class(arg)],
        }
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        for pattern in [
            "write(java.util.List)",
            "a.B write",
            "a.B write(java.util.List",
            "a.B write(java.util.List<String>)",
            "a.B write(int,,int)",
        ] {
            assert!(MethodMatcher::new(pattern, false).is_err(), "{}", pattern);
        }
    }

    #[test]
    fn test_exact_match_on_erased_parameters() {
        let env = env();
        let matcher = MethodMatcher::new("org.springframework.batch.item.ItemWriter write(java.util.List)", false).unwrap();
        let write = method(
            "org.springframework.batch.item.ItemWriter",
            "write",
            vec![list_of("java.lang.String")],
        );
        assert!(matcher.matches(Some(&write), &env));

        let chunk = method(
            "org.springframework.batch.item.ItemWriter",
            "write",
            vec![JavaType::class("org.springframework.batch.item.Chunk")],
        );
        assert!(!matcher.matches(Some(&chunk), &env));
        assert!(!matcher.matches(None, &env));
    }

    #[test]
    fn test_unresolved_parameter_never_matches() {
        let env = env();
        let matcher = MethodMatcher::new("org.springframework.batch.item.ItemWriter write(..)", false).unwrap();
        let write = method(
            "org.springframework.batch.item.ItemWriter",
            "write",
            vec![JavaType::Unknown],
        );
        assert!(!matcher.matches(Some(&write), &env));
    }

    #[test]
    fn test_wildcards() {
        let env = env();
        let any_list_method = MethodMatcher::new("java.util.List *(..)", false).unwrap();
        assert!(any_list_method.matches(Some(&method("java.util.List", "size", vec![])), &env));
        assert!(any_list_method.matches(
            Some(&method("java.util.List", "get", vec![JavaType::Primitive(Primitive::Int)])),
            &env
        ));

        let one_param = MethodMatcher::new("java.util.* add(*)", false).unwrap();
        assert!(one_param.matches(
            Some(&method("java.util.List", "add", vec![JavaType::TypeVar("E".to_string())])),
            &env
        ));
        assert!(!one_param.matches(
            Some(&method(
                "java.util.List",
                "add",
                vec![JavaType::Primitive(Primitive::Int), JavaType::TypeVar("E".to_string())]
            )),
            &env
        ));

        let trailing = MethodMatcher::new("org..ItemWriter write(.., java.util.List)", false).unwrap();
        assert!(trailing.matches(
            Some(&method("org.springframework.batch.item.ItemWriter", "write", vec![list_of("A")])),
            &env
        ));
    }

    #[test]
    fn test_overrides_match_through_supertypes() {
        let env = env();
        let pattern = "org.springframework.batch.item.ItemWriter write(java.util.List)";
        let write = method(
            "org.springframework.batch.item.support.ListItemWriter",
            "write",
            vec![list_of("java.lang.String")],
        );
        assert!(!MethodMatcher::new(pattern, false).unwrap().matches(Some(&write), &env));
        assert!(MethodMatcher::new(pattern, true).unwrap().matches(Some(&write), &env));

        let unrelated = method("org.springframework.batch.item.support.ListItemWriter", "getWrittenItems", vec![]);
        let getter = MethodMatcher::new("org.springframework.batch.item.ItemWriter *(..)", true).unwrap();
        assert!(!getter.matches(Some(&unrelated), &env));
    }

    #[test]
    fn test_overrides_in_unit_classes() {
        let mut env = env();
        let unit = parse_unit(
            "import java.util.List;\nimport org.springframework.batch.item.ItemWriter;\nclass W implements ItemWriter<String> {\n  public void write(List<? extends String> items) {}\n  public void flush(List<String> items) {}\n}\n",
            &mut env,
        )
        .unwrap();
        let Member::Class(class) = &unit.types[0] else { panic!() };
        let methods: Vec<_> = class
            .body
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Method(method) => Some(method),
                _ => None,
            })
            .collect();

        let matcher = MethodMatcher::new("org.springframework.batch.item.ItemWriter write(java.util.List)", true).unwrap();
        assert!(matcher.matches_declaration(methods[0], &env));
        assert!(!matcher.matches_declaration(methods[1], &env));
    }

    #[test]
    fn test_constructor_and_varargs_patterns() {
        let env = env();
        let matcher = MethodMatcher::new("java.util.ArrayList <constructor>(..)", false).unwrap();
        assert!(matcher.matches(Some(&method("java.util.ArrayList", "<init>", vec![])), &env));

        let of = MethodMatcher::new("java.util.List of(java.lang.Object...)", false).unwrap();
        let mut list_of = method(
            "java.util.List",
            "of",
            vec![JavaType::Array(Box::new(JavaType::TypeVar("E".to_string())))],
        );
        list_of.varargs = true;
        assert!(of.matches(Some(&list_of), &env));
    }
}
