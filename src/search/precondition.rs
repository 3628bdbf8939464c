//! Whole-unit checks deciding whether a recipe needs to visit a unit

use super::MethodMatcher;
use crate::classpath::TypeEnv;
use crate::tree::{CompilationUnit, Expression, NodeRef};

/// A cheap existence check over a compilation unit
///
/// Preconditions only skip work: every recipe leaves a unit unchanged when
/// nothing in it matches, whether or not the precondition ran.
#[derive(Debug, Clone)]
pub enum Precondition {
    /// Every unit qualifies
    Always,
    /// The unit declares a method matching the pattern
    DeclaresMethod(MethodMatcher),
    /// The unit calls a method (or constructor) matching the pattern
    UsesMethod(MethodMatcher),
    /// Any of the preconditions holds
    Or(Vec<Precondition>),
}

impl Precondition {
    /// Combines preconditions so that the result holds if any of them does
    pub fn any(preconditions: impl IntoIterator<Item = Precondition>) -> Self {
        Precondition::Or(preconditions.into_iter().collect())
    }

    pub fn check(&self, unit: &CompilationUnit, env: &TypeEnv) -> bool {
        match self {
            Precondition::Always => true,
            Precondition::Or(preconditions) => preconditions.iter().any(|p| p.check(unit, env)),
            Precondition::DeclaresMethod(matcher) => {
                NodeRef::Unit(unit).descendants().into_iter().any(|node| match node {
                    NodeRef::Method(method) => matcher.matches_declaration(method, env),
                    _ => false,
                })
            }
            Precondition::UsesMethod(matcher) => {
                NodeRef::Unit(unit).descendants().into_iter().any(|node| match node {
                    NodeRef::Expression(Expression::MethodInvocation(call)) => {
                        matcher.matches_invocation(call, env)
                    }
                    NodeRef::Expression(Expression::NewClass(new_class)) => {
                        matcher.matches_constructor(new_class, env)
                    }
                    _ => false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::TypeTable;
    use crate::parse::parse_unit;
    use std::sync::Arc;

    const WRITE: &str = "org.springframework.batch.item.ItemWriter write(java.util.List)";

    fn check(precondition: &Precondition, source: &str) -> bool {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        let unit = parse_unit(source, &mut env).unwrap();
        precondition.check(&unit, &env)
    }

    const DECLARES: &str = "import java.util.List;\nimport org.springframework.batch.item.ItemWriter;\nclass W implements ItemWriter<String> {\n  public void write(List<? extends String> items) {}\n}\n";

    const USES: &str = "import java.util.ArrayList;\nimport org.springframework.batch.item.ItemWriter;\nclass U {\n  void run(ItemWriter<String> writer) throws Exception {\n    if (writer != null) {\n      writer.write(new ArrayList<>());\n    }\n  }\n}\n";

    #[test]
    fn test_declares_method() {
        let declares = Precondition::DeclaresMethod(MethodMatcher::new(WRITE, true).unwrap());
        assert!(check(&declares, DECLARES));
        assert!(!check(&declares, USES));
    }

    #[test]
    fn test_uses_method_finds_nested_calls() {
        let uses = Precondition::UsesMethod(MethodMatcher::new(WRITE, true).unwrap());
        assert!(check(&uses, USES));
        assert!(!check(&uses, DECLARES));
    }

    #[test]
    fn test_or_and_always() {
        let either = Precondition::any([
            Precondition::DeclaresMethod(MethodMatcher::new(WRITE, true).unwrap()),
            Precondition::UsesMethod(MethodMatcher::new(WRITE, true).unwrap()),
        ]);
        assert!(check(&either, DECLARES));
        assert!(check(&either, USES));
        assert!(!check(&either, "class Empty {}"));
        assert!(check(&Precondition::Always, "class Empty {}"));
    }
}
