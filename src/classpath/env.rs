//! Type queries over the classpath plus the classes of the unit being parsed

use super::{ClassInfo, FieldInfo, MethodInfo, TypeKind, TypeTable};
use crate::tree::java_type::OBJECT;
use crate::tree::{BoundKind, JavaType, MethodType, Primitive};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// The classpath shared by all units, overlaid with the classes declared in
/// the current unit (including anonymous classes)
#[derive(Debug, Clone)]
pub struct TypeEnv {
    classpath: Arc<TypeTable>,
    local: HashMap<String, ClassInfo>,
}

impl TypeEnv {
    pub fn new(classpath: Arc<TypeTable>) -> Self {
        TypeEnv {
            classpath,
            local: HashMap::new(),
        }
    }

    pub fn classpath(&self) -> &Arc<TypeTable> {
        &self.classpath
    }

    /// Registers a class declared by the unit being parsed
    pub fn declare(&mut self, info: ClassInfo) {
        self.local.insert(info.fqn.clone(), info);
    }

    pub fn undeclare(&mut self, fqn: &str) {
        self.local.remove(fqn);
    }

    /// Forgets every class registered with [`TypeEnv::declare`]
    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    pub fn class(&self, fqn: &str) -> Option<&ClassInfo> {
        self.local.get(fqn).or_else(|| self.classpath.get(fqn))
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.local.contains_key(fqn) || self.classpath.contains(fqn)
    }

    /// Binds a class's type parameters to the arguments of `ty`. Raw uses
    /// leave the parameters unbound.
    fn bindings(&self, info: &ClassInfo, ty: &JavaType) -> HashMap<String, JavaType> {
        let args = ty.type_args();
        if args.len() != info.type_params.len() {
            return HashMap::new();
        }
        info.type_params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect()
    }

    /// `ty` followed by all of its supertypes, breadth first, with type
    /// arguments substituted. `java.lang.Object` is always last.
    pub fn ancestors(&self, ty: &JavaType) -> Vec<JavaType> {
        let start = match ty {
            JavaType::Class(_) | JavaType::Parameterized { .. } => ty.clone(),
            JavaType::Wildcard(Some((BoundKind::Extends, bound))) => return self.ancestors(bound),
            _ => return vec![JavaType::class(OBJECT)],
        };

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let Some(fqn) = current.fqn().map(str::to_string) else {
                continue;
            };
            if fqn == OBJECT || !seen.insert(fqn.clone()) {
                continue;
            }
            if let Some(info) = self.class(&fqn) {
                let bindings = self.bindings(info, &current);
                queue.extend(info.supertypes().map(|sup| sup.substitute(&bindings)));
            }
            out.push(current);
        }
        out.push(JavaType::class(OBJECT));
        out
    }

    /// Views `ty` as its supertype `fqn`, with substituted type arguments
    pub fn as_super(&self, ty: &JavaType, fqn: &str) -> Option<JavaType> {
        self.ancestors(ty)
            .into_iter()
            .find(|ancestor| ancestor.is_of_class_type(fqn))
    }

    /// True if class `sub` is `sup` or inherits from it
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sup == OBJECT || self.as_super(&JavaType::class(sub), sup).is_some()
    }

    /// Whether a value of type `from` may be assigned to a variable of type `to`
    ///
    /// Unresolved components (type variables, `Unknown`) are treated as
    /// compatible, which errs towards leaving code unchanged.
    pub fn is_assignable(&self, to: &JavaType, from: &JavaType) -> bool {
        match (to, from) {
            (JavaType::Unknown, _) | (_, JavaType::Unknown) => true,
            (JavaType::TypeVar(_), _) | (_, JavaType::TypeVar(_)) => true,
            (JavaType::Wildcard(None), _) => true,
            (JavaType::Wildcard(Some((BoundKind::Extends, bound))), _) => self.is_assignable(bound, from),
            (JavaType::Wildcard(Some((BoundKind::Super, _))), _) => true,
            (_, JavaType::Wildcard(Some((BoundKind::Extends, bound)))) => self.is_assignable(to, bound),
            (_, JavaType::Wildcard(_)) => self.is_assignable(to, &JavaType::class(OBJECT)),
            (JavaType::Primitive(_), JavaType::Null) => false,
            (_, JavaType::Null) => true,
            (JavaType::Primitive(to), JavaType::Primitive(from)) => widens(*from, *to),
            (JavaType::Primitive(to), _) => {
                to.boxed().is_some_and(|boxed| from.is_of_class_type(boxed))
            }
            (_, JavaType::Primitive(from)) => match from.boxed() {
                Some(boxed) => self.is_assignable(to, &JavaType::class(boxed)),
                None => false,
            },
            (JavaType::Array(to), JavaType::Array(from)) => {
                if to.is_primitive() || from.is_primitive() {
                    to == from
                } else {
                    self.is_assignable(to, from)
                }
            }
            (_, JavaType::Array(_)) => {
                to.is_of_class_type(OBJECT)
                    || to.is_of_class_type("java.lang.Cloneable")
                    || to.is_of_class_type("java.io.Serializable")
            }
            (JavaType::Array(_), _) | (JavaType::Null, _) => false,
            (_, _) => {
                let Some(target) = to.fqn() else {
                    return false;
                };
                let Some(view) = self.as_super(from, target) else {
                    return false;
                };
                let (wanted, actual) = (to.type_args(), view.type_args());
                if wanted.is_empty() || actual.is_empty() || wanted.len() != actual.len() {
                    return true;
                }
                wanted
                    .iter()
                    .zip(actual)
                    .all(|(w, a)| self.contains_type_arg(w, a))
            }
        }
    }

    /// Type argument containment, e.g. `? extends Number` contains `Integer`
    fn contains_type_arg(&self, wanted: &JavaType, actual: &JavaType) -> bool {
        match wanted {
            JavaType::Wildcard(None) | JavaType::TypeVar(_) | JavaType::Unknown => true,
            JavaType::Wildcard(Some((BoundKind::Extends, bound))) => {
                self.is_assignable(bound, actual.upper_bound())
            }
            JavaType::Wildcard(Some((BoundKind::Super, bound))) => match actual {
                JavaType::Wildcard(Some((BoundKind::Super, actual_bound))) => {
                    self.is_assignable(actual_bound, bound)
                }
                JavaType::Wildcard(_) => false,
                _ => self.is_assignable(actual, bound),
            },
            _ => match actual {
                JavaType::TypeVar(_) | JavaType::Unknown => true,
                JavaType::Wildcard(_) => false,
                _ => erased_eq(wanted, actual) && self.args_equal(wanted, actual),
            },
        }
    }

    fn args_equal(&self, a: &JavaType, b: &JavaType) -> bool {
        let (xs, ys) = (a.type_args(), b.type_args());
        xs.is_empty()
            || ys.is_empty()
            || (xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.contains_type_arg(x, y)))
    }

    /// Looks up a field on `owner` or its supertypes
    pub fn find_field(&self, owner: &JavaType, name: &str) -> Option<(FieldInfo, String)> {
        if let JavaType::Array(_) = owner
            && name == "length"
        {
            let length = FieldInfo {
                name: "length".to_string(),
                ty: JavaType::Primitive(Primitive::Int),
                is_static: false,
            };
            return Some((length, OBJECT.to_string()));
        }
        for ancestor in self.ancestors(owner) {
            let Some(fqn) = ancestor.fqn() else { continue };
            let Some(info) = self.class(fqn) else { continue };
            if let Some(field) = info.fields.iter().find(|f| f.name == name) {
                let bindings = self.bindings(info, &ancestor);
                let resolved = FieldInfo {
                    ty: field.ty.substitute(&bindings),
                    ..field.clone()
                };
                return Some((resolved, info.fqn.clone()));
            }
        }
        None
    }

    /// True if `owner` or a supertype declares any method called `name`
    pub fn has_method(&self, owner: &JavaType, name: &str) -> bool {
        self.ancestors(owner).iter().any(|ancestor| {
            ancestor
                .fqn()
                .and_then(|fqn| self.class(fqn))
                .is_some_and(|info| info.methods.iter().any(|m| m.name == name))
        })
    }

    /// Resolves a call of `name` on a receiver of type `receiver`
    ///
    /// `args` holds the static type of each argument, `None` for arguments
    /// without a standalone type (lambdas, method references, unresolved
    /// expressions), which are compatible with any parameter. Applicability is
    /// checked first without and then with variable arity expansion; among
    /// applicable methods the most specific wins, ties going to the first
    /// declared.
    pub fn find_method(
        &self,
        receiver: &JavaType,
        name: &str,
        args: &[Option<JavaType>],
        explicit_type_args: &[JavaType],
    ) -> Option<MethodType> {
        let mut candidates = Vec::new();
        for ancestor in self.ancestors(receiver) {
            let Some(fqn) = ancestor.fqn() else { continue };
            let Some(info) = self.class(fqn) else { continue };
            let bindings = self.bindings(info, &ancestor);
            for method in info.methods.iter().filter(|m| m.name == name) {
                candidates.push((info, method, bindings.clone()));
            }
        }

        for expand_varargs in [false, true] {
            let applicable: Vec<MethodType> = candidates
                .iter()
                .filter_map(|(info, method, bindings)| {
                    self.instantiate(&info.fqn, method, bindings, &[], args, explicit_type_args, expand_varargs)
                })
                .collect();
            if let Some(best) = self.most_specific(applicable) {
                return Some(best);
            }
        }
        None
    }

    /// Resolves a constructor call `new T(args)`
    ///
    /// `class_type` carries the written type arguments. With a diamond
    /// (`diamond == true`) the class's type parameters are inferred from the
    /// arguments. Returns the constructor signature and the created type.
    pub fn find_constructor(
        &self,
        class_type: &JavaType,
        args: &[Option<JavaType>],
        diamond: bool,
    ) -> Option<(MethodType, JavaType)> {
        let fqn = class_type.fqn()?;
        let info = self.class(fqn)?;
        let (bindings, inferred) = if diamond {
            (HashMap::new(), info.type_params.clone())
        } else {
            (self.bindings(info, class_type), Vec::new())
        };

        let default_constructor;
        let constructors: Vec<&MethodInfo> = if info.constructors.is_empty() {
            default_constructor = MethodInfo {
                name: "<init>".to_string(),
                type_params: Vec::new(),
                params: Vec::new(),
                return_type: JavaType::Primitive(Primitive::Void),
                varargs: false,
                is_static: false,
            };
            vec![&default_constructor]
        } else {
            info.constructors.iter().collect()
        };

        for expand_varargs in [false, true] {
            let applicable: Vec<(MethodType, HashMap<String, JavaType>)> = constructors
                .iter()
                .filter_map(|constructor| {
                    let mut solved = HashMap::new();
                    let method = self.instantiate_with(
                        &info.fqn,
                        constructor,
                        &bindings,
                        &inferred,
                        args,
                        &[],
                        expand_varargs,
                        &mut solved,
                    )?;
                    Some((method, solved))
                })
                .collect();
            let Some(index) = self.most_specific_index(applicable.iter().map(|(m, _)| m)) else {
                continue;
            };
            let (method, solved) = applicable.into_iter().nth(index)?;
            let created = if diamond && !info.type_params.is_empty() {
                JavaType::Parameterized {
                    fqn: info.fqn.clone(),
                    args: info
                        .type_params
                        .iter()
                        .map(|p| solved.get(p).cloned().unwrap_or(JavaType::Unknown))
                        .collect(),
                }
            } else {
                class_type.clone()
            };
            return Some((method, created));
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn instantiate(
        &self,
        declaring: &str,
        method: &MethodInfo,
        bindings: &HashMap<String, JavaType>,
        extra_vars: &[String],
        args: &[Option<JavaType>],
        explicit_type_args: &[JavaType],
        expand_varargs: bool,
    ) -> Option<MethodType> {
        let mut solved = HashMap::new();
        self.instantiate_with(
            declaring,
            method,
            bindings,
            extra_vars,
            args,
            explicit_type_args,
            expand_varargs,
            &mut solved,
        )
    }

    /// Checks applicability of `method` to `args` and infers its type
    /// variables. `solved` receives the inferred bindings.
    #[allow(clippy::too_many_arguments)]
    fn instantiate_with(
        &self,
        declaring: &str,
        method: &MethodInfo,
        bindings: &HashMap<String, JavaType>,
        extra_vars: &[String],
        args: &[Option<JavaType>],
        explicit_type_args: &[JavaType],
        expand_varargs: bool,
        solved: &mut HashMap<String, JavaType>,
    ) -> Option<MethodType> {
        let arity = method.params.len();
        let arity_ok = if expand_varargs {
            method.varargs && args.len() + 1 >= arity
        } else {
            args.len() == arity
        };
        if !arity_ok {
            return None;
        }

        let formals: Vec<JavaType> = (0..args.len())
            .map(|i| {
                let index = i.min(arity.saturating_sub(1));
                let formal = method.params[index].substitute(bindings);
                match (expand_varargs && index + 1 == arity, formal) {
                    (true, JavaType::Array(component)) => *component,
                    (_, formal) => formal,
                }
            })
            .collect();

        let mut variables: Vec<String> = method.type_params.clone();
        variables.extend(extra_vars.iter().cloned());
        if !explicit_type_args.is_empty() && explicit_type_args.len() == method.type_params.len() {
            for (name, arg) in method.type_params.iter().zip(explicit_type_args) {
                solved.insert(name.clone(), arg.clone());
            }
        }
        for (formal, arg) in formals.iter().zip(args) {
            if let Some(actual) = arg {
                self.unify(formal, actual, &variables, solved);
            }
        }

        for (formal, arg) in formals.iter().zip(args) {
            let Some(actual) = arg else { continue };
            let formal = formal.substitute(solved);
            if !self.is_assignable(&formal, actual) {
                return None;
            }
        }

        let mut all = bindings.clone();
        all.extend(solved.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(method.method_type(declaring, &all))
    }

    /// Infers bindings for `variables` by matching `formal` against `actual`
    pub fn unify(
        &self,
        formal: &JavaType,
        actual: &JavaType,
        variables: &[String],
        solved: &mut HashMap<String, JavaType>,
    ) {
        match formal {
            JavaType::TypeVar(name) if variables.contains(name) => {
                if solved.contains_key(name) {
                    return;
                }
                let value = match actual {
                    JavaType::Null | JavaType::Unknown => return,
                    JavaType::Primitive(p) => match p.boxed() {
                        Some(boxed) => JavaType::class(boxed),
                        None => return,
                    },
                    JavaType::Wildcard(Some((BoundKind::Extends, bound))) => (**bound).clone(),
                    JavaType::Wildcard(_) => JavaType::class(OBJECT),
                    other => other.clone(),
                };
                solved.insert(name.clone(), value);
            }
            JavaType::Wildcard(Some((_, bound))) => self.unify(bound, actual.upper_bound(), variables, solved),
            JavaType::Array(elem) => {
                if let JavaType::Array(actual_elem) = actual {
                    self.unify(elem, actual_elem, variables, solved);
                }
            }
            JavaType::Parameterized { fqn, args } => {
                let Some(view) = self.as_super(actual.upper_bound(), fqn) else {
                    return;
                };
                for (f, a) in args.iter().zip(view.type_args()) {
                    self.unify(f, a, variables, solved);
                }
            }
            _ => {}
        }
    }

    fn most_specific(&self, applicable: Vec<MethodType>) -> Option<MethodType> {
        let index = self.most_specific_index(applicable.iter())?;
        applicable.into_iter().nth(index)
    }

    fn most_specific_index<'m>(&self, methods: impl Iterator<Item = &'m MethodType>) -> Option<usize> {
        let methods: Vec<&MethodType> = methods.collect();
        let mut best: Option<usize> = None;
        for (i, candidate) in methods.iter().enumerate() {
            match best {
                None => best = Some(i),
                Some(b) => {
                    if self.more_specific(candidate, methods[b]) && !self.more_specific(methods[b], candidate) {
                        best = Some(i);
                    }
                }
            }
        }
        best
    }

    fn more_specific(&self, a: &MethodType, b: &MethodType) -> bool {
        a.parameter_types.len() == b.parameter_types.len()
            && a.parameter_types
                .iter()
                .zip(&b.parameter_types)
                .all(|(x, y)| self.is_assignable(&erase(y), &erase(x)))
    }

    /// True if the declaring class is an interface
    pub fn is_interface(&self, fqn: &str) -> bool {
        self.class(fqn).is_some_and(|info| info.kind == TypeKind::Interface)
    }
}

/// Drops type arguments, keeping the class
fn erase(ty: &JavaType) -> JavaType {
    match ty {
        JavaType::Parameterized { fqn, .. } => JavaType::Class(fqn.clone()),
        JavaType::Array(elem) => JavaType::Array(Box::new(erase(elem))),
        other => other.clone(),
    }
}

fn erased_eq(a: &JavaType, b: &JavaType) -> bool {
    match (a, b) {
        (JavaType::Array(x), JavaType::Array(y)) => erased_eq(x, y),
        _ => a.erased_name().is_some() && a.erased_name() == b.erased_name(),
    }
}

/// Primitive widening conversions
fn widens(from: Primitive, to: Primitive) -> bool {
    use Primitive::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}
