#![forbid(unsafe_code)]

//! Primitive recipes over Java method signatures
//!
//! These are the building blocks of declarative recipes. Each takes a method
//! pattern and rewrites the matching declarations (and, for renames, the
//! matching invocations too).

mod change_method_name;
mod change_method_return_type;
mod change_parameter_type;
mod type_name;

pub use change_method_name::ChangeMethodName;
pub use change_method_return_type::ChangeMethodReturnType;
pub use change_parameter_type::ChangeParameterType;
pub use type_name::TypeName;

use crate::tree::{Meta, TypeTree};
use crate::visit::VisitContext;

/// Replaces the type written at `old` with `new`, registering the imports the
/// new type needs and dropping the import of the old one if it falls unused
pub(crate) fn retype(old: &TypeTree, new: &TypeName, ctx: &mut VisitContext<'_>) -> TypeTree {
    let mut tree = new.tree.clone();
    tree.meta = Meta::replacing(&old.meta);
    tree.ty = Some(new.ty.clone());
    for import in &new.imports {
        ctx.add_import(import.clone());
    }
    if let Some(fqn) = old.ty.as_ref().and_then(|ty| ty.fqn()) {
        let top_level = fqn.split('$').next().unwrap_or(fqn);
        if !new.imports.iter().any(|import| import == top_level) {
            ctx.remove_import(top_level);
        }
    }
    tree
}
