#![forbid(unsafe_code)]

//! Finding tracked methods in attributed trees
//!
//! [`MethodMatcher`] recognizes a method by an AspectJ-style signature
//! pattern, compared against resolved method types. [`Precondition`] uses
//! matchers to decide cheaply whether a compilation unit can be affected by a
//! recipe at all.

pub mod method_matcher;
pub mod precondition;

pub use method_matcher::MethodMatcher;
pub use precondition::Precondition;
