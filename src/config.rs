//! Configuration file parsing and validation

pub mod rewrites_toml;

pub use rewrites_toml::{
    ClasspathConfig, ColorOption, Config, OutputConfig, OutputFormat, RecipesConfig, RewritesMeta,
};
