// src/paths/mod.rs

//! Named asset categories and their source, build and watch patterns.

pub mod normalize;
pub mod resolver;

pub use resolver::{PathResolver, PatternMatcher, ResolvedPatterns};
