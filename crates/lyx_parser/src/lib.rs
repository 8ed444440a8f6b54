//! SQL front-end for routing decisions.
//!
//! Parses a reduced subset of SQL into a tree that keeps only what a router
//! needs (relations, join shape, predicates, session effects) and extracts
//! routing facts from it.
pub mod ast;
pub mod errors;
pub mod keywords;
pub mod parser;
pub mod route;
pub mod statement;
pub mod tokens;
pub mod visit;
