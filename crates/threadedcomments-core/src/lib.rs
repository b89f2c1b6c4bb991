//! threadedcomments-core - materialized-path comment trees.
//!
//! This crate owns the comment store, the path codec, the tree manager that
//! keeps `tree_path`, `last_child_id` and `newest_activity` consistent, and
//! the service layer used by the CLI.

pub mod config;
pub mod core;
pub mod path;
pub mod store;
pub mod tree;
