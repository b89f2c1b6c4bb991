//! Command implementations.

#![allow(clippy::missing_errors_doc)]

pub mod check;
pub mod comments;
pub mod helpers;
pub mod init;
pub mod threads;

pub use check::run_check;
pub use comments::{run_delete, run_post, PostArgs};
pub use init::run_init;
pub use threads::{run_list, run_rebuild_paths, run_show};
