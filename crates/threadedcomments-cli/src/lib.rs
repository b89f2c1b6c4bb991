//! threadedcomments - post, list, and maintain threaded comment trees

pub mod cli;
pub mod output;
pub mod settings;
