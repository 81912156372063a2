//! lgh library
//!
//! This module exports the pieces of the lgh command line tool for use in
//! integration tests and as a library.

pub mod chat;
pub mod config;
pub mod output;
pub mod run;
pub mod summary;
