//! Core infrastructure shared by every pipeline stage
//!
//! Errors, configuration, terminal output and the descriptor lock.

pub mod config;
pub mod error;
pub mod lock;
pub mod output;
