//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
