//! Pipeline stages
//!
//! Each module is one step of the acquisition run and returns
//! [`crate::core::error::Result`]; [`crate::pipeline`] sequences them.

pub mod assets;
pub mod descriptor;
pub mod download;
pub mod extract;
pub mod http;
pub mod release;
pub mod url;
