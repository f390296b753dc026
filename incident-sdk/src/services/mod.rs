//! Service client implementations

pub mod common;
pub mod incident;
