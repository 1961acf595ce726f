//! Common test utilities for all integration tests.

#![allow(dead_code)]

pub mod app;
pub mod memory;
#[cfg(feature = "postgres_tests")]
pub mod postgres;
