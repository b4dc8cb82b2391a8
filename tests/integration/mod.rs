//! Integration test module
//!
//! Contains end-to-end tests for the simulator, management and admin APIs.

pub mod simulator_tests;
pub mod management_tests;
pub mod admin_tests;
