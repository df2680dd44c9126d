//! Integration tests module
//!
//! Contains tests that require a database and test the full API.

mod auth_test;
mod leads_api_test;
mod notify_test;
