//! Integration tests for Index-Relay
//!
//! These tests use wiremock to stand in for the token, indexing, and
//! inspection endpoints and exercise the full submit/inspect/scan cycles
//! end-to-end against an in-memory store.

mod scheduler_tests;
mod submit_tests;
mod support;
