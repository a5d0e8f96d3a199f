//! Integration tests for linkscope
//!
//! These tests use wiremock to stand in for the scraped origins and drive the
//! service through its public API: fetcher, orchestrator, and HTTP router.

mod api_tests;
mod batch_tests;
mod common;
mod fetch_tests;
