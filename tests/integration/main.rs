//! Integration tests for Shelf-Harvest
//!
//! `pipeline_tests` drive the orchestrator with an in-process catalog fetcher;
//! `http_tests` run the HTTP fetcher and full sessions against wiremock.

mod common;
mod http_tests;
mod pipeline_tests;
