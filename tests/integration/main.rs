//! End-to-end tests against mock HTTP servers
//!
//! Sites, the GitHub archive host and the S3 endpoint are all served by
//! wiremock; job workspaces live under a tempdir.

mod common;
mod crawl_tests;
mod repo_tests;
mod storage_tests;
