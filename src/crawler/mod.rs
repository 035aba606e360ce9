//! Crawler module for web page fetching and processing
//!
//! This module contains the website source pipeline, including:
//! - The breadth-first frontier with its visited-set guard
//! - HTTP fetching with bounded timeouts
//! - HTML parsing and same-origin link extraction
//! - The crawl loop tying them together

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{crawl_site, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{CrawlTask, Frontier, FrontierError};
pub use parser::{extract_links, parse_html, ParsedPage};
