//! Breadth-first crawl frontier
//!
//! The frontier owns the FIFO queue of pending pages and the set of URLs that
//! have ever been accepted. A URL is marked visited the moment it is
//! enqueued, so the visited set doubles as the page budget: it can never
//! grow past `max_pages`, and every entry is fetched exactly once.

use std::collections::{HashSet, VecDeque};
use thiserror::Error;
use url::Url;

/// Errors returned by frontier operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("Frontier is empty")]
    Empty,
}

/// A page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized, same-origin URL
    pub url: Url,

    /// Link distance from the start URL
    pub depth: u32,
}

/// FIFO work queue with a visited-set guard
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier that accepts at most `max_pages` URLs
    pub fn new(max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_pages,
        }
    }

    /// Creates a frontier seeded with the start URL at depth 0
    pub fn with_seed(start: Url, max_pages: usize) -> Self {
        let mut frontier = Self::new(max_pages);
        frontier.enqueue(start, 0);
        frontier
    }

    /// Queues a URL unless it was already seen or the page budget is spent
    ///
    /// Returns `true` if the URL was accepted.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if self.is_full() {
            tracing::trace!("Page budget spent, not queueing {}", url);
            return false;
        }

        if !self.visited.insert(url.as_str().to_string()) {
            return false;
        }

        tracing::trace!("Queued {} at depth {}", url, depth);
        self.queue.push_back(CrawlTask { url, depth });
        true
    }

    /// Pops the oldest queued task
    pub fn dequeue(&mut self) -> Result<CrawlTask, FrontierError> {
        self.queue.pop_front().ok_or(FrontierError::Empty)
    }

    /// Returns true once `max_pages` URLs have been accepted
    pub fn is_full(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// Returns true if the URL has been accepted before
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs ever accepted
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of tasks still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}
