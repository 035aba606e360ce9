//! HTML parser for extracting links and metadata
//!
//! This module handles parsing fetched pages to extract:
//! - Same-origin links to follow (from `<a href>` tags)
//! - Page title, for progress logging
//!
//! Parsed documents are not `Send`; callers keep them inside a synchronous
//! scope and never hold one across an `.await`.

use crate::crawler::fetcher::FetchedPage;
use crate::url::UrlNormalizer;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched page with its parsed document
pub struct ParsedPage<'p> {
    page: &'p FetchedPage,
    document: Html,
}

/// Parses the page's HTML
///
/// # Example
///
/// ```
/// use bucket_ferry::crawler::{parse_html, FetchedPage};
/// use bucket_ferry::url::UrlNormalizer;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/").unwrap();
/// let page = FetchedPage {
///     url: url.clone(),
///     html: r#"<title>Home</title><a href="/docs">Docs</a><a href="https://other.com/">x</a>"#.into(),
/// };
/// let normalizer = UrlNormalizer::new(&url);
/// let parsed = parse_html(&page);
/// let links: Vec<Url> = parsed.links(&normalizer).collect();
/// assert_eq!(parsed.title(), Some("Home".to_string()));
/// assert_eq!(links, vec![Url::parse("https://example.com/docs").unwrap()]);
/// ```
pub fn parse_html(page: &FetchedPage) -> ParsedPage<'_> {
    ParsedPage {
        page,
        document: Html::parse_document(&page.html),
    }
}

impl<'p> ParsedPage<'p> {
    /// The page title (from the `<title>` tag)
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Lazily yields the normalized, same-origin targets of `<a href>` tags
    ///
    /// Links are resolved against the page URL and scoped to the
    /// normalizer's base. Anchors with a `download` attribute are skipped.
    /// The sequence is single-pass and may contain repeats; the frontier
    /// filters those.
    pub fn links<'a>(&'a self, normalizer: &'a UrlNormalizer) -> impl Iterator<Item = Url> + 'a {
        let page_url = &self.page.url;

        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "a")
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .filter_map(move |href| {
                let resolved = normalizer.normalize_from(href, page_url);
                if resolved.is_none() {
                    tracing::trace!("Skipping link {:?} on {}", href, page_url);
                }
                resolved
            })
    }
}

/// Convenience function collecting the links of a page
pub fn extract_links(page: &FetchedPage, normalizer: &UrlNormalizer) -> Vec<Url> {
    parse_html(page).links(normalizer).collect()
}
