//! HTML to Markdown conversion
//!
//! Pages are converted with `html2md`, which never re-wraps text: long lines
//! (code, URLs, tables) survive verbatim.

use crate::crawler::FetchedPage;
use url::Url;

/// HTML to text capability
pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// [`Converter`] backed by `html2md`
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        html2md::parse_html(html)
    }
}

/// One converted, storage-ready page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownArtifact {
    /// URL the page was fetched from
    pub source_url: Url,

    /// File name relative to the workspace; also the storage key
    pub relative_path: String,

    /// Markdown bytes
    pub content: Vec<u8>,
}

/// Converts one page into an artifact
pub fn convert_page(converter: &dyn Converter, page: &FetchedPage) -> MarkdownArtifact {
    MarkdownArtifact {
        source_url: page.url.clone(),
        relative_path: artifact_path(&page.url),
        content: converter.to_markdown(&page.html).into_bytes(),
    }
}

/// Derives the artifact file name from a URL's path
///
/// 1. Strip the leading slash
/// 2. Substitute `index` for an empty path
/// 3. Sanitize (see [`sanitize_filename`])
/// 4. Append `.md`
///
/// Query strings and fragments do not take part.
///
/// # Examples
///
/// ```
/// use bucket_ferry::convert::artifact_path;
/// use url::Url;
///
/// assert_eq!(artifact_path(&Url::parse("http://a.com/").unwrap()), "index.md");
/// assert_eq!(artifact_path(&Url::parse("http://a.com/docs/intro").unwrap()), "docs_intro.md");
/// ```
pub fn artifact_path(url: &Url) -> String {
    let path = url.path().trim_start_matches('/');
    let stem = if path.is_empty() { "index" } else { path };

    let mut name = sanitize_filename(stem);
    if name.is_empty() {
        name.push_str("index");
    }
    name.push_str(".md");
    name
}

/// Reduces a string to a safe, flat file name
///
/// Path separators and whitespace runs become a single `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading/trailing `.` and `_` are trimmed,
/// so the result can never name a parent directory or a hidden file.
pub fn sanitize_filename(raw: &str) -> String {
    let joined = raw
        .split(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
