use crate::url::domain::same_origin;
use serde::Deserialize;
use url::Url;

/// What relative hrefs found during a crawl are resolved against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkBase {
    /// The page the link appears on, as a browser would
    #[default]
    Page,

    /// The crawl's start URL
    Start,
}

/// Resolves a raw href against a base URL and scopes it to the base's origin
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty hrefs
/// 2. Resolve against `base` (handles relative paths, `//host/path`
///    protocol-relative links and `#fragment` links)
/// 3. Remove fragment (everything after #)
/// 4. Reject if the scheme, host or port differs from `base`
///
/// Non-HTTP links such as `mailto:` or `javascript:` resolve to opaque
/// origins and are therefore always rejected.
///
/// # Arguments
///
/// * `href` - The raw href attribute value
/// * `base` - The crawl base URL; defines both resolution and scope
///
/// # Returns
///
/// * `Some(Url)` - Absolute, fragment-free, same-origin URL
/// * `None` - The link is malformed or leaves the crawl's origin
///
/// # Examples
///
/// ```
/// use bucket_ferry::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("http://a.com/x").unwrap();
/// assert_eq!(normalize_url("/y", &base).unwrap().as_str(), "http://a.com/y");
/// assert!(normalize_url("http://b.com/y", &base).is_none());
/// ```
pub fn normalize_url(href: &str, base: &Url) -> Option<Url> {
    normalize_link(href, base, base)
}

/// Resolves `href` against the page it was found on, scoped to `scope`
///
/// Relative links on nested pages (`guide/intro.html` on `/docs/`) must be
/// resolved against that page, while the same-origin check always compares
/// with the crawl's starting URL.
pub fn normalize_link(href: &str, page: &Url, scope: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let mut absolute = page.join(href).ok()?;
    absolute.set_fragment(None);

    if !same_origin(&absolute, scope) {
        tracing::trace!("Dropping off-origin link {} (scope {})", absolute, scope);
        return None;
    }

    Some(absolute)
}

/// Stateful normalizer bound to one crawl's base URL
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    base: Url,
    link_base: LinkBase,
}

impl UrlNormalizer {
    /// Creates a normalizer scoped to `base`; the fragment of `base` is dropped
    pub fn new(base: &Url) -> Self {
        let mut base = base.clone();
        base.set_fragment(None);
        Self {
            base,
            link_base: LinkBase::default(),
        }
    }

    pub fn with_link_base(mut self, link_base: LinkBase) -> Self {
        self.link_base = link_base;
        self
    }

    /// The crawl base this normalizer scopes links to
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves `href` against the crawl base
    pub fn normalize(&self, href: &str) -> Option<Url> {
        normalize_url(href, &self.base)
    }

    /// Resolves `href` found on `page`, scoped to the crawl base
    ///
    /// With [`LinkBase::Start`] the page is ignored and `href` is resolved
    /// against the crawl base.
    pub fn normalize_from(&self, href: &str, page: &Url) -> Option<Url> {
        match self.link_base {
            LinkBase::Page => normalize_link(href, page, &self.base),
            LinkBase::Start => normalize_url(href, &self.base),
        }
    }
}
