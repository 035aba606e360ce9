use url::Url;

/// Checks whether two URLs share scheme, host and port
///
/// Default ports are taken into account, so `http://a.com` and
/// `http://a.com:80` are the same origin. URLs with opaque origins
/// (`mailto:`, `data:`) never match anything.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    let (a, b) = (a.origin(), b.origin());
    a.is_tuple() && a == b
}
