use itertools::Itertools;
use percent_encoding::percent_decode_str;
use url::Url;

/// Title fallback from the last URL path segment: "this-is-a-title" -> "this is a title".
/// URLs without a usable last segment give an empty title.
pub fn fill_missing_title(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    // `url` percent-encodes non-ASCII path characters; the slug is wanted as written
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
        .map(|segment| segment.split('-').join(" "))
        .unwrap_or_default()
}

/// Network location of `url` (host plus any non-default port). `None` when
/// the URL does not parse or has no host.
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
