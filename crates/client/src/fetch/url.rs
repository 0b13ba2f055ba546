//! URL canonicalization applied before every fetch.

use pagevault_core::Error;

/// Canonicalize a URL string before fetching.
///
/// - Trim surrounding whitespace
/// - Default the scheme to `https` when missing
/// - Lowercase the host
/// - Strip the fragment, keep the query as written
///
/// Only `http` and `https` URLs are fetchable.
pub fn canonicalize(input: &str) -> Result<url::Url, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty url".into()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut parsed = url::Url::parse(&with_scheme).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(Error::InvalidUrl(format!("unsupported scheme: {other}"))),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_ascii_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
