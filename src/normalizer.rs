use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Hop limit for the HEAD redirect chase; a chain longer than this is treated
/// as a loop and the run aborts.
pub const MAX_REDIRECT_HOPS: usize = 10;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("invalid URL {url:?}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("HEAD request to {url} failed: {source}")]
    Head {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("too many redirects (gave up after {hops} hops at {url})")]
    TooManyRedirects { url: Url, hops: usize },
}

/// Prepends `https://` when the operator-supplied string carries no scheme.
pub fn ensure_scheme(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Canonicalizes the operator input: scheme first, then the redirect chase.
/// The client must have redirect-following disabled so each hop is observed.
pub fn normalize(head_client: &Client, raw: &str) -> Result<Url, NormalizeError> {
    let with_scheme = ensure_scheme(raw);
    let url = Url::parse(&with_scheme).map_err(|source| NormalizeError::Invalid {
        url: with_scheme,
        source,
    })?;
    follow_redirects(head_client, url)
}

/// Chases 301/302 `Location` headers with HEAD requests until a non-redirect
/// response, resolving relative locations against the current URL. Up to
/// [`MAX_REDIRECT_HOPS`] redirects are followed and the URL they land on is
/// still probed; only a chain longer than that fails.
pub fn follow_redirects(head_client: &Client, start: Url) -> Result<Url, NormalizeError> {
    let mut current = start;
    let mut hops = 0;

    loop {
        let response = head_client
            .head(current.clone())
            .send()
            .map_err(|source| NormalizeError::Head {
                url: current.clone(),
                source,
            })?;

        if !matches!(
            response.status(),
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
        ) {
            return Ok(current);
        }

        let location = match response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
        {
            Some(location) => location.to_string(),
            // Redirect status without a usable Location: stop where we are.
            None => return Ok(current),
        };

        if hops == MAX_REDIRECT_HOPS {
            return Err(NormalizeError::TooManyRedirects { url: current, hops });
        }
        hops += 1;

        current = current
            .join(&location)
            .map_err(|source| NormalizeError::Invalid {
                url: location,
                source,
            })?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_https_when_scheme_missing() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
        assert_eq!(ensure_scheme("  example.com/page "), "https://example.com/page");
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
    }
}
