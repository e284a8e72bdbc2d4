use url::Url;

/// Extracts the network location from a URL
///
/// The network location is the lowercase host, plus `:port` when the URL
/// carries an explicit non-default port. `url::Url` drops default ports at
/// parse time, so `https://example.com/` and `https://example.com:443/`
/// produce the same netloc.
///
/// # Arguments
///
/// * `url` - The URL to extract the network location from
///
/// # Returns
///
/// * `Some(String)` - The network location
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use weft::url::netloc;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://example.com:8080/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host.to_lowercase(), port)),
        None => Some(host.to_lowercase()),
    }
}

/// Strips the fragment component from a URL
///
/// Frontier deduplication treats `page#a` and `page#b` as the same page, so
/// every URL is defragmented before it is considered for enqueueing.
pub fn defragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
