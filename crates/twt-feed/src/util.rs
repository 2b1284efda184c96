//! Small string helpers shared across the crate.

/// Return the host part of a URL-ish string.
///
/// This is deliberately lenient: feeds carry all kinds of almost-URLs,
/// and a wrong host only degrades a mention's display domain, so we
/// slice rather than validate. Userinfo and port are stripped.
pub(crate) fn url_host(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => url,
    };
    let end = rest
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    let auth = &rest[..end];
    let auth = match auth.rfind('@') {
        Some(i) => &auth[i + 1..],
        None => auth,
    };
    match auth.find(':') {
        Some(i) => &auth[..i],
        None => auth,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(url_host("https://sour.is/xuu/twtxt.txt"), "sour.is");
        assert_eq!(url_host("http://example.org"), "example.org");
        assert_eq!(url_host("https://example.com:8080/feed"), "example.com");
        assert_eq!(url_host("gopher://user@example.com/1/"), "example.com");
        assert_eq!(url_host("example.com/twtxt.txt"), "example.com");
        assert_eq!(url_host(""), "");
    }
}
