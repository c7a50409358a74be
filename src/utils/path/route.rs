//! URL path utilities.
//!
//! Small pure helpers shared by the rewrite passes:
//! - Leading slash handling
//! - Fragment splitting
//! - Extension detection for URL paths

/// Strip leading slash from a URL path
///
/// # Examples
/// ```ignore
/// assert_eq!(strip_leading_slash("/blog/post"), "blog/post");
/// assert_eq!(strip_leading_slash("/"), "");
/// ```
#[inline]
pub fn strip_leading_slash(url: &str) -> &str {
    url.trim_start_matches('/')
}

/// Split a URL into path and fragment parts
///
/// # Returns
/// A tuple of (path, fragment) where fragment is `None` if no `#` found
///
/// # Examples
/// ```ignore
/// assert_eq!(split_path_fragment("/about#team"), ("/about", Some("team")));
/// assert_eq!(split_path_fragment("/about"), ("/about", None));
/// ```
#[inline]
pub fn split_path_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    }
}

/// Extension of the last segment of a URL path, without the dot.
///
/// Only non-empty ASCII alphanumeric extensions are returned so the result
/// is always safe to embed in a filename.
///
/// # Examples
/// ```ignore
/// assert_eq!(url_path_extension("/img/logo.PNG"), Some("PNG"));
/// assert_eq!(url_path_extension("/img/logo"), None);
/// assert_eq!(url_path_extension("/img.d/logo"), None);
/// ```
pub fn url_path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_slash() {
        assert_eq!(strip_leading_slash("/blog/post"), "blog/post");
        assert_eq!(strip_leading_slash("blog/post"), "blog/post");
        assert_eq!(strip_leading_slash("/"), "");
        assert_eq!(strip_leading_slash(""), "");
    }

    #[test]
    fn test_split_path_fragment() {
        assert_eq!(split_path_fragment("/about#team"), ("/about", Some("team")));
        assert_eq!(split_path_fragment("/about"), ("/about", None));
        assert_eq!(split_path_fragment("/about#"), ("/about", Some("")));
    }

    #[test]
    fn test_url_path_extension() {
        assert_eq!(url_path_extension("/img/logo.png"), Some("png"));
        assert_eq!(url_path_extension("/a/b.tar.gz"), Some("gz"));
        assert_eq!(url_path_extension("/img/logo"), None);
        assert_eq!(url_path_extension("/img/logo."), None);
        assert_eq!(url_path_extension("/img/.hidden"), None);
        assert_eq!(url_path_extension("/img.d/logo"), None);
        assert_eq!(url_path_extension("/img/a.p~g"), None);
        assert_eq!(url_path_extension(""), None);
    }
}
