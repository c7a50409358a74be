//! Post-processing passes over a freshly fetched snapshot.
//!
//! Both passes scan raw bytes, so content that is not valid UTF-8 survives
//! untouched outside the matched spans. Per-file I/O errors are logged at
//! debug level and never abort a pass.

mod link;
mod media;

pub use link::LinkRewriter;
pub use media::localize;

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use url::Url;

/// Authority (`host[:port]`) of the mirrored site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    authority: String,
}

impl Origin {
    /// `None` when the URL has no scheme or host.
    pub fn parse(url: &str) -> Option<Self> {
        Url::parse(url).ok().as_ref().and_then(Self::from_url)
    }

    fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        Some(Self { authority })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Whether `url` is served by this origin. URLs without a host are.
    pub fn serves(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => Self::from_url(&parsed).is_none_or(|o| o == *self),
            Err(_) => true,
        }
    }
}

/// Files under `root` whose extension is one of `exts` (ASCII
/// case-insensitive), in sorted order.
pub(crate) fn collect_files(root: &Path, exts: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_origin_authority() {
        let origin = Origin::parse("https://Example.com/blog/").unwrap();
        assert_eq!(origin.authority(), "example.com");

        let origin = Origin::parse("http://localhost:8080").unwrap();
        assert_eq!(origin.authority(), "localhost:8080");

        // default port is folded away
        let origin = Origin::parse("https://example.com:443/").unwrap();
        assert_eq!(origin.authority(), "example.com");
    }

    #[test]
    fn test_origin_without_host() {
        assert!(Origin::parse("example.com/path").is_none());
        assert!(Origin::parse("file:///srv/site").is_none());
    }

    #[test]
    fn test_origin_serves() {
        let origin = Origin::parse("https://example.com/").unwrap();
        assert!(origin.serves("http://example.com/a.png"));
        assert!(origin.serves("https://EXAMPLE.com/a.png"));
        assert!(!origin.serves("https://cdn.example.com/a.png"));
        assert!(!origin.serves("https://example.com:8443/a.png"));
        assert!(origin.serves("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.HTML", "a/c.css", "a/d.png", "e.js", "f.htm", "g"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let files = collect_files(dir.path(), &["html", "htm", "css", "js"]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, ["a/c.css", "b.HTML", "e.js", "f.htm"]);
    }
}
