//! Same-host absolute links → relative paths.
//!
//! After wget's `--convert-links`, absolute references to the mirrored host
//! can remain in markup, stylesheets and scripts. Each one whose target was
//! downloaded is rewritten relative to the referencing file:
//!
//! | Reference (in `x/y.html`)           | On disk             | Result              |
//! |-------------------------------------|---------------------|---------------------|
//! | `https://example.com/a/b.png`       | `a/b.png`           | `../a/b.png`        |
//! | `//example.com/blog/#top`           | `blog/index.html`   | `../blog/index.html#top` |
//! | `http://example.com/missing.css`    | -                   | unchanged           |

use std::fs;
use std::path::Path;

use regex::bytes::Regex;

use super::{Origin, collect_files};
use crate::debug;
use crate::utils::path::route::{split_path_fragment, strip_leading_slash};
use crate::utils::path::{clean_path, is_within, relative_path};

/// Extensions of files scanned for links.
const LINK_EXTS: &[&str] = &["html", "htm", "css", "js"];

/// Counters for one rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub links: usize,
}

/// Matcher for `http://`, `https://` and `//` followed by the authority
/// and a path. Group 1 is the path.
pub fn link_matcher(origin: &Origin) -> Regex {
    let pattern = format!(
        r#"(?-u)(?i:(?:https?:)?//{})(/[^\s"'>)]+)"#,
        regex::escape(origin.authority())
    );
    // escaped literal inside a fixed template
    Regex::new(&pattern).unwrap_or_else(|e| unreachable!("link pattern: {e}"))
}

/// Replace every match whose path `resolve` maps to a new link.
///
/// Returns `None` when nothing was replaced. Bytes outside replaced
/// matches are copied verbatim.
pub fn rewrite_links<F>(text: &[u8], matcher: &Regex, mut resolve: F) -> Option<Vec<u8>>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = Vec::with_capacity(text.len());
    let mut last = 0;
    let mut changed = false;

    for caps in matcher.captures_iter(text) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(path) = std::str::from_utf8(path.as_bytes()) else {
            continue;
        };
        let Some(link) = resolve(path) else {
            continue;
        };

        out.extend_from_slice(&text[last..whole.start()]);
        out.extend_from_slice(link.as_bytes());
        last = whole.end();
        changed = true;
    }

    if !changed {
        return None;
    }
    out.extend_from_slice(&text[last..]);
    Some(out)
}

/// Rewrites same-host links across a snapshot.
pub struct LinkRewriter {
    matcher: Regex,
}

impl LinkRewriter {
    pub fn new(origin: &Origin) -> Self {
        Self {
            matcher: link_matcher(origin),
        }
    }

    /// Rewrite every link file under `root`.
    pub fn rewrite(&self, root: &Path) -> RewriteStats {
        let mut stats = RewriteStats::default();

        for file in collect_files(root, LINK_EXTS) {
            stats.files_scanned += 1;
            let text = match fs::read(&file) {
                Ok(text) => text,
                Err(e) => {
                    debug!("links"; "skip {}: {}", file.display(), e);
                    continue;
                }
            };

            let dir = file.parent().unwrap_or(root);
            let mut count = 0;
            let rewritten = rewrite_links(&text, &self.matcher, |path| {
                let link = resolve_local(root, dir, path)?;
                count += 1;
                Some(link)
            });

            let Some(rewritten) = rewritten else { continue };
            if let Err(e) = fs::write(&file, rewritten) {
                debug!("links"; "cannot write {}: {}", file.display(), e);
                continue;
            }
            stats.files_changed += 1;
            stats.links += count;
        }

        stats
    }
}

/// Relative link from `from_dir` to the file `url_path` names under `root`.
fn resolve_local(root: &Path, from_dir: &Path, url_path: &str) -> Option<String> {
    let (path, fragment) = split_path_fragment(url_path);
    let candidate = clean_path(&root.join(strip_leading_slash(path)));
    if !is_within(root, &candidate) {
        return None;
    }

    let target = if candidate.is_file() {
        candidate
    } else {
        let index = candidate.join("index.html");
        if !index.is_file() {
            return None;
        }
        index
    };

    let mut link = relative_path(from_dir, &target);
    if let Some(fragment) = fragment {
        link.push('#');
        link.push_str(fragment);
    }
    Some(link)
}
