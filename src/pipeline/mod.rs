//! Mirroring run.
//!
//! # Phases
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌───────┐   ┌──────────────┐   ┌─────────┐
//! │ preflight │ → │ prepare │ → │ fetch │ → │ post-process │ → │ promote │
//! │ (spider)  │   │ staging │   │ wget  │   │ links/assets │   │ rename  │
//! └───────────┘   └─────────┘   └───────┘   └──────────────┘   └─────────┘
//! ```
//!
//! The current snapshot is only touched by the final promotion. Any
//! earlier failure discards staging and leaves current as it was.
//! Post-processing problems are reported but never fail the run.

pub mod transform;


use std::path::{Path, PathBuf};

use crate::asset::{AssetCache, AssetFetcher, HttpFetcher};
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::snapshot::{self, SnapshotLayout};
use crate::utils::plural::plural_count;
use crate::wget::{WgetJob, run_wget};
use crate::{debug, log};

use transform::{LinkRewriter, Origin, localize};

/// One mirroring run over a loaded configuration.
pub struct Pipeline<'a> {
    config: &'a MirrorConfig,
    tool: PathBuf,
    fetcher: Option<Box<dyn AssetFetcher>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a MirrorConfig, tool: PathBuf) -> Self {
        Self {
            config,
            tool,
            fetcher: None,
        }
    }

    /// Use `fetcher` for cross-host assets instead of the HTTP client.
    pub fn with_fetcher(mut self, fetcher: Box<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Run every phase, or only the link check in spider-only mode.
    pub fn run(mut self) -> Result<()> {
        let layout = self.config.layout();

        self.preflight(&layout)?;
        if self.config.spider_only {
            log!("spider"; "link check passed");
            return Ok(());
        }

        let result = self.build(&layout);
        if result.is_err()
            && let Err(e) = snapshot::discard(&layout.staging)
        {
            debug!("mirror"; "cleanup failed: {}", e.report());
        }
        result
    }

    /// Spider pass into a throwaway staging directory.
    fn preflight(&self, layout: &SnapshotLayout) -> Result<()> {
        snapshot::discard(&layout.staging)?;
        let result = run_wget(&self.job(&layout.staging, true));
        let cleanup = snapshot::discard(&layout.staging);
        result.and(cleanup)
    }

    fn build(&mut self, layout: &SnapshotLayout) -> Result<()> {
        let seed = (!self.config.mirror.clean).then_some(layout.current.as_path());
        let seeded = snapshot::prepare(&layout.staging, seed)?;
        if seed.is_some() {
            log!("mirror"; "seeded staging with {}", plural_count(seeded, "file"));
        }

        run_wget(&self.job(&layout.staging, false))?;
        self.post_process(&layout.staging);

        let promotion = snapshot::promote(layout)?;
        if promotion.backup_left {
            log!("promote"; "previous snapshot left at {}", layout.backup.display());
        }
        if promotion.replaced {
            log!("promote"; "{} is up to date", layout.current.display());
        } else {
            log!("promote"; "published first snapshot at {}", layout.current.display());
        }
        Ok(())
    }

    fn post_process(&mut self, root: &Path) {
        let config = self.config;
        let url = &config.mirror.url;
        let Some(origin) = Origin::parse(url) else {
            log!("links"; "no host in {}, skipping rewrite", url);
            return;
        };

        let stats = LinkRewriter::new(&origin).rewrite(root);
        log!(
            "links";
            "rewrote {} in {} of {}",
            plural_count(stats.links, "link"),
            stats.files_changed,
            plural_count(stats.files_scanned, "file")
        );

        if !config.assets.localize {
            return;
        }
        let Some(fetcher) = self.take_fetcher() else {
            return;
        };

        let mut cache = AssetCache::new(root, fetcher);
        let stats = localize(root, &origin, &mut cache);
        debug!("assets"; "store: {}", cache.store_dir().display());
        log!(
            "assets";
            "localized {} in {}",
            plural_count(stats.localized, "image"),
            plural_count(stats.files_changed, "file")
        );
        if stats.failed > 0 {
            log!("assets"; "{} kept remote", plural_count(stats.failed, "image"));
        }
    }

    fn take_fetcher(&mut self) -> Option<Box<dyn AssetFetcher>> {
        if let Some(fetcher) = self.fetcher.take() {
            return Some(fetcher);
        }
        match HttpFetcher::new(self.config.assets.timeout()) {
            Ok(fetcher) => Some(Box::new(fetcher)),
            Err(e) => {
                log!("assets"; "skipping image localization: {:#}", e);
                None
            }
        }
    }

    fn job<'b>(&'b self, out_dir: &'b Path, spider: bool) -> WgetJob<'b> {
        WgetJob {
            tool: &self.tool,
            url: &self.config.mirror.url,
            reject: &self.config.mirror.reject,
            out_dir,
            spider,
        }
    }
}
