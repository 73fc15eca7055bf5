//! Filepath: src/infra/walk.rs
//! Export discovery: finds chat-export CSVs under a data directory.
//! - Optional `.gitignore` awareness (exports are often git-ignored, so off by default)
//! - Extra ignore globs (early prune + late filter)
//! - Hidden files skipped unless asked for
//! - Deterministic ordering for stable output/tests
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::{debug, instrument, warn};

/// Directory name meaning "every guild under the data dir"
pub const ALL_GUILDS: &str = "all";

/// Walk root for an export tree: `data_dir` itself for `all`/no guild,
/// otherwise `data_dir/<guild>`.
pub fn export_root(
    data_dir: &Path,
    guild: Option<&str>,
    all: bool,
) -> PathBuf
{
    match guild
    {
        Some(g) if !all && g != ALL_GUILDS => data_dir.join(g),
        _ => data_dir.to_path_buf(),
    }
}

fn is_csv(path: &Path) -> bool
{
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Recursive `*.csv` finder with extra ignore globs
pub struct CsvWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Honour .gitignore/.ignore files; default false
    respect_gitignore: bool,

    /// Include hidden (dot) files; default false
    include_hidden: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

impl CsvWalker
{
    /// Build a walker with additional ignore patterns (e.g., "archive/**").
    /// Patterns match on paths relative to the walk root.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            respect_gitignore: false,
            include_hidden: false,
            max_depth: None,
        })
    }

    pub fn with_respect_gitignore(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_gitignore = respect;
        self
    }

    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// Limit recursion depth (`None` = unbounded)
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) skips dotfiles
        b.hidden(!self.include_hidden);

        b.git_ignore(self.respect_gitignore);
        b.git_global(self.respect_gitignore);
        b.git_exclude(self.respect_gitignore);
        b.ignore(self.respect_gitignore);
        b.parents(self.respect_gitignore);

        b.max_depth(self.max_depth);

        // Prune ignored directories early; match relative to the root so
        // patterns behave the same wherever the data dir lives
        let extra = self
            .ignore_patterns
            .clone();
        let base = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .is_some_and(|ft| ft.is_dir());
            if !is_dir
            {
                return true;
            }

            let rel = ent
                .path()
                .strip_prefix(&base)
                .unwrap_or(ent.path());
            !(extra.is_match(rel) || extra.is_match(rel.join("")))
        });

        b
    }

    /// All CSV files under `root`, sorted. Unreadable entries are logged and skipped.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn walk(
        &self,
        root: &Path,
    ) -> Vec<PathBuf>
    {
        let mut out: Vec<PathBuf> = self
            .build_walk(root)
            .build()
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    warn!(%err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            .filter(|p| is_csv(p))
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();
        debug!(files = out.len(), "discovered exports");

        out
    }
}
