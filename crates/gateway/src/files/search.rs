//! Concurrent text search across the sandbox.
//!
//! A query compiles to a single regular expression. Candidate files are
//! selected by one uncached walk (allow-list, binary exclusion, include and
//! exclude globs) and searched line by line on a per-call worker pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use protocol::messages::{ReplaceRequest, SearchMatch, SearchRequest};
use regex::{Regex, RegexBuilder};
use tracing::debug;
use walkdir::WalkDir;

use super::filter::AllowListFilter;
use super::pool::fan_out;
use super::resolver::to_slash;
use crate::config::SearchConfig;
use crate::error::{GatewayError, GatewayResult};

/// Search parameters shared by search and replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub whole_word: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl From<SearchRequest> for SearchQuery {
    fn from(req: SearchRequest) -> Self {
        Self {
            query: req.query,
            case_sensitive: req.case_sensitive,
            use_regex: req.use_regex,
            whole_word: req.whole_word,
            include: req.include,
            exclude: req.exclude,
        }
    }
}

impl SearchQuery {
    /// Split a replace request into its query and replacement text.
    pub fn from_replace(req: ReplaceRequest) -> (Self, String) {
        let query = Self {
            query: req.query,
            case_sensitive: req.case_sensitive,
            use_regex: req.use_regex,
            whole_word: req.whole_word,
            include: req.include,
            exclude: req.exclude,
        };
        (query, req.replacement)
    }

    /// Compile the query into a matcher.
    ///
    /// Literal queries are escaped; whole-word wraps the pattern in word
    /// boundaries; case-insensitivity is a compile flag.
    pub fn build_matcher(&self) -> GatewayResult<Regex> {
        if self.query.is_empty() {
            return Err(GatewayError::InvalidQuery("query is empty".to_string()));
        }

        let pattern = if self.use_regex {
            self.query.clone()
        } else {
            regex::escape(&self.query)
        };
        let pattern = if self.whole_word {
            format!(r"\b(?:{})\b", pattern)
        } else {
            pattern
        };

        RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| GatewayError::InvalidQuery(e.to_string()))
    }

    /// Compile the include and exclude globs.
    pub fn globs(&self) -> GatewayResult<GlobFilter> {
        GlobFilter::new(&self.include, &self.exclude)
            .map_err(|e| GatewayError::InvalidQuery(e.to_string()))
    }
}

/// Include/exclude glob lists matched against a path or its bare name.
#[derive(Debug, Clone, Default)]
pub struct GlobFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl GlobFilter {
    /// Compile the lists; blank patterns are ignored.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, globset::Error> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// Whether a file passes both lists.
    pub fn allows(&self, relative: &str, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(relative) && !include.is_match(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(relative) || exclude.is_match(name) {
                return false;
            }
        }
        true
    }
}

fn build_set(patterns: &[String]) -> Result<Option<GlobSet>, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;

    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        builder.add(Glob::new(pattern)?);
        any = true;
    }

    if !any {
        return Ok(None);
    }
    builder.build().map(Some)
}

/// A file selected for search or replace.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path.
    pub path: PathBuf,
    /// Root-relative path.
    pub relative: String,
}

/// Select the files a search or replace should visit.
///
/// Hidden and excluded directories are pruned; only regular, visible,
/// non-binary files that pass the globs are kept. With `skip_protected`,
/// protected paths are dropped as well.
pub fn collect_candidates(
    root: &Path,
    filter: &AllowListFilter,
    globs: &GlobFilter,
    skip_protected: bool,
) -> Vec<Candidate> {
    WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && filter.prunes_dir(&e.file_name().to_string_lossy(), false))
        })
        .filter_map(|item| match item {
            Ok(dent) => Some(dent),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|dent| dent.file_type().is_file())
        .filter(|dent| filter.is_visible(dent.path()) && !filter.is_binary(dent.path()))
        .filter_map(|dent| {
            let relative = to_slash(dent.path().strip_prefix(root).ok()?);
            let name = dent.file_name().to_string_lossy();
            if !globs.allows(&relative, &name) {
                return None;
            }
            if skip_protected && filter.is_protected(&relative) {
                return None;
            }
            Some(Candidate {
                path: dent.into_path(),
                relative,
            })
        })
        .collect()
}

/// Search one file line by line, keeping at most `cap` matches.
///
/// Content is decoded lossily; an unreadable file yields no matches.
pub fn search_file(path: &Path, relative: &str, matcher: &Regex, cap: usize) -> Vec<SearchMatch> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %relative, error = %e, "Skipping unreadable file");
            return Vec::new();
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    text.lines()
        .enumerate()
        .filter(|(_, line)| matcher.is_match(line))
        .take(cap)
        .map(|(index, line)| SearchMatch {
            path: relative.to_string(),
            line_number: index + 1,
            line_text: line.trim().to_string(),
        })
        .collect()
}

/// Searches the sandbox with bounded fan-out and result caps.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    root: PathBuf,
    filter: Arc<AllowListFilter>,
    limits: SearchConfig,
}

impl SearchEngine {
    /// Create an engine over the canonical `root`.
    pub fn new(root: impl Into<PathBuf>, filter: Arc<AllowListFilter>, limits: &SearchConfig) -> Self {
        Self {
            root: root.into(),
            filter,
            limits: limits.clone(),
        }
    }

    /// Run a search.
    ///
    /// Never fails: an invalid query or glob yields no matches and per-file
    /// errors contribute nothing. Matches are in completion order.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchMatch> {
        let matcher = match query.build_matcher() {
            Ok(m) => Arc::new(m),
            Err(e) => {
                debug!(error = %e, "Search query rejected");
                return Vec::new();
            }
        };
        let globs = match query.globs() {
            Ok(g) => g,
            Err(e) => {
                debug!(error = %e, "Search globs rejected");
                return Vec::new();
            }
        };

        let candidates = self.candidates(globs, false).await;
        debug!(files = candidates.len(), "Searching candidate files");

        let per_file = self.limits.max_matches_per_file;
        let max_results = self.limits.max_results;
        let mut pool = fan_out(candidates, self.limits.workers, move |c: Candidate| {
            search_file(&c.path, &c.relative, &matcher, per_file)
        });

        let mut matches = Vec::new();
        while let Some(found) = pool.next().await {
            let room = max_results.saturating_sub(matches.len());
            matches.extend(found.into_iter().take(room));
            if matches.len() >= max_results {
                pool.stop();
                break;
            }
        }

        matches
    }

    /// Collect candidates on the blocking pool.
    pub(crate) async fn candidates(&self, globs: GlobFilter, skip_protected: bool) -> Vec<Candidate> {
        let root = self.root.clone();
        let filter = Arc::clone(&self.filter);

        tokio::task::spawn_blocking(move || {
            collect_candidates(&root, &filter, &globs, skip_protected)
        })
        .await
        .unwrap_or_else(|e| {
            debug!(error = %e, "Candidate scan failed");
            Vec::new()
        })
    }

    /// Worker pool size and caps.
    pub fn limits(&self) -> &SearchConfig {
        &self.limits
    }
}
