//! Search and replace across the sandbox.
//!
//! Uses the same candidate pipeline as search with protected paths removed.
//! Each file is read strictly as UTF-8, rewritten atomically when the query
//! matched, and reported to the caller as it completes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use protocol::messages::ReplaceSummary;
use regex::{NoExpand, Regex};
use tracing::debug;

use super::filter::AllowListFilter;
use super::operations::write_atomic;
use super::pool::fan_out;
use super::search::{Candidate, SearchEngine, SearchQuery};
use crate::config::SearchConfig;
use crate::error::GatewayResult;

/// Replace every match in one file.
///
/// Returns the number of substitutions, or `None` when the file had no
/// match, was not valid UTF-8, or could not be written.
pub fn replace_in_file(path: &Path, matcher: &Regex, replacement: &str, literal: bool) -> Option<usize> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping file for replace");
            return None;
        }
    };

    let occurrences = matcher.find_iter(&content).count();
    if occurrences == 0 {
        return None;
    }

    let updated = if literal {
        matcher.replace_all(&content, NoExpand(replacement))
    } else {
        matcher.replace_all(&content, replacement)
    };

    match write_atomic(path, updated.as_bytes()) {
        Ok(()) => Some(occurrences),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Replace write failed");
            None
        }
    }
}

/// Rewrites matching files with bounded fan-out.
#[derive(Debug, Clone)]
pub struct ReplaceEngine {
    search: SearchEngine,
}

impl ReplaceEngine {
    /// Create an engine over the canonical `root`.
    pub fn new(root: impl Into<PathBuf>, filter: Arc<AllowListFilter>, limits: &SearchConfig) -> Self {
        Self {
            search: SearchEngine::new(root, filter, limits),
        }
    }

    /// Replace `query` with `replacement` in every candidate file.
    ///
    /// `on_update` runs once per rewritten file, in completion order. An
    /// invalid query or glob fails the whole call; per-file failures only
    /// leave that file unchanged.
    pub async fn replace<F>(
        &self,
        query: &SearchQuery,
        replacement: &str,
        mut on_update: F,
    ) -> GatewayResult<ReplaceSummary>
    where
        F: FnMut(&str, usize),
    {
        let matcher = Arc::new(query.build_matcher()?);
        let globs = query.globs()?;

        let candidates = self.search.candidates(globs, true).await;
        debug!(files = candidates.len(), "Replacing in candidate files");

        let literal = !query.use_regex;
        let replacement = replacement.to_string();
        let mut pool = fan_out(
            candidates,
            self.search.limits().workers,
            move |c: Candidate| {
                replace_in_file(&c.path, &matcher, &replacement, literal).map(|n| (c.relative, n))
            },
        );

        let mut summary = ReplaceSummary {
            success: true,
            ..ReplaceSummary::default()
        };
        while let Some(result) = pool.next().await {
            if let Some((relative, occurrences)) = result {
                summary.files_updated += 1;
                summary.occurrences += occurrences;
                on_update(&relative, occurrences);
            }
        }

        Ok(summary)
    }
}
