//! Include/exclude glob gate for candidate assets
//!
//! Relative patterns are anchored at the configured working directory;
//! `**`-prefixed and absolute patterns are used as written.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

use crate::error::{ImageminError, Result};

/// Compiled include/exclude patterns
#[derive(Debug, Clone)]
pub struct InclusionFilter {
    include: GlobSet,
    exclude: GlobSet,
    match_all: bool,
    cwd: String,
}

impl InclusionFilter {
    pub fn new(include: &[String], exclude: &[String], cwd: &Path) -> Result<Self> {
        let cwd = to_slash(&cwd.to_string_lossy());
        Ok(Self {
            include: build_set(include, &cwd)?,
            exclude: build_set(exclude, &cwd)?,
            match_all: include.is_empty(),
            cwd,
        })
    }

    /// Whether `id` is a candidate asset.
    ///
    /// Virtual module ids (containing `\0`) are never accepted.
    pub fn accepts(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }

        let path = self.normalize_id(id);
        let included = self.match_all || self.include.is_match(&path);
        let accepted = included && !self.exclude.is_match(&path);

        tracing::debug!(id, accepted, "imagemin: filter");
        accepted
    }

    fn normalize_id(&self, id: &str) -> String {
        let id = to_slash(id);
        if Path::new(&id).is_absolute() || id.starts_with('/') {
            id
        } else {
            format!("{}/{}", self.cwd.trim_end_matches('/'), id.trim_start_matches("./"))
        }
    }
}

fn build_set(patterns: &[String], cwd: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern, cwd)?);
    }
    builder.build().map_err(|source| ImageminError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

pub(crate) fn compile(pattern: &str, cwd: &str) -> Result<Glob> {
    let anchored = anchor_pattern(pattern, cwd);
    GlobBuilder::new(&anchored)
        .literal_separator(true)
        .build()
        .map_err(|source| ImageminError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Make a pattern absolute against `cwd` unless it already is, or starts
/// with `**`.
pub(crate) fn anchor_pattern(pattern: &str, cwd: &str) -> String {
    let pattern = to_slash(pattern);
    if pattern.starts_with("**") || pattern.starts_with('/') || Path::new(&pattern).is_absolute() {
        return pattern;
    }

    format!(
        "{}/{}",
        globset::escape(cwd.trim_end_matches('/')),
        pattern.trim_start_matches("./")
    )
}

pub(crate) fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> InclusionFilter {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        InclusionFilter::new(&include, &exclude, Path::new("/project")).unwrap()
    }

    #[test]
    fn test_default_include() {
        let filter = filter(&["**/*.{svg,png,jpg,jpeg,gif}"], &[]);

        assert!(filter.accepts("/project/src/logo.svg"));
        assert!(filter.accepts("/project/a/b/c/photo.jpeg"));
        assert!(filter.accepts("/elsewhere/anim.gif"));
        assert!(!filter.accepts("/project/src/index.js"));
        assert!(!filter.accepts("/project/src/logo.svg.map"));
    }

    #[test]
    fn test_exclude_wins() {
        let filter = filter(&["**/*.png"], &["**/vendor/**"]);

        assert!(filter.accepts("/project/img/a.png"));
        assert!(!filter.accepts("/project/vendor/a.png"));
        assert!(!filter.accepts("/project/deep/vendor/x/a.png"));
    }

    #[test]
    fn test_relative_patterns_are_anchored_at_cwd() {
        let filter = filter(&["src/**/*.png", "./static/*.gif"], &[]);

        assert!(filter.accepts("/project/src/img/a.png"));
        assert!(filter.accepts("/project/static/b.gif"));
        assert!(!filter.accepts("/other/src/img/a.png"));
        assert!(!filter.accepts("/project/static/nested/b.gif"));
    }

    #[test]
    fn test_relative_ids() {
        let filter = filter(&["src/*.png"], &[]);
        assert!(filter.accepts("src/a.png"));
        assert!(filter.accepts("./src/a.png"));
    }

    #[test]
    fn test_empty_include_matches_all() {
        let filter = filter(&[], &["**/*.js"]);
        assert!(filter.accepts("/project/any/file.webp"));
        assert!(!filter.accepts("/project/main.js"));
    }

    #[test]
    fn test_virtual_ids_rejected() {
        let filter = filter(&["**/*"], &[]);
        assert!(!filter.accepts("\0virtual:image.png"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = InclusionFilter::new(&["src/[".to_string()], &[], Path::new("/project")).unwrap_err();
        assert!(matches!(err, ImageminError::InvalidPattern { .. }));
    }

    #[test]
    fn test_anchor_escapes_cwd() {
        assert_eq!(anchor_pattern("*.png", "/site [draft]"), "/site [[]draft[]]/*.png");
        assert_eq!(anchor_pattern("**/*.png", "/project"), "**/*.png");
        assert_eq!(anchor_pattern("/abs/*.png", "/project"), "/abs/*.png");
    }
}
