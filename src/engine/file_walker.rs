//! Java source discovery with gitignore support
//!
//! Walks a directory tree the way ripgrep does, keeps the files the `ignore`
//! crate's `java` file type recognizes and applies include/exclude globs.

use crate::types::GlobPattern;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use ignore::types::{Types, TypesBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file walking
#[derive(Debug, Error)]
pub enum FileWalkerError {
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("Invalid file type definition: {0}")]
    Types(ignore::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Reason why a file was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// File did not match include patterns, or matched an exclude pattern
    ExcludedByPattern,
    /// File is not a Java source
    NotJava,
    /// Not a regular file (e.g., directory)
    NotAFile,
}

/// Result of file walking - either a source to rewrite or a skipped path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkResult {
    File(FileEntry),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// A discovered Java source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
}

/// Iterator factory over discovered Java sources
pub struct FileWalker {
    walker: ignore::Walk,
    java: Types,
    include_set: Option<GlobSet>,
    exclude_set: GlobSet,
    verbose: bool,
}

impl FileWalker {
    /// Creates a new FileWalker
    ///
    /// # Arguments
    /// * `root` - Root directory to walk
    /// * `include` - Include patterns (empty means include all)
    /// * `exclude` - Exclude patterns (applied after include)
    pub fn new(root: &Path, include: &[GlobPattern], exclude: &[GlobPattern]) -> Result<Self, FileWalkerError> {
        Self::with_verbose(root, include, exclude, false)
    }

    /// Creates a new FileWalker which, if `verbose`, also reports skipped
    /// paths
    pub fn with_verbose(
        root: &Path,
        include: &[GlobPattern],
        exclude: &[GlobPattern],
        verbose: bool,
    ) -> Result<Self, FileWalkerError> {
        let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();

        let mut types = TypesBuilder::new();
        types.add_defaults();
        types.select("java");
        let java = types.build().map_err(FileWalkerError::Types)?;

        let include_set = if include.is_empty() {
            None
        } else {
            Some(Self::build_globset(include)?)
        };

        // Always exclude .git and build output
        let mut exclude_patterns = Vec::from(exclude);
        exclude_patterns.push(GlobPattern::new("**/.git/**"));
        exclude_patterns.push(GlobPattern::new("**/target/**"));
        let exclude_set = Self::build_globset(&exclude_patterns)?;

        Ok(Self {
            walker,
            java,
            include_set,
            exclude_set,
            verbose,
        })
    }

    fn build_globset(patterns: &[GlobPattern]) -> Result<GlobSet, FileWalkerError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern.as_str()).map_err(|e| FileWalkerError::InvalidGlob {
                pattern: pattern.as_str().to_string(),
                source: e,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| FileWalkerError::InvalidGlob {
            pattern: "<globset>".to_string(),
            source: e,
        })
    }

    /// Walks the directory tree, yielding Java sources in walk order
    pub fn walk(self) -> impl Iterator<Item = Result<FileEntry, FileWalkerError>> {
        self.walk_with_skip_info().filter_map(|result| match result {
            Ok(WalkResult::File(file)) => Some(Ok(file)),
            Ok(WalkResult::Skipped { .. }) => None,
            Err(e) => Some(Err(e)),
        })
    }

    /// Walks the directory tree, also yielding skipped paths in verbose mode
    pub fn walk_with_skip_info(self) -> impl Iterator<Item = Result<WalkResult, FileWalkerError>> {
        let FileWalker {
            walker,
            java,
            include_set,
            exclude_set,
            verbose,
        } = self;

        walker.filter_map(move |result| {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => return Some(Err(FileWalkerError::Walk(e))),
            };
            let path = entry.path();
            let skip = |reason: SkipReason| {
                verbose.then(|| {
                    Ok(WalkResult::Skipped {
                        path: path.to_path_buf(),
                        reason,
                    })
                })
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return skip(SkipReason::NotAFile);
            }
            if include_set.as_ref().is_some_and(|set| !set.is_match(path)) || exclude_set.is_match(path) {
                return skip(SkipReason::ExcludedByPattern);
            }
            if !java.matched(path, false).is_whitelist() {
                return skip(SkipReason::NotJava);
            }
            Some(Ok(WalkResult::File(FileEntry {
                path: path.to_path_buf(),
            })))
        })
    }
}
