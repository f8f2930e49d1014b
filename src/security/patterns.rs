//! Forbidden-path pattern set.
//!
//! Patterns are compiled once when the filter is built and never mutated
//! afterwards, so request handlers read them without synchronization.
//!
//! Matching uses search semantics: a pattern matches if it matches anywhere
//! in the URI. Authors anchor explicitly with `^` / `$` when they need to.

use crate::error::ConfigurationError;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Upper bound on the compiled size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// One compiled pattern together with the text it was built from.
#[derive(Debug, Clone)]
struct CompiledPattern {
    source: Arc<str>,
    regex: Regex,
}

/// Immutable, ordered collection of compiled URI patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile every pattern, failing on the first invalid one.
    ///
    /// No partial set is produced: the error names the offending pattern.
    pub fn compile<I, S>(patterns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile_one(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// True iff any pattern matches `uri`.
    #[inline]
    pub fn matches(&self, uri: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(uri))
    }

    /// The first pattern (in list order) that matches `uri`.
    pub fn first_match(&self, uri: &str) -> Option<&Arc<str>> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(uri))
            .map(|p| &p.source)
    }

    /// Pattern sources in list order.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.patterns.iter().map(|p| p.source.as_ref())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile_one(pattern: &str) -> Result<CompiledPattern, ConfigurationError> {
    let regex = RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|source| ConfigurationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

    Ok(CompiledPattern {
        source: Arc::from(pattern),
        regex,
    })
}
