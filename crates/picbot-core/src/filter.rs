use std::sync::Arc;

use regex::Regex;
use tokio::sync::RwLock;

use crate::{errors::Error, Result};

/// An immutable, fully compiled set of subject patterns.
#[derive(Debug)]
pub struct SubjectFilter {
    patterns: Vec<Regex>,
}

impl SubjectFilter {
    /// Compiles every pattern or fails the whole set. An empty set is a
    /// configuration error, not a match-nothing filter.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::Config("filter pattern set is empty".to_string()));
        }

        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let rx = Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid filter pattern {pattern:?}: {e}")))?;
            compiled.push(rx);
        }

        Ok(Self { patterns: compiled })
    }

    pub fn any_matches(&self, subject: &str) -> bool {
        self.patterns.iter().any(|rx| rx.is_match(subject))
    }
}

/// Shared handle to the current filter set.
///
/// Readers always see a complete set; the refresh loop replaces the inner
/// `Arc` wholesale after a successful compile, never a partial mix.
#[derive(Clone)]
pub struct SharedFilter {
    inner: Arc<RwLock<Arc<SubjectFilter>>>,
}

impl SharedFilter {
    pub fn new(filter: SubjectFilter) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(filter))),
        }
    }

    pub async fn current(&self) -> Arc<SubjectFilter> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, filter: SubjectFilter) {
        *self.inner.write().await = Arc::new(filter);
    }
}
