use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::CohortBuilderError;

/// Where the query grammar document comes from.
///
/// Either re-read from disk on every request, or read once and held in memory.
#[derive(Debug, Clone)]
pub struct GrammarSource {
    path: PathBuf,
    preloaded: Option<Arc<str>>,
}

impl GrammarSource {
    pub fn per_request(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            preloaded: None,
        }
    }

    /// Re-read the file on every request, after checking at startup that it
    /// is a readable file.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CohortBuilderError> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            CohortBuilderError::Internal(format!("grammar {} is not readable: {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(CohortBuilderError::Internal(format!(
                "grammar {} is not a file",
                path.display()
            )));
        }
        info!(path = %path.display(), "Grammar will be read per request");
        Ok(Self::per_request(path))
    }

    pub async fn preload(path: impl Into<PathBuf>) -> Result<Self, CohortBuilderError> {
        let path = path.into();
        let text = read(&path).await?;
        info!(path = %path.display(), bytes = text.len(), "Grammar preloaded");
        Ok(Self {
            path,
            preloaded: Some(text),
        })
    }

    /// In-memory grammar with no backing file.
    pub fn fixed(text: impl Into<Arc<str>>) -> Self {
        Self {
            path: PathBuf::new(),
            preloaded: Some(text.into()),
        }
    }

    pub async fn load(&self) -> Result<Arc<str>, CohortBuilderError> {
        match self.preloaded {
            Some(ref text) => Ok(Arc::clone(text)),
            None => read(&self.path).await,
        }
    }
}

async fn read(path: &Path) -> Result<Arc<str>, CohortBuilderError> {
    debug!(path = %path.display(), "Reading grammar");
    tokio::fs::read_to_string(path)
        .await
        .map(Arc::from)
        .map_err(|e| {
            CohortBuilderError::Internal(format!(
                "failed to read grammar {}: {e}",
                path.display()
            ))
        })
}
