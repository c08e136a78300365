use std::path::{Path, PathBuf};

use collector_logging::{collector_debug, collector_warn};
use thiserror::Error;

use crate::{ResolvedScript, RunnerError, ScriptSource};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("none of {} candidate script paths exist", .attempted.len())]
    NotFound { attempted: Vec<PathBuf> },
}

impl From<ResolveError> for RunnerError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { attempted } => RunnerError::ScriptNotFound { attempted },
        }
    }
}

/// Find the worker script on disk: `primary` first, then each fallback in order.
pub fn resolve_script(primary: &Path, fallbacks: &[PathBuf]) -> Result<ResolvedScript, ResolveError> {
    resolve_with(primary, fallbacks, path_exists)
}

/// First-match-wins resolution against an arbitrary existence probe.
/// Probing stops at the first candidate for which `exists` returns true.
pub fn resolve_with<F>(
    primary: &Path,
    fallbacks: &[PathBuf],
    mut exists: F,
) -> Result<ResolvedScript, ResolveError>
where
    F: FnMut(&Path) -> bool,
{
    if exists(primary) {
        return Ok(ResolvedScript {
            path: primary.to_path_buf(),
            source: ScriptSource::Primary,
        });
    }
    collector_debug!("Primary worker script missing: {:?}", primary);

    for (index, candidate) in fallbacks.iter().enumerate() {
        if exists(candidate) {
            return Ok(ResolvedScript {
                path: candidate.clone(),
                source: ScriptSource::Fallback(index),
            });
        }
        collector_debug!("Fallback worker script #{} missing: {:?}", index, candidate);
    }

    let mut attempted = Vec::with_capacity(fallbacks.len() + 1);
    attempted.push(primary.to_path_buf());
    attempted.extend(fallbacks.iter().cloned());
    Err(ResolveError::NotFound { attempted })
}

fn path_exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(found) => found,
        Err(err) => {
            collector_warn!("Cannot probe {:?}: {}", path, err);
            false
        }
    }
}
