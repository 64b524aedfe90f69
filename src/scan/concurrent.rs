//! Concurrent extraction.
//!
//! File reads run on the blocking pool and finish in any order; results are
//! folded back in candidate order so the accumulated state matches
//! [`Scanner::scan`] exactly.

use crate::error::{ExtractError, ScanError};
use crate::scan::{ScanOutcome, Scanner, SkippedFile};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

type Extraction<T> = (usize, PathBuf, Result<Option<T>, ExtractError>);

impl Scanner {
    /// Like [`Scanner::scan`], with up to `max_in_flight` extractions running
    /// at once.
    #[instrument(skip(self, roots, extract, accumulate, initial))]
    pub async fn scan_concurrent<P, T, S, E, A>(
        &self,
        roots: &[P],
        extract: E,
        mut accumulate: A,
        initial: S,
        max_in_flight: usize,
    ) -> Result<ScanOutcome<S>, ScanError>
    where
        P: AsRef<Path>,
        T: Send + 'static,
        E: Fn(&Path) -> Result<Option<T>, ExtractError> + Send + Sync + 'static,
        A: FnMut(S, &Path, T) -> S,
    {
        let start = Instant::now();
        let candidates = self.candidates(roots)?;
        let mut complete = candidates.complete;
        let max_in_flight = max_in_flight.max(1);
        let extract = Arc::new(extract);

        let mut pending = candidates.files.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut finished: Vec<Extraction<T>> = Vec::new();

        loop {
            while in_flight.len() < max_in_flight {
                if self.cancelled() {
                    complete = false;
                    break;
                }
                let Some((index, path)) = pending.next() else {
                    break;
                };
                let extract = Arc::clone(&extract);
                in_flight.push(tokio::task::spawn_blocking(move || {
                    let result = extract(&path);
                    (index, path, result)
                }));
            }

            match in_flight.next().await {
                Some(joined) => {
                    finished.push(joined.map_err(|e| ScanError::Join(e.to_string()))?)
                }
                None => break,
            }
        }

        if pending.next().is_some() {
            complete = false;
        }

        finished.sort_by_key(|(index, _, _)| *index);
        let visited = finished.len();
        let mut state = initial;
        let mut skipped = Vec::new();
        for (_, path, result) in finished {
            match result {
                Ok(Some(value)) => state = accumulate(state, &path, value),
                Ok(None) => debug!(path = %path.display(), "No declaration"),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping file");
                    skipped.push(SkippedFile::from_error(&path, &e));
                }
            }
        }

        info!(
            visited,
            skipped = skipped.len(),
            complete,
            duration_ms = start.elapsed().as_millis(),
            "Concurrent scan finished"
        );

        Ok(ScanOutcome {
            state,
            skipped,
            visited,
            complete,
        })
    }
}
