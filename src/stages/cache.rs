use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::config::BlurParameters;
use crate::foundation::core::Bitmap;
use crate::foundation::error::{TextBlurError, TextBlurResult};
use crate::stages::generator::StageGenerator;
use crate::stages::set::StageSet;

/// Identifies one stage-generation run. Tokens increase monotonically per cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationToken(pub u64);

/// Result of a background generation, tagged with the run that produced it.
pub(crate) struct GenerationResult {
    pub(crate) token: GenerationToken,
    pub(crate) stages: TextBlurResult<StageSet>,
}

struct InFlight {
    token: GenerationToken,
    rx: Receiver<GenerationResult>,
}

/// Holds the current [`StageSet`] and generates replacements off the foreground thread.
///
/// Background results are only accepted through [`StageCache::poll`] or [`StageCache::wait`] on
/// the owning thread, and only when their token matches the latest
/// [`StageCache::begin_generation`]. A result from a superseded run is dropped.
pub struct StageCache {
    pool: Arc<rayon::ThreadPool>,
    next_token: u64,
    current: GenerationToken,
    in_flight: Option<InFlight>,
    unblurred: Option<Bitmap>,
    stages: Option<Arc<StageSet>>,
    ready: bool,
}

impl StageCache {
    /// Create a cache with its own worker pool. `None` uses rayon's default thread count.
    pub fn new(worker_threads: Option<usize>) -> TextBlurResult<Self> {
        Ok(Self {
            pool: Arc::new(build_thread_pool(worker_threads)?),
            next_token: 1,
            current: GenerationToken(0),
            in_flight: None,
            unblurred: None,
            stages: None,
            ready: false,
        })
    }

    /// Drop the current stages and supersede any in-flight generation.
    pub fn invalidate(&mut self) {
        if let Some(f) = self.in_flight.take() {
            tracing::debug!(token = f.token.0, "superseding in-flight stage generation");
        }
        self.current = GenerationToken(self.next_token);
        self.next_token += 1;
        self.ready = false;
        self.stages = None;
        self.unblurred = None;
    }

    /// Invalidate and compute stage 0 only, leaving the blurred stages for a later
    /// [`StageCache::begin_generation`].
    pub fn prepare(
        &mut self,
        source: &Bitmap,
        generator: &StageGenerator,
    ) -> TextBlurResult<GenerationToken> {
        self.invalidate();
        self.unblurred = Some(generator.unblurred(source)?);
        Ok(self.current)
    }

    /// Invalidate, compute stage 0 synchronously, and start the blurred stages in the background.
    ///
    /// Returns the token of the new run. Stage 0 is available from [`StageCache::unblurred`]
    /// immediately; the full set becomes available once a poll accepts the result.
    pub fn begin_generation(
        &mut self,
        source: Bitmap,
        params: BlurParameters,
        generator: StageGenerator,
    ) -> TextBlurResult<GenerationToken> {
        self.invalidate();
        params.validate()?;
        let token = self.current;

        let unblurred = generator.unblurred(&source)?;
        self.unblurred = Some(unblurred.clone());

        let (tx, rx) = crossbeam_channel::bounded(1);
        self.in_flight = Some(InFlight { token, rx });
        tracing::debug!(
            token = token.0,
            stages = params.number_of_stages,
            radius = params.blur_radius,
            "starting stage generation"
        );
        self.pool.spawn(move || {
            let stages = generator.generate_from(&source, &params, unblurred);
            // The receiver is gone when the run was superseded.
            let _ = tx.send(GenerationResult { token, stages });
        });
        Ok(token)
    }

    /// `true` once the full stage set for the current content is available.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// `true` while a background run for the current token has not been accepted yet.
    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Token of the latest run.
    pub fn token(&self) -> GenerationToken {
        self.current
    }

    /// The current stage set, only when ready.
    pub fn stages(&self) -> Option<&Arc<StageSet>> {
        if self.ready { self.stages.as_ref() } else { None }
    }

    /// Stage 0 of the current content, available as soon as generation began.
    pub fn unblurred(&self) -> Option<&Bitmap> {
        self.unblurred.as_ref()
    }

    /// Accept a finished background run without blocking.
    ///
    /// Returns `Ok(Some(token))` when this call made the cache ready.
    pub fn poll(&mut self) -> TextBlurResult<Option<GenerationToken>> {
        let Some(f) = self.in_flight.as_ref() else {
            return Ok(None);
        };
        match f.rx.try_recv() {
            Ok(result) => self.accept(result),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                Err(TextBlurError::blur("stage generation worker exited without a result"))
            }
        }
    }

    /// Block until the in-flight run finishes, then accept it.
    pub fn wait(&mut self) -> TextBlurResult<Option<GenerationToken>> {
        let Some(f) = self.in_flight.as_ref() else {
            return Ok(None);
        };
        match f.rx.recv() {
            Ok(result) => self.accept(result),
            Err(_) => {
                self.in_flight = None;
                Err(TextBlurError::blur("stage generation worker exited without a result"))
            }
        }
    }

    pub(crate) fn accept(
        &mut self,
        result: GenerationResult,
    ) -> TextBlurResult<Option<GenerationToken>> {
        if result.token != self.current {
            tracing::debug!(
                stale = result.token.0,
                current = self.current.0,
                "discarding stale stage generation"
            );
            return Ok(None);
        }
        self.in_flight = None;
        match result.stages {
            Ok(stages) => {
                tracing::debug!(token = result.token.0, len = stages.len(), "stages ready");
                self.stages = Some(Arc::new(stages));
                self.ready = true;
                Ok(Some(result.token))
            }
            Err(e) => {
                tracing::error!(token = result.token.0, error = %e, "stage generation failed");
                Err(e)
            }
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> TextBlurResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TextBlurError::validation(
            "worker_threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("textblur-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        TextBlurError::Other(anyhow::Error::new(e).context("failed to build rayon thread pool"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/stages/cache.rs"]
mod tests;
