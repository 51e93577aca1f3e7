//! Background shape loading.
//!
//! Decoding an image can take longer than a frame, so [`ShapeLoader`] runs
//! each request on its own thread and hands results back over a channel. The
//! frame loop calls [`ShapeLoader::poll`] once per frame; it never blocks.
//!
//! Requests that stay outstanding longer than the configured timeout are
//! reported as [`SampleError::Timeout`] and forgotten. If the decode finishes
//! afterwards its result is discarded. Only the most recent abandoned
//! requests are remembered; a result older than that comes back as an
//! ordinary result and is left to the stale policy.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::error::SampleError;
use crate::morph::Generation;
use crate::sampler::{ImageSampler, PointCloud};

/// A finished (or abandoned) shape request.
#[derive(Debug)]
pub struct SampleResult {
    pub generation: Generation,
    pub path: PathBuf,
    pub result: Result<PointCloud, SampleError>,
}

#[derive(Debug)]
struct Pending {
    generation: Generation,
    path: PathBuf,
    issued_at: Duration,
}

/// Abandoned generations remembered for discarding late results.
const MAX_ABANDONED: usize = 64;

type DecodeFn = Arc<dyn Fn(&Path) -> Result<PointCloud, SampleError> + Send + Sync>;

/// Runs image sampling off the frame loop.
pub struct ShapeLoader {
    decode: DecodeFn,
    timeout: Duration,
    sender: Sender<SampleResult>,
    receiver: Receiver<SampleResult>,
    pending: Vec<Pending>,
    abandoned: BTreeSet<Generation>,
}

impl fmt::Debug for ShapeLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeLoader")
            .field("timeout", &self.timeout)
            .field("pending", &self.pending)
            .field("abandoned", &self.abandoned)
            .finish_non_exhaustive()
    }
}

impl ShapeLoader {
    pub fn new(sampler: ImageSampler, timeout: Duration) -> Self {
        Self::with_decoder(timeout, move |path| sampler.sample_file(path))
    }

    /// Loader that turns paths into clouds with `decode` instead of an
    /// [`ImageSampler`].
    pub(crate) fn with_decoder<F>(timeout: Duration, decode: F) -> Self
    where
        F: Fn(&Path) -> Result<PointCloud, SampleError> + Send + Sync + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            decode: Arc::new(decode),
            timeout,
            sender,
            receiver,
            pending: Vec::new(),
            abandoned: BTreeSet::new(),
        }
    }

    /// Start decoding `path` for request `generation`.
    pub fn request<P: AsRef<Path>>(
        &mut self,
        generation: Generation,
        path: P,
        now: Duration,
    ) -> Result<(), SampleError> {
        let path = path.as_ref().to_path_buf();
        let decode = Arc::clone(&self.decode);
        let sender = self.sender.clone();
        let thread_path = path.clone();

        std::thread::Builder::new()
            .name(format!("pmorph-decode-{}", generation.0))
            .spawn(move || {
                let result = decode(&thread_path);
                // The loader may already be gone; nothing left to deliver to.
                let _ = sender.send(SampleResult {
                    generation,
                    path: thread_path,
                    result,
                });
            })
            .map_err(SampleError::Spawn)?;

        log::debug!("requested shape {} as {:?}", path.display(), generation);
        self.pending.push(Pending {
            generation,
            path,
            issued_at: now,
        });
        Ok(())
    }

    /// Collect every result that is ready, plus timeouts for stalled requests.
    pub fn poll(&mut self, now: Duration) -> Vec<SampleResult> {
        let mut ready = Vec::new();

        for done in self.receiver.try_iter() {
            if self.abandoned.remove(&done.generation) {
                log::debug!(
                    "late result for abandoned {:?} ({}) discarded",
                    done.generation,
                    done.path.display()
                );
                continue;
            }
            self.pending.retain(|p| p.generation != done.generation);
            ready.push(done);
        }

        let timeout = self.timeout;
        let (stalled, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| now.saturating_sub(p.issued_at) > timeout);
        self.pending = waiting;

        for p in stalled {
            log::warn!(
                "shape {} did not decode within {:?}; keeping previous target",
                p.path.display(),
                timeout
            );
            self.abandoned.insert(p.generation);
            if self.abandoned.len() > MAX_ABANDONED {
                self.abandoned.pop_first();
            }
            ready.push(SampleResult {
                generation: p.generation,
                result: Err(SampleError::Timeout {
                    path: p.path.clone(),
                    timeout,
                }),
                path: p.path,
            });
        }

        ready
    }

    /// Number of requests still in flight.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
