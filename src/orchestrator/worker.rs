use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::detect::{FaceObservation, SharedDetector};
use crate::frame::SourceImage;
use crate::overlay::Generation;

pub(crate) struct Job {
    pub generation: Generation,
    pub image: Arc<SourceImage>,
}

enum Message {
    Detect(Job),
    Terminate,
}

/// Result of one detection job, produced on the worker thread.
pub(crate) struct Completion {
    pub generation: Generation,
    pub outcome: Result<Vec<FaceObservation>>,
}

/// Background thread that owns detector calls.
///
/// Jobs go in over one channel and completions come back over another; the
/// worker never touches overlay state.
pub(crate) struct DetectionWorker {
    sender: mpsc::Sender<Message>,
    completions: mpsc::Receiver<Completion>,
    thread: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    pub fn spawn(detector: SharedDetector) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let (complete_sender, completions) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("face-detect".to_string())
            .spawn(move || run_worker(detector, receiver, complete_sender))
            .context("failed to spawn face detection worker")?;
        Ok(Self {
            sender,
            completions,
            thread: Some(thread),
        })
    }

    pub fn submit(&self, job: Job) -> Result<()> {
        self.sender
            .send(Message::Detect(job))
            .map_err(|_| anyhow!("face detection worker is not running"))
    }

    /// Next completion if one is ready.
    pub fn try_next(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Completion>> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Ok(Some(completion)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(anyhow!("face detection worker stopped"))
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Terminate);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("face detection worker panicked");
            }
        }
        log::debug!("face detection worker shut down");
    }
}

fn run_worker(
    detector: SharedDetector,
    receiver: mpsc::Receiver<Message>,
    complete_sender: mpsc::Sender<Completion>,
) {
    if let Ok(mut guard) = detector.lock() {
        if let Err(err) = guard.warm_up() {
            log::warn!("{} backend warm-up failed: {:#}", guard.name(), err);
        }
    }
    while let Ok(message) = receiver.recv() {
        let job = match message {
            Message::Detect(job) => job,
            Message::Terminate => break,
        };
        let outcome = detect_once(&detector, &job.image);
        let completion = Completion {
            generation: job.generation,
            outcome,
        };
        if complete_sender.send(completion).is_err() {
            break;
        }
    }
}

fn detect_once(detector: &SharedDetector, image: &SourceImage) -> Result<Vec<FaceObservation>> {
    let mut guard = detector
        .lock()
        .map_err(|_| anyhow!("detector lock poisoned"))?;
    let name = guard.name();
    // A panicking backend is reported like any other detector failure.
    panic::catch_unwind(AssertUnwindSafe(|| guard.detect(image)))
        .unwrap_or_else(|_| Err(anyhow!("{} backend panicked", name)))
        .with_context(|| format!("{} backend failed", name))
}
