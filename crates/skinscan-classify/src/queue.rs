// skinscan-classify/src/queue.rs
use crate::{Classifier, ClassifyError, Result, Verdict};
use crossbeam_channel::{bounded, Receiver, Sender};
use image::DynamicImage;
use skinscan_model::ModelProvider;
use std::thread::JoinHandle;

// back‑pressure: requester → channel → worker
const DEPTH: usize = 4;

struct Job {
    image: DynamicImage,
    reply: Sender<Result<Verdict>>,
}

/// Handle to a request in flight.
pub struct Pending {
    rx: Receiver<Result<Verdict>>,
}

impl Pending {
    /// Block until the worker has classified the image.
    pub fn wait(self) -> Result<Verdict> {
        self.rx.recv().unwrap_or(Err(ClassifyError::QueueClosed))
    }
}

/// Serializes classification requests onto a single worker thread.
///
/// Requests may come from any number of threads; they are classified one at
/// a time in the order they entered the channel.
pub struct ClassifyQueue {
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ClassifyQueue {
    pub fn spawn<P>(classifier: Classifier<P>) -> Self
    where
        P: ModelProvider + Send + 'static,
    {
        let (tx, rx) = bounded::<Job>(DEPTH);

        let worker = std::thread::spawn(move || {
            while let Ok(job) = rx.recv() {
                let outcome = classifier.classify(&job.image);
                if job.reply.send(outcome).is_err() {
                    log::debug!("requester dropped before result was delivered");
                }
            }
            log::debug!("classify worker shutting down.");
        });

        Self { tx: Some(tx), worker: Some(worker) }
    }

    /// Enqueue an image; blocks while the queue is full.
    pub fn submit(&self, image: DynamicImage) -> Result<Pending> {
        let tx = self.tx.as_ref().ok_or(ClassifyError::QueueClosed)?;
        let (reply, rx) = bounded(1);
        tx.send(Job { image, reply }).map_err(|_| ClassifyError::QueueClosed)?;
        Ok(Pending { rx })
    }

    /// Submit and wait.
    pub fn classify(&self, image: DynamicImage) -> Result<Verdict> {
        self.submit(image)?.wait()
    }
}

impl ClassifyQueue {
    /// Close the channel and join the worker. `false` if the worker panicked.
    fn stop(&mut self) -> bool {
        // closing the channel ends the worker loop
        self.tx.take();
        match self.worker.take().map(JoinHandle::join) {
            Some(Err(panic)) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                log::error!("classify worker panicked: {reason}");
                false
            }
            _ => true,
        }
    }
}

impl Drop for ClassifyQueue {
    fn drop(&mut self) {
        self.stop();
    }
}
