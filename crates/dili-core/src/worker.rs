//! Background classification behind a message channel.
//!
//! The worker thread owns the toxicity reference and runs
//! [`classify`](crate::classifier::classify) for each request, so callers
//! on another thread get the same result as an in-process call.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::debug;

use dili_model::{ClassificationResult, DrugEntry, ToxicityReference};

use crate::classifier::{ClassifierOptions, classify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    pub request_id: u64,
    pub entries: Vec<DrugEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyResponse {
    pub request_id: u64,
    pub result: ClassificationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    #[error("classification worker has stopped")]
    Disconnected,
}

/// Handle to a running classification thread.
///
/// Dropping the handle closes the request channel; the thread exits after
/// draining what was already submitted.
pub struct ClassificationWorker {
    requests: Option<Sender<ClassifyRequest>>,
    responses: Receiver<ClassifyResponse>,
    handle: Option<JoinHandle<()>>,
}

impl ClassificationWorker {
    pub fn spawn(reference: ToxicityReference, options: ClassifierOptions) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ClassifyRequest>();
        let (response_tx, response_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            for request in request_rx {
                debug!(request_id = request.request_id, "classification request");
                let result = classify(&request.entries, &reference, &options);
                let response = ClassifyResponse {
                    request_id: request.request_id,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
        });
        Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, request: ClassifyRequest) -> Result<(), WorkerError> {
        self.requests
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(request)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Blocks until the next response arrives.
    pub fn recv(&self) -> Result<ClassifyResponse, WorkerError> {
        self.responses.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Non-blocking receive.
    pub fn try_recv(&self) -> Option<ClassifyResponse> {
        self.responses.try_recv().ok()
    }

    /// Closes the request channel and waits for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ClassificationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dili_model::ConceptId;

    #[test]
    fn worker_matches_in_process_classification() {
        let reference =
            ToxicityReference::from_pairs([(ConceptId::from(1), Some("acetaminophen"))]);
        let entries = vec![
            DrugEntry::from_id(ConceptId::from(1)),
            DrugEntry::from_id(ConceptId::from(2)),
        ];
        let expected = classify(&entries, &reference, &ClassifierOptions::default());

        let worker = ClassificationWorker::spawn(reference, ClassifierOptions::default());
        worker
            .submit(ClassifyRequest {
                request_id: 7,
                entries,
            })
            .expect("submit");
        let response = worker.recv().expect("response");
        assert_eq!(response.request_id, 7);
        assert_eq!(response.result, expected);
        worker.shutdown();
    }
}
