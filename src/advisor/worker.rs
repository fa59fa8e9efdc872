//! Background advisor worker
//!
//! Runs one request at a time on its own thread so the game loop never blocks
//! on the network. The result comes back over a channel and is collected with
//! [`AdvisorWorker::poll`].

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use super::fallback::local_hint;
use super::{AdvisorClient, AdvisorRequest, FallbackReason, StrategicHint};
use crate::sim::TargetCandidate;

struct InFlight {
    rx: Receiver<StrategicHint>,
    /// Kept so a dead worker thread still yields a hint
    candidates: Vec<TargetCandidate>,
}

pub struct AdvisorWorker {
    client: Arc<AdvisorClient>,
    in_flight: Option<InFlight>,
}

impl AdvisorWorker {
    pub fn new(client: AdvisorClient) -> Self {
        Self {
            client: Arc::new(client),
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a request. Returns false while another one is in flight.
    pub fn submit(&mut self, request: AdvisorRequest) -> bool {
        if self.in_flight.is_some() {
            log::debug!("Advisor busy, dropping request");
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let candidates = request.candidates.clone();
        let client = Arc::clone(&self.client);
        let spawned = thread::Builder::new()
            .name("advisor".to_string())
            .spawn(move || {
                let hint = client.advise(&request);
                let _ = tx.send(hint);
            });

        if let Err(err) = spawned {
            log::error!("Advisor thread spawn failed: {err}");
            let (tx, rx) = mpsc::channel();
            let _ = tx.send(local_hint(&candidates, FallbackReason::TransportFailed));
            self.in_flight = Some(InFlight { rx, candidates });
            return true;
        }

        self.in_flight = Some(InFlight { rx, candidates });
        true
    }

    /// Non-blocking check for a finished request
    pub fn poll(&mut self) -> Option<StrategicHint> {
        let in_flight = self.in_flight.as_ref()?;
        match in_flight.rx.try_recv() {
            Ok(hint) => {
                self.in_flight = None;
                Some(hint)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.recover(),
        }
    }

    /// Block until the in-flight request finishes or the timeout passes
    pub fn wait(&mut self, timeout: Duration) -> Option<StrategicHint> {
        let in_flight = self.in_flight.as_ref()?;
        match in_flight.rx.recv_timeout(timeout) {
            Ok(hint) => {
                self.in_flight = None;
                Some(hint)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => self.recover(),
        }
    }

    fn recover(&mut self) -> Option<StrategicHint> {
        let in_flight = self.in_flight.take()?;
        log::error!("Advisor thread exited without a reply");
        Some(local_hint(
            &in_flight.candidates,
            FallbackReason::TransportFailed,
        ))
    }
}
