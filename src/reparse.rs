//! Background parsing with latest-request-wins semantics.
//!
//! Every request gets an id from a shared generation counter. The worker
//! skips requests that were superseded before it got to them, and the
//! consumer only hands back outcomes whose id is still the newest one.

use crate::events::EventSink;
use crate::loader::{self, Source};
use crate::parser::parse_text;
use crate::tree::Game;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub type RequestId = u64;

/// Monotonic request counter shared by the submitter and the worker.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Issue a new id; every earlier id becomes stale.
    pub fn next(&self) -> RequestId {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> RequestId {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.current() == id
    }
}

pub enum Request {
    /// Text already in memory.
    Text(String),
    /// Load (and decompress) a source before parsing.
    Load(Source),
}

#[derive(Debug)]
pub struct Outcome {
    pub id: RequestId,
    pub result: Result<Vec<Game>, String>,
}

pub struct Reparser {
    generation: Arc<Generation>,
    requests: Option<mpsc::Sender<(RequestId, Request)>>,
    outcomes: mpsc::Receiver<Outcome>,
    worker: Option<JoinHandle<()>>,
}

impl Reparser {
    pub fn spawn(sink: Arc<dyn EventSink>) -> Self {
        let generation = Arc::new(Generation::new());
        let (req_tx, req_rx) = mpsc::channel::<(RequestId, Request)>();
        let (out_tx, out_rx) = mpsc::channel::<Outcome>();

        let worker_generation = generation.clone();
        let worker = thread::spawn(move || {
            for (id, request) in req_rx {
                if !worker_generation.is_current(id) {
                    continue;
                }
                let result = run(request, &*sink);
                if out_tx.send(Outcome { id, result }).is_err() {
                    break;
                }
            }
        });

        Self {
            generation,
            requests: Some(req_tx),
            outcomes: out_rx,
            worker: Some(worker),
        }
    }

    /// Queue a request. Results of all earlier requests will be dropped.
    pub fn submit(&self, request: Request) -> RequestId {
        let id = self.generation.next();
        if let Some(tx) = &self.requests {
            let _ = tx.send((id, request));
        }
        id
    }

    /// Non-blocking: the newest outcome that is still current, if one arrived.
    pub fn try_recv(&self) -> Option<Outcome> {
        self.outcomes
            .try_iter()
            .filter(|outcome| self.generation.is_current(outcome.id))
            .last()
    }

    /// Block until the current request finishes or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<Outcome> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.outcomes.recv_timeout(remaining) {
                Ok(outcome) if self.generation.is_current(outcome.id) => return Some(outcome),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for Reparser {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(request: Request, sink: &dyn EventSink) -> Result<Vec<Game>, String> {
    match request {
        Request::Text(text) => Ok(parse_text(&text, sink)),
        Request::Load(source) => loader::load(&source, sink)
            .map(|text| parse_text(&text, sink))
            .map_err(|e| format!("{:#}", e)),
    }
}
