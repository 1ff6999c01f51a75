// Background request runner
//
// The UI thread never blocks on the network: each job runs on its own
// thread and its outcome comes back over a channel, drained once per frame.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::api::RankingApi;
use crate::browse::{self, FirmView};
use crate::controller::{Command, Completion};
use crate::error::Result;
use crate::firm::{CategoryFilter, Firm, FirmId};

pub type SharedApi = Arc<dyn RankingApi + Send + Sync>;

#[derive(Debug)]
pub enum Job {
    /// A vote-flow command from the controller
    Vote(Command),
    /// Firm list, tagged so only the newest answer is applied
    Firms(u64),
    Firm(FirmId),
}

#[derive(Debug)]
pub enum Outcome {
    Vote(Completion),
    Firms(u64, Result<Vec<Firm>>),
    Firm(FirmId, FirmView),
}

impl Job {
    pub fn run(self, api: &dyn RankingApi) -> Outcome {
        match self {
            Job::Vote(command) => Outcome::Vote(command.execute(api)),
            Job::Firms(seq) => Outcome::Firms(seq, browse::list_firms(api, &CategoryFilter::All)),
            Job::Firm(id) => Outcome::Firm(id, browse::load_firm(api, id)),
        }
    }
}

pub struct Dispatcher {
    api: SharedApi,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl Dispatcher {
    pub fn new(api: SharedApi) -> Self {
        let (tx, rx) = channel();
        Self { api, tx, rx }
    }

    pub fn dispatch(&self, job: Job) {
        debug!(?job, "Dispatching");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let outcome = job.run(api.as_ref());
            // Receiver gone means the UI is shutting down
            let _ = tx.send(outcome);
        });
    }

    /// Everything that finished since the last call
    pub fn drain(&self) -> Vec<Outcome> {
        self.rx.try_iter().collect()
    }

    /// Block until the next outcome arrives or `timeout` elapses
    pub fn wait(&self, timeout: Duration) -> Option<Outcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
