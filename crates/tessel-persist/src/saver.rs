// Background writer: layout saves are handed off to a worker thread so a
// mutation never waits on disk.

use std::sync::mpsc;
use std::thread;

use tessel_core::LayoutSnapshot;

use crate::PersistenceBridge;

enum Command {
    Save(LayoutSnapshot),
    Flush(mpsc::Sender<()>),
    Load(mpsc::Sender<Option<LayoutSnapshot>>),
}

pub struct LayoutSaver {
    tx: Option<mpsc::Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl LayoutSaver {
    pub fn spawn(bridge: PersistenceBridge) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("tessel-layout-saver".to_string())
            .spawn(move || run(bridge, rx))?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue a snapshot for writing and return immediately.
    pub fn save(&self, snapshot: LayoutSnapshot) {
        self.send(Command::Save(snapshot));
    }

    /// Block until every save queued so far has been written.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.send(Command::Flush(ack_tx)) {
            let _ = ack_rx.recv();
        }
    }

    /// Load the stored snapshot, after any saves already queued.
    pub fn load(&self) -> Option<LayoutSnapshot> {
        let (reply_tx, reply_rx) = mpsc::channel();
        if !self.send(Command::Load(reply_tx)) {
            return None;
        }
        reply_rx.recv().ok().flatten()
    }

    fn send(&self, command: Command) -> bool {
        let sent = match &self.tx {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        };
        if !sent {
            log::warn!("Layout saver is not running; request dropped");
        }
        sent
    }
}

impl Drop for LayoutSaver {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain its queue and exit.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Layout saver thread panicked");
            }
        }
    }
}

fn run(bridge: PersistenceBridge, rx: mpsc::Receiver<Command>) {
    while let Ok(first) = rx.recv() {
        let mut batch = std::iter::once(first).chain(rx.try_iter()).peekable();
        while let Some(command) = batch.next() {
            match command {
                Command::Save(snapshot) => {
                    // Each save carries the full layout, so a newer one
                    // queued right behind makes this one redundant.
                    if matches!(batch.peek(), Some(Command::Save(_))) {
                        log::trace!("coalesced layout save");
                        continue;
                    }
                    bridge.save(&snapshot);
                }
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
                Command::Load(reply) => {
                    let _ = reply.send(bridge.load());
                }
            }
        }
    }
    log::debug!("layout saver exiting");
}
