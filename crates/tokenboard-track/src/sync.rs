use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::warn;

use crate::boundary::RemoteAuthority;
use crate::tracker::TokenTracker;

/// Periodic pull-based reconciliation against the remote authority.
///
/// The fetch runs outside the tracker lock; only applying the result
/// takes it, so a slow network call never stalls the frame loop. The
/// authority implementation bounds each call with a timeout, which is
/// what keeps `shutdown` from waiting on a dead connection.
pub struct SyncWorker {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn spawn(
        tracker: Arc<Mutex<TokenTracker>>,
        remote: Arc<dyn RemoteAuthority>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop, stopped) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("tokenboard-sync".into())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match remote.list_all() {
                        Ok(list) => {
                            // A poisoned lock means the frame loop
                            // panicked; nothing left to reconcile into.
                            let Ok(mut tracker) = tracker.lock() else {
                                break;
                            };
                            tracker.reconcile(&list);
                        }
                        Err(err) => warn!("reconciliation fetch failed: {err}"),
                    },
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the loop and wait for it to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
