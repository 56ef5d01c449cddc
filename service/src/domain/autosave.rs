use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a save attempt reports back to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    Saved,
    /// not eligible right now (clean form, empty title, publishing)
    Skipped,
    /// another save holds the record, try again next cycle
    Busy,
    /// the save failed, try again next cycle
    Failed,
    /// the editor is gone, stop the timer
    Closed,
}

/// Debounced background save.
///
/// Every [`AutosaveTimer::touch`] restarts the delay; `save` runs once the
/// form has been quiet for the whole delay. Busy and failed attempts are
/// retried after another delay without waiting for a new change.
#[derive(Debug)]
pub struct AutosaveTimer {
    changes: watch::Sender<u64>,
    task: JoinHandle<()>,
}

impl AutosaveTimer {
    pub fn spawn<F, Fut>(delay: Duration, mut save: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = AutosaveOutcome> + Send + 'static,
    {
        let (changes, mut receiver) = watch::channel(0u64);

        let task = tokio::spawn(async move {
            let mut retry = false;
            loop {
                if !retry && receiver.changed().await.is_err() {
                    break;
                }

                // quiet period, restarted by every change
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => break,
                        changed = receiver.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }

                retry = match save().await {
                    AutosaveOutcome::Saved | AutosaveOutcome::Skipped => false,
                    AutosaveOutcome::Busy | AutosaveOutcome::Failed => true,
                    AutosaveOutcome::Closed => break,
                };
            }
            tracing::debug!("autosave timer stopped");
        });

        Self { changes, task }
    }

    /// Signals a change to the form.
    pub fn touch(&self) {
        self.changes.send_modify(|counter| *counter = counter.wrapping_add(1));
    }
}

impl Drop for AutosaveTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
