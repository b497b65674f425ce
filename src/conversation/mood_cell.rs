use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::mood::Mood;

struct Inner {
    tx: watch::Sender<Mood>,
    // Incremented at the start of every turn; a pending cool-down only
    // applies if no turn has started since it was scheduled
    turn: AtomicU64,
}

/// The mood currently shown by the mascot.
///
/// The conversation is the only writer. Readers observe it through
/// [`MoodCell::subscribe`].
pub(crate) struct MoodCell {
    inner: Arc<Inner>,
}

impl Default for MoodCell {
    fn default() -> Self {
        MoodCell::new()
    }
}

impl MoodCell {
    pub(crate) fn new() -> MoodCell {
        let (tx, _) = watch::channel(Mood::Idle);

        MoodCell {
            inner: Arc::new(Inner {
                tx,
                turn: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn get(&self) -> Mood {
        *self.inner.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Mood> {
        self.inner.tx.subscribe()
    }

    /// Sets the mood, returning true if it changed.
    pub(super) fn set(&self, mood: Mood) -> bool {
        Self::set_inner(&self.inner, mood)
    }

    fn set_inner(inner: &Inner, mood: Mood) -> bool {
        inner.tx.send_if_modified(|current| {
            if *current == mood {
                return false;
            }

            log::trace!("mood {} -> {}", current, mood);

            *current = mood;
            true
        })
    }

    pub(super) fn begin_turn(&self) {
        self.inner.turn.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets the mood to idle after `delay`, unless another turn starts first.
    pub(super) fn schedule_idle(&self, delay: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let turn = inner.turn.load(Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if inner.turn.load(Ordering::SeqCst) == turn {
                Self::set_inner(&inner, Mood::Idle);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_notifies_only_on_change() {
        let cell = MoodCell::new();
        let mut rx = cell.subscribe();

        assert_eq!(cell.get(), Mood::Idle);
        assert!(!cell.set(Mood::Idle));
        assert!(!rx.has_changed().unwrap());

        assert!(cell.set(Mood::Happy));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Mood::Happy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_after_delay() {
        let cell = MoodCell::new();
        cell.begin_turn();
        cell.set(Mood::Excited);

        cell.schedule_idle(Duration::from_secs(3)).await.unwrap();

        assert_eq!(cell.get(), Mood::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_turn_cancels_pending_idle() {
        let cell = MoodCell::new();
        cell.begin_turn();
        cell.set(Mood::Happy);

        let pending = cell.schedule_idle(Duration::from_secs(3));

        cell.begin_turn();
        cell.set(Mood::Thinking);

        pending.await.unwrap();

        assert_eq!(cell.get(), Mood::Thinking);
    }
}
