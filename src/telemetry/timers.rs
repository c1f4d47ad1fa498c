use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct PendingTimer {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct RegistryState {
    pending: HashMap<i64, PendingTimer>,
    next_generation: u64,
}

/// Delayed one-shot actions keyed by cook id.
///
/// A timer that fires removes itself and runs its action while holding the
/// registry lock. A concurrent `cancel` or `schedule` for any id therefore
/// either wins before the claim, and the action never runs, or waits until
/// the action has finished. Actions must not call back into the registry.
#[derive(Clone, Default)]
pub struct DisconnectTimerRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl DisconnectTimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `action` to run once after `delay`.
    ///
    /// A timer already pending for `cook_id` is cancelled in the same critical
    /// section. Returns `true` if one was replaced.
    pub async fn schedule<F>(&self, cook_id: i64, delay: Duration, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (generation, replaced) = {
            let mut state = self.inner.lock().await;
            let replaced = match state.pending.remove(&cook_id) {
                Some(previous) => {
                    previous.cancel.cancel();
                    true
                }
                None => false,
            };

            state.next_generation = state.next_generation.wrapping_add(1);
            let generation = state.next_generation;
            state.pending.insert(
                cook_id,
                PendingTimer {
                    generation,
                    cancel: cancel.clone(),
                },
            );
            (generation, replaced)
        };

        let registry = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let mut state = registry.lock().await;
            let claimed = matches!(
                state.pending.get(&cook_id),
                Some(pending) if pending.generation == generation
            );
            if !claimed {
                return;
            }
            state.pending.remove(&cook_id);

            action.await;
        });

        replaced
    }

    /// Returns `false` if nothing was pending for `cook_id`.
    pub async fn cancel(&self, cook_id: i64) -> bool {
        let mut state = self.inner.lock().await;
        match state.pending.remove(&cook_id) {
            Some(pending) => {
                pending.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn is_pending(&self, cook_id: i64) -> bool {
        self.inner.lock().await.pending.contains_key(&cook_id)
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}
