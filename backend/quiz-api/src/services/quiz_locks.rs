use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per quiz id. Read-modify-write cycles on the same quiz
/// run one after another; different quizzes never wait on each other.
#[derive(Default)]
pub struct QuizLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl QuizLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, quiz_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody holds or waits for.
            locks.retain(|id, lock| *id == quiz_id || Arc::strong_count(lock) > 1);
            locks
                .entry(quiz_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
