//! The staged-callback primitive shared by every resource handle (§3, §4.H,
//! §8 property 4): a handle's `Exec()` runs its staged callback at most
//! once, safely under concurrent calls, and is a no-op for handles that
//! were never staged in the first place.

use std::sync::Mutex;

use crate::error::Result;
use crate::future::BoxFuture;

type Op = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

pub(crate) struct StagedExec {
    op: Mutex<Option<Op>>,
}

impl StagedExec {
    /// A handle with nothing deferred — `exec` is always a no-op.
    pub fn none() -> Self {
        StagedExec { op: Mutex::new(None) }
    }

    /// A handle whose `exec` performs `op` exactly once.
    pub fn staged(op: impl FnOnce() -> BoxFuture<'static, Result<()>> + Send + 'static) -> Self {
        StagedExec {
            op: Mutex::new(Some(Box::new(op))),
        }
    }

    /// Take and run the callback if it hasn't run yet. The `take()` happens
    /// under the lock, so of any number of concurrent callers exactly one
    /// observes `Some` and runs the callback; every other caller — whether
    /// racing the first or arriving after — gets the no-op `Ok(())`.
    pub async fn exec(&self) -> Result<()> {
        let taken = { self.op.lock().unwrap().take() };
        match taken {
            Some(op) => op().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn staged_callback_runs_at_most_once_under_concurrency() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_for_op = count.clone();
        let staged = Arc::new(StagedExec::staged(move || {
            Box::pin(async move {
                count_for_op.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let staged = staged.clone();
            tasks.push(tokio::spawn(async move { staged.exec().await }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn none_is_always_a_no_op() {
        let staged = StagedExec::none();
        staged.exec().await.unwrap();
        staged.exec().await.unwrap();
    }
}
