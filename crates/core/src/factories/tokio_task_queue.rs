//! A task queue running categorized work on the tokio runtime.

use peerset_api::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A production-ready task queue factory backed by the tokio runtime.
///
/// Submitted work is spawned onto the ambient runtime. The per-category
/// pending count covers work that has been submitted but has not yet
/// finished running, which is the depth acquisition engines use for
/// load shedding.
#[derive(Debug)]
pub struct TokioTaskQueueFactory {}

impl TokioTaskQueueFactory {
    /// Construct a new TokioTaskQueueFactory.
    pub fn create() -> DynTaskQueueFactory {
        let out: DynTaskQueueFactory = Arc::new(Self {});
        out
    }
}

impl TaskQueueFactory for TokioTaskQueueFactory {
    fn default_config(&self, _config: &mut config::Config) -> PsResult<()> {
        Ok(())
    }

    fn validate_config(&self, _config: &config::Config) -> PsResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PsResult<DynTaskQueue>> {
        Box::pin(async move {
            let out: DynTaskQueue = Arc::new(TokioTaskQueue::default());
            Ok(out)
        })
    }
}

#[derive(Debug, Default)]
struct TokioTaskQueue {
    pending: [Arc<AtomicUsize>; 2],
}

impl TokioTaskQueue {
    fn counter(&self, category: TaskCategory) -> &Arc<AtomicUsize> {
        match category {
            TaskCategory::LedgerData => &self.pending[0],
            TaskCategory::TxData => &self.pending[1],
        }
    }
}

impl TaskQueue for TokioTaskQueue {
    fn submit(
        &self,
        category: TaskCategory,
        name: &str,
        task: Task,
    ) -> PsResult<()> {
        let handle = tokio::runtime::Handle::try_current().map_err(|err| {
            PsError::other_src("cannot submit task without a tokio runtime", err)
        })?;

        let pending = self.counter(category).clone();
        pending.fetch_add(1, Ordering::SeqCst);

        let name = name.to_string();
        handle.spawn(async move {
            tracing::trace!("running {category} task {name}");
            task.await;
            pending.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(())
    }

    fn pending_count(&self, category: TaskCategory) -> usize {
        self.counter(category).load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use peerset_test_utils::iter_check;

    #[tokio::test(flavor = "multi_thread")]
    async fn pending_count_tracks_unfinished_work() {
        let queue = TokioTaskQueue::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        queue
            .submit(
                TaskCategory::LedgerData,
                "blocked",
                Box::pin(async move {
                    let _ = rx.await;
                }),
            )
            .unwrap();

        assert_eq!(1, queue.pending_count(TaskCategory::LedgerData));
        // categories are accounted independently
        assert_eq!(0, queue.pending_count(TaskCategory::TxData));

        tx.send(()).unwrap();

        iter_check!({
            if queue.pending_count(TaskCategory::LedgerData) == 0 {
                break;
            }
        });
    }

    #[tokio::test]
    async fn submitted_work_runs() {
        let queue = TokioTaskQueue::default();
        let (tx, rx) = tokio::sync::oneshot::channel();

        queue
            .submit(
                TaskCategory::TxData,
                "ping",
                Box::pin(async move {
                    let _ = tx.send(42_u32);
                }),
            )
            .unwrap();

        assert_eq!(42, rx.await.unwrap());
    }
}
