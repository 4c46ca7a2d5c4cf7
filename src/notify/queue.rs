use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::dispatcher::{ChangeKind, NotificationDispatcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub course_id: String,
    pub kind: ChangeKind,
    pub changed_id: String,
}

/// Producer side of the notification queue. Enqueueing never blocks the
/// caller; a full or closed queue drops the job with a warning.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, job: NotificationJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(course = %job.course_id, "notification queue full, dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(course = %job.course_id, "notification worker stopped, dropping job");
                false
            }
        }
    }
}

/// Runs jobs one at a time until every producer is dropped.
pub fn spawn_worker(
    mut rx: mpsc::Receiver<NotificationJob>,
    dispatcher: Arc<NotificationDispatcher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            if let Err(e) = dispatcher
                .notify_course_update(&job.course_id, job.kind, &job.changed_id)
                .await
            {
                tracing::error!(course = %job.course_id, "notification job failed: {e}");
            }
        }
        tracing::debug!("notification worker exiting");
    })
}
