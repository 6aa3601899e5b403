//! Background snapshot writer.
//!
//! Campaign mutations enqueue saves and deletes while the slot lock is held,
//! so the queue order matches the mutation order. A single task drains the
//! queue and runs each store call on the blocking pool; no store I/O happens
//! under a slot lock or on a runtime worker.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use super::store::SnapshotStore;
use crate::campaign::Campaign;

enum SnapshotOp {
    Save(Box<Campaign>),
    Delete(String),
    Flush(oneshot::Sender<()>),
}

pub(crate) struct SnapshotWriter {
    tx: mpsc::UnboundedSender<SnapshotOp>,
}

impl SnapshotWriter {
    /// Start the drain task. Must be called inside a tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    SnapshotOp::Save(campaign) => {
                        let store = Arc::clone(&store);
                        let id = campaign.id.clone();
                        let result = tokio::task::spawn_blocking(move || store.save(&campaign)).await;
                        match result {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                error!(campaign_id = %id, error = %e, "Failed to persist campaign snapshot")
                            }
                            Err(e) => error!(campaign_id = %id, error = %e, "Snapshot save task panicked"),
                        }
                    }
                    SnapshotOp::Delete(id) => {
                        let store = Arc::clone(&store);
                        let target = id.clone();
                        let result = tokio::task::spawn_blocking(move || store.delete(&target)).await;
                        match result {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                warn!(campaign_id = %id, error = %e, "Failed to delete campaign snapshot")
                            }
                            Err(e) => error!(campaign_id = %id, error = %e, "Snapshot delete task panicked"),
                        }
                    }
                    SnapshotOp::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    /// Queue a save of the campaign as it is now.
    pub(crate) fn save(&self, campaign: &Campaign) {
        if self.tx.send(SnapshotOp::Save(Box::new(campaign.clone()))).is_err() {
            warn!(campaign_id = %campaign.id, "Snapshot writer stopped; save dropped");
        }
    }

    pub(crate) fn delete(&self, id: &str) {
        if self.tx.send(SnapshotOp::Delete(id.to_string())).is_err() {
            warn!(campaign_id = %id, "Snapshot writer stopped; delete dropped");
        }
    }

    /// Wait until every operation queued before this call has finished.
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(SnapshotOp::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{CampaignContext, CampaignOptions, CampaignStatus};
    use crate::orchestrator::store::InMemorySnapshotStore;

    fn campaign() -> Campaign {
        Campaign::new("brief", CampaignContext::default(), CampaignOptions::default())
    }

    #[tokio::test]
    async fn test_writes_apply_in_queue_order() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let writer = SnapshotWriter::spawn(store.clone());

        let mut c = campaign();
        writer.save(&c);
        c.set_status(CampaignStatus::Paused);
        writer.save(&c);
        writer.flush().await;
        assert_eq!(store.load(&c.id).unwrap().unwrap().status, CampaignStatus::Paused);

        writer.save(&c);
        writer.delete(&c.id);
        writer.flush().await;
        assert!(store.load(&c.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flush_on_empty_queue_returns() {
        let writer = SnapshotWriter::spawn(Arc::new(InMemorySnapshotStore::new()));
        writer.flush().await;
    }
}
