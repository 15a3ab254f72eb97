// THEORY:
// The `HeatmapService` serves the live-feed use case, where detections arrive a
// frame at a time and the heatmap should reflect the recent past rather than a
// single frame.
//
// Key architectural principles:
// 1.  **Actor Ownership**: A single tokio task owns the `DetectionHistory` and the
//     `DensityGridEstimator`. Nothing else touches them, so there are no locks;
//     callers talk to the task through a bounded `mpsc` channel and receive
//     replies on a `oneshot` channel.
// 2.  **Snapshots**: Every reply carries a self-contained `HeatmapSnapshot` (the
//     grid, summary and class counts) so callers can render without holding on
//     to the service.
// 3.  **Clean Shutdown**: An explicit `shutdown` stops the task; dropping the
//     handle makes a best-effort attempt to do the same.

use crate::config::ServiceConfig;
use crate::core_modules::history::DetectionHistory;
use crate::estimator::{
    DensityError, DensityGrid, DensityGridEstimator, Detection, DetectionCounts, HeatmapSummary,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Everything a renderer needs to draw the current heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSnapshot {
    pub summary: HeatmapSummary,
    pub class_counts: DetectionCounts,
    /// Absent while the history is empty.
    pub grid: Option<DensityGrid>,
}

impl HeatmapSnapshot {
    fn capture(estimator: &DensityGridEstimator) -> Self {
        Self {
            summary: estimator.summary(),
            class_counts: estimator.class_counts(),
            grid: estimator.grid().cloned(),
        }
    }
}

/// Message type for the service actor.
enum HeatmapMessage {
    Submit(Vec<Detection>, oneshot::Sender<HeatmapSnapshot>),
    Snapshot(oneshot::Sender<HeatmapSnapshot>),
    Clear(oneshot::Sender<()>),
    SetCellSize(u32, oneshot::Sender<Result<(), DensityError>>),
    Shutdown,
}

/// Handle to a running heatmap actor.
pub struct HeatmapService {
    sender: mpsc::Sender<HeatmapMessage>,
    task: Option<JoinHandle<()>>,
}

impl HeatmapService {
    /// Validates the configuration and spawns the actor on the current tokio runtime.
    ///
    /// `config` is used as given; pass it through [`ServiceConfig::apply_env`] first to
    /// honour `DEBRIS_CELL_SIZE` and `DEBRIS_HISTORY_CAPACITY`.
    pub fn spawn(config: ServiceConfig) -> Result<Self, DensityError> {
        let estimator = DensityGridEstimator::new(config.estimator)?;
        let history = DetectionHistory::new(config.history_capacity);
        let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));

        let task = tokio::spawn(Self::run(estimator, history, receiver));
        log::info!(
            "heatmap service started ({}x{} px, cell {} px, history {})",
            config.estimator.image_width,
            config.estimator.image_height,
            config.estimator.cell_size,
            config.history_capacity
        );

        Ok(Self {
            sender,
            task: Some(task),
        })
    }

    async fn run(
        mut estimator: DensityGridEstimator,
        mut history: DetectionHistory,
        mut receiver: mpsc::Receiver<HeatmapMessage>,
    ) {
        while let Some(msg) = receiver.recv().await {
            match msg {
                HeatmapMessage::Submit(frame, reply) => {
                    let evicted = history.extend(frame);
                    if evicted > 0 {
                        log::debug!("evicted {evicted} detections from heatmap history");
                    }
                    estimator.set_detections(history.snapshot());
                    let _ = reply.send(HeatmapSnapshot::capture(&estimator));
                }
                HeatmapMessage::Snapshot(reply) => {
                    let _ = reply.send(HeatmapSnapshot::capture(&estimator));
                }
                HeatmapMessage::Clear(reply) => {
                    history.clear();
                    estimator.clear();
                    let _ = reply.send(());
                }
                HeatmapMessage::SetCellSize(cell_size, reply) => {
                    let _ = reply.send(estimator.set_cell_size(cell_size));
                }
                HeatmapMessage::Shutdown => break,
            }
        }
        log::info!("heatmap service stopped");
    }

    /// Adds one frame of detections to the history and returns the updated heatmap.
    pub async fn submit(&self, frame: Vec<Detection>) -> Result<HeatmapSnapshot, DensityError> {
        self.request(|reply| HeatmapMessage::Submit(frame, reply)).await
    }

    pub async fn snapshot(&self) -> Result<HeatmapSnapshot, DensityError> {
        self.request(HeatmapMessage::Snapshot).await
    }

    /// Forgets every accumulated detection.
    pub async fn clear(&self) -> Result<(), DensityError> {
        self.request(HeatmapMessage::Clear).await
    }

    pub async fn set_cell_size(&self, cell_size: u32) -> Result<(), DensityError> {
        self.request(|reply| HeatmapMessage::SetCellSize(cell_size, reply))
            .await?
    }

    /// Stops the actor and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.sender.send(HeatmapMessage::Shutdown).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn request<T, F>(&self, build: F) -> Result<T, DensityError>
    where
        F: FnOnce(oneshot::Sender<T>) -> HeatmapMessage,
    {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| DensityError::ServiceClosed)?;
        response.await.map_err(|_| DensityError::ServiceClosed)
    }
}

impl Drop for HeatmapService {
    fn drop(&mut self) {
        // Best effort shutdown on drop
        if self.task.is_some() {
            let _ = self.sender.try_send(HeatmapMessage::Shutdown);
        }
    }
}
