use crate::core_modules::analyzer::{FileReport, RadialReport, process_group};
use crate::core_modules::edge::Edge;
use crate::core_modules::file_group::{FileGroup, FilePartition};
use crate::core_modules::persistence::derive_radial_persistence;
use crate::core_modules::spot::Spot;
use crate::error::RadialError;
use crate::pipeline::RadialConfig;
use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::{mpsc, oneshot, watch};

/// One file's rows, owned by the task so workers share nothing.
pub struct FileTask {
    pub index: usize,
    pub file_id: String,
    pub spots: Vec<Spot>,
    pub edges: Vec<Edge>,
    pub result_sender: oneshot::Sender<FileReport>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FileTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns a dispatcher and `worker_count` workers on the current tokio runtime.
    pub fn new(config: RadialConfig, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FileTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FileTask>())
            .unzip();

        // Round-robin dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        for mut worker_receiver in worker_receivers {
            let worker_config = config.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    // The batch that queued this task was cancelled.
                    if task.result_sender.is_closed() {
                        debug!("Dropping abandoned task for file {}", task.file_id);
                        continue;
                    }
                    let report = Self::process_file_worker(&task, &worker_config);
                    let _ = task.result_sender.send(report);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    fn process_file_worker(task: &FileTask, config: &RadialConfig) -> FileReport {
        let group = FileGroup {
            file_id: &task.file_id,
            spots: task.spots.iter().collect(),
            edges: task.edges.iter().collect(),
        };
        debug!("Worker picked up file {} (task {})", task.file_id, task.index);
        process_group(&group, config)
    }

    pub fn submit(&self, task: FileTask) -> Result<(), RadialError> {
        self.task_sender
            .send(task)
            .map_err(|_| RadialError::worker_pool("failed to send task to worker pool"))
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// Cancels the in-flight `ParallelRadialPipeline::run`, or the next one if
/// none is running. The pipeline is usable again once that run has returned.
#[derive(Clone)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }
}

/// The radial engine with files spread across a tokio worker pool.
///
/// Produces the same report as `RadialPipeline::run`, in the same order.
pub struct ParallelRadialPipeline {
    config: RadialConfig,
    worker_pool: WorkerPool,
    cancel_tx: watch::Sender<bool>,
}

impl ParallelRadialPipeline {
    /// Must be called from within a tokio runtime. The pool is sized to the
    /// number of logical CPUs.
    pub fn new(config: RadialConfig) -> Result<Self, RadialError> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: RadialConfig, worker_count: usize) -> Result<Self, RadialError> {
        config.validate()?;
        let worker_pool = WorkerPool::new(config.clone(), worker_count);
        let (cancel_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            worker_pool,
            cancel_tx,
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancel_tx: self.cancel_tx.clone(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    pub async fn run(&self, spots: &[Spot], edges: &[Edge]) -> Result<RadialReport, RadialError> {
        let result = self.run_batch(spots, edges).await;
        // A cancellation only ever applies to one batch.
        self.cancel_tx.send_replace(false);
        result
    }

    async fn run_batch(&self, spots: &[Spot], edges: &[Edge]) -> Result<RadialReport, RadialError> {
        let mut cancel_rx = self.cancel_tx.subscribe();
        if *cancel_rx.borrow_and_update() {
            return Err(RadialError::Cancelled);
        }

        let partition = FilePartition::new(spots, edges, self.config.file_order);
        let orphan_edges = partition.orphan_edges();
        if orphan_edges > 0 {
            warn!("{} edges reference a File_ID with no spots", orphan_edges);
        }

        let mut receivers = Vec::with_capacity(partition.len());
        for (index, group) in partition.into_groups().into_iter().enumerate() {
            let (result_sender, result_receiver) = oneshot::channel();
            self.worker_pool.submit(FileTask {
                index,
                file_id: group.file_id.to_string(),
                spots: group.spots.into_iter().cloned().collect(),
                edges: group.edges.into_iter().cloned().collect(),
                result_sender,
            })?;
            receivers.push(result_receiver);
        }

        // Cancellation wins over results that are ready in the same poll.
        let collected = tokio::select! {
            biased;
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => return Err(RadialError::Cancelled),
            results = join_all(receivers) => results,
        };

        // `join_all` keeps submission order, which is the partition order.
        let reports = collected
            .into_iter()
            .collect::<Result<Vec<FileReport>, _>>()
            .map_err(|_| RadialError::worker_pool("failed to receive result from worker"))?;

        let mut report = RadialReport::from_file_reports(reports, orphan_edges);
        derive_radial_persistence(&mut report.edges);
        if report.is_empty() {
            warn!("No edge data produced by the radial analysis");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FileOrder, RadialPipeline};

    fn colony(file_id: &str, offset: f64, n: i64) -> (Vec<Spot>, Vec<Edge>) {
        let mut spots = Vec::new();
        let mut edges = Vec::new();
        for i in 0..n {
            let angle = i as f64 * 0.7;
            let radius = 5.0 + i as f64;
            spots.push(
                Spot::new(file_id, i + 1, offset + radius * angle.cos(), offset + radius * angle.sin())
                    .with_time(i as f64 * 600.0),
            );
            if i > 0 {
                edges.push(Edge::new(file_id, i, i + 1, i as f64));
            }
        }
        (spots, edges)
    }

    fn batch() -> (Vec<Spot>, Vec<Edge>) {
        let mut spots = Vec::new();
        let mut edges = Vec::new();
        for (k, id) in ["r3", "r1", "r2", "r5", "r4"].iter().enumerate() {
            let (s, e) = colony(id, 50.0 * k as f64, 12);
            spots.extend(s);
            edges.extend(e);
        }
        edges.push(Edge::new("r1", 0, 0, 0.0));
        edges.push(Edge::new("orphan", 1, 2, 0.0));
        (spots, edges)
    }

    #[tokio::test]
    async fn matches_sequential_pipeline() {
        let (spots, edges) = batch();
        for order in [FileOrder::FirstAppearance, FileOrder::Lexicographic] {
            let config = RadialConfig {
                file_order: order,
                ..RadialConfig::default()
            };
            let sequential = RadialPipeline::new(config.clone()).unwrap().run(&spots, &edges);
            let parallel = ParallelRadialPipeline::with_workers(config, 3)
                .unwrap()
                .run(&spots, &edges)
                .await
                .unwrap();

            assert_eq!(parallel.edges, sequential.edges);
            assert_eq!(parallel.files, sequential.files);
            assert_eq!(parallel.skips, sequential.skips);
            assert_eq!(parallel.orphan_edges, 1);
        }
    }

    #[tokio::test]
    async fn cancelled_batch_returns_error() {
        let (spots, edges) = batch();
        let pipeline = ParallelRadialPipeline::with_workers(RadialConfig::default(), 2).unwrap();
        pipeline.cancel_handle().cancel();
        let result = pipeline.run(&spots, &edges).await;
        assert!(matches!(result, Err(RadialError::Cancelled)));
    }

    #[tokio::test]
    async fn pipeline_recovers_after_a_cancelled_run() {
        let (spots, edges) = batch();
        let pipeline = ParallelRadialPipeline::with_workers(RadialConfig::default(), 2).unwrap();
        let expected = RadialPipeline::new(RadialConfig::default()).unwrap().run(&spots, &edges);

        pipeline.cancel_handle().cancel();
        assert!(matches!(pipeline.run(&spots, &edges).await, Err(RadialError::Cancelled)));

        let report = pipeline.run(&spots, &edges).await.unwrap();
        assert_eq!(report.edges, expected.edges);
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn cancel_after_submission_stops_the_batch() {
        let (spots, edges) = batch();
        let pipeline = ParallelRadialPipeline::with_workers(RadialConfig::default(), 1).unwrap();
        let handle = pipeline.cancel_handle();

        // Polled right after `run` has queued its files.
        let cancel = async {
            handle.cancel();
        };
        let (result, _) = tokio::join!(pipeline.run(&spots, &edges), cancel);
        assert!(matches!(result, Err(RadialError::Cancelled)));

        let report = pipeline.run(&spots, &edges).await.unwrap();
        assert_eq!(report.files.len(), 5);
    }

    #[tokio::test]
    async fn empty_input_is_an_empty_report() {
        let pipeline = ParallelRadialPipeline::new(RadialConfig::default()).unwrap();
        assert!(pipeline.worker_count() >= 1);
        let report = pipeline.run(&[], &[]).await.unwrap();
        assert!(report.is_empty());
        assert!(report.files.is_empty());
    }
}
