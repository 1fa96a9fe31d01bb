// THEORY:
// The `parallel_pipeline` module puts a `FocusPipeline` behind an async interface.
// Frames are strictly sequential (each one reads the state the previous one wrote),
// so unlike a worker pool that fans frames out, the service owns exactly one
// pipeline on one worker task and the parallelism lives inside each frame:
//
// 1.  **Ordered Queue**: callers send `FrameTask`s over a bounded mpsc channel. The
//     worker drains it in submission order, so frame N+1 always sees frame N's state.
// 2.  **Blocking Isolation**: each frame runs in `spawn_blocking`, keeping the
//     row-parallel rayon passes off the async executor.
// 3.  **Dedicated Pool**: the rayon passes run in a pool owned by the service, sized
//     to the machine by default, so the host's global rayon pool is left alone.
// 4.  **Oneshot Replies**: every request carries its own reply channel; shutting
//     down hands the pipeline (and its state) back to the caller.

use crate::error::{FocusError, FocusResult};
use crate::pipeline::{FocusPipeline, FrameOutput};
use futures::{Stream, StreamExt};
use image::RgbaImage;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

const FRAME_QUEUE_DEPTH: usize = 8;

/// One frame waiting for the worker, with the channel its output goes back on.
pub struct FrameTask {
    pub frame: RgbaImage,
    pub result_sender: oneshot::Sender<FrameOutput>,
}

enum ServiceMessage {
    Frame(FrameTask),
    Reset(oneshot::Sender<()>),
    Shutdown,
}

/// An async front end to a single `FocusPipeline`.
pub struct FocusService {
    task_sender: mpsc::Sender<ServiceMessage>,
    worker: JoinHandle<Option<FocusPipeline>>,
}

impl FocusService {
    /// Starts the service with one rayon thread per logical CPU.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(pipeline: FocusPipeline) -> FocusResult<Self> {
        Self::spawn_with_threads(pipeline, num_cpus::get())
    }

    pub fn spawn_with_threads(pipeline: FocusPipeline, threads: usize) -> FocusResult<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("waldo-focus-{index}"))
            .build()?;

        let (task_sender, task_receiver) = mpsc::channel(FRAME_QUEUE_DEPTH);
        let worker = tokio::spawn(Self::run_worker(pipeline, Arc::new(pool), task_receiver));
        info!(threads, "focus service started");

        Ok(Self {
            task_sender,
            worker,
        })
    }

    async fn run_worker(
        mut pipeline: FocusPipeline,
        pool: Arc<rayon::ThreadPool>,
        mut task_receiver: mpsc::Receiver<ServiceMessage>,
    ) -> Option<FocusPipeline> {
        while let Some(message) = task_receiver.recv().await {
            match message {
                ServiceMessage::Frame(task) => {
                    let pool = Arc::clone(&pool);
                    let processed = tokio::task::spawn_blocking(move || {
                        let output = pool.install(|| pipeline.process_frame(&task.frame));
                        (pipeline, output, task.result_sender)
                    })
                    .await;

                    match processed {
                        Ok((returned, output, result_sender)) => {
                            pipeline = returned;
                            // The caller may have stopped waiting; the state still advanced.
                            let _ = result_sender.send(output);
                        }
                        Err(join_error) => {
                            error!(%join_error, "focus worker failed, stopping service");
                            return None;
                        }
                    }
                }
                ServiceMessage::Reset(done) => {
                    pipeline.reset();
                    let _ = done.send(());
                }
                ServiceMessage::Shutdown => break,
            }
        }

        info!(
            frames = pipeline.state().frames_processed(),
            "focus service stopped"
        );
        Some(pipeline)
    }

    /// Queues `frame` behind every frame submitted before it and waits for its output.
    pub async fn process_frame(&self, frame: RgbaImage) -> FocusResult<FrameOutput> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = FrameTask {
            frame,
            result_sender,
        };

        self.task_sender
            .send(ServiceMessage::Frame(task))
            .await
            .map_err(|_| FocusError::ServiceClosed)?;

        result_receiver.await.map_err(|_| FocusError::ServiceClosed)
    }

    /// Maps a stream of frames to a stream of outputs, one frame in flight at a time.
    pub fn process_stream<'a, S>(
        &'a self,
        frames: S,
    ) -> impl Stream<Item = FocusResult<FrameOutput>> + 'a
    where
        S: Stream<Item = RgbaImage> + 'a,
    {
        frames.then(move |frame| self.process_frame(frame))
    }

    /// Starts a new session once every frame queued before this call is done.
    pub async fn reset(&self) -> FocusResult<()> {
        let (done_sender, done_receiver) = oneshot::channel();
        self.task_sender
            .send(ServiceMessage::Reset(done_sender))
            .await
            .map_err(|_| FocusError::ServiceClosed)?;
        done_receiver.await.map_err(|_| FocusError::ServiceClosed)
    }

    /// Finishes queued frames, stops the worker and returns the pipeline.
    pub async fn shutdown(self) -> FocusResult<FocusPipeline> {
        // A closed channel means the worker is already gone; its join result says why.
        let _ = self.task_sender.send(ServiceMessage::Shutdown).await;
        drop(self.task_sender);
        self.worker.await?.ok_or(FocusError::ServiceClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FocusConfig;
    use crate::core_modules::point::Point;
    use futures::stream;
    use image::Rgba;

    fn moving_dot(index: u32) -> RgbaImage {
        RgbaImage::from_fn(48, 48, |x, y| {
            let dot_x = 30 + (index % 8);
            if x.abs_diff(dot_x) < 3 && y.abs_diff(10) < 3 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn pipeline() -> FocusPipeline {
        FocusPipeline::new(FocusConfig::default()).expect("valid config")
    }

    #[tokio::test]
    async fn frames_come_back_in_submission_order() {
        let service = FocusService::spawn_with_threads(pipeline(), 2).expect("service starts");
        let mut reference = pipeline();

        for index in 0..12 {
            let output = service.process_frame(moving_dot(index)).await.expect("frame processed");
            let expected = reference.process_frame(&moving_dot(index));
            assert_eq!(output.report.frame_index, u64::from(index));
            assert!(
                output.report.focus_point().distance(expected.report.focus_point()) < 1e-4,
                "{:?} vs {:?}",
                output.report.focus_point(),
                expected.report.focus_point()
            );
        }

        let pipeline = service.shutdown().await.expect("clean shutdown");
        assert_eq!(pipeline.state().frames_processed(), 12);
    }

    #[tokio::test]
    async fn streams_are_processed_sequentially() {
        let service = FocusService::spawn(pipeline()).expect("service starts");
        let outputs: Vec<_> = service
            .process_stream(stream::iter((0..5).map(moving_dot)))
            .collect()
            .await;

        let indices: Vec<u64> = outputs
            .into_iter()
            .map(|output| output.expect("frame processed").report.frame_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn reset_starts_a_new_session() {
        let service = FocusService::spawn_with_threads(pipeline(), 1).expect("service starts");
        for index in 0..4 {
            service.process_frame(moving_dot(index)).await.expect("frame processed");
        }
        service.reset().await.expect("reset acknowledged");

        let black = RgbaImage::from_pixel(48, 48, Rgba([0, 0, 0, 255]));
        let output = service.process_frame(black).await.expect("frame processed");
        assert_eq!(output.report.frame_index, 0);
        assert_eq!(output.report.focus_point(), Point::SCREEN_CENTER);

        let pipeline = service.shutdown().await.expect("clean shutdown");
        assert_eq!(pipeline.focus(), Point::SCREEN_CENTER);
    }
}
