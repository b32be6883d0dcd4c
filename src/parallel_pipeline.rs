// THEORY:
// The `RenderService` turns a `FrameRenderer` into an actor. Frames can arrive
// from more than one place at once (a fixed-rate tick, a decoder's frame-ready
// callback, a camera thread); they all converge on one channel, and a single
// task owning the renderer consumes it. That task is the only writer of the
// instance set, so cycle N+1 cannot start before cycle N has finished.
//
// Producers talk to the actor through a clonable `RenderHandle`:
// - `submit` queues a frame and waits for its cycle to finish.
// - `try_submit` drops the frame instead of waiting when the queue is full,
//   which is how playback keeps up with a slow scene ("skip on drop").
// - `stop` runs a teardown-only pass; the renderer then idles until the next
//   frame.
// The live instance count is published on a watch channel after every cycle.
//
// `RenderService::shutdown` clears the scene, ends the task and hands the
// renderer back to the caller.

use crate::core_modules::reconciler::InstanceSpawner;
use crate::error::{RenderError, RenderResult};
use crate::frame_source::Frame;
use crate::pipeline::FrameRenderer;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const FRAME_QUEUE_DEPTH: usize = 2;

/// Message type for the render actor.
enum RenderMessage {
    Frame(Frame, oneshot::Sender<RenderResult<usize>>),
    Stop(oneshot::Sender<usize>),
    Shutdown,
}

/// A frame accepted by `try_submit` whose cycle has not been awaited yet.
pub struct PendingFrame {
    reply: oneshot::Receiver<RenderResult<usize>>,
}

impl PendingFrame {
    /// Waits for the frame's cycle and returns its instance count.
    pub async fn wait(self) -> RenderResult<usize> {
        self.reply
            .await
            .map_err(|_| RenderError::worker("render service dropped the frame"))?
    }
}

/// Clonable producer side of a running `RenderService`.
#[derive(Clone)]
pub struct RenderHandle {
    sender: mpsc::Sender<RenderMessage>,
    count: watch::Receiver<usize>,
}

impl RenderHandle {
    /// Queues `frame` and waits for its cycle.
    pub async fn submit(&self, frame: Frame) -> RenderResult<usize> {
        let (reply, pending) = oneshot::channel();
        self.sender
            .send(RenderMessage::Frame(frame, reply))
            .await
            .map_err(|_| RenderError::worker("render service is not running"))?;
        PendingFrame { reply: pending }.wait().await
    }

    /// Queues `frame` unless the queue is full, in which case it is dropped
    /// and `None` is returned.
    pub fn try_submit(&self, frame: Frame) -> RenderResult<Option<PendingFrame>> {
        let (reply, pending) = oneshot::channel();
        match self.sender.try_send(RenderMessage::Frame(frame, reply)) {
            Ok(()) => Ok(Some(PendingFrame { reply: pending })),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("render queue full, dropping frame");
                Ok(None)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(RenderError::worker("render service is not running"))
            }
        }
    }

    /// Clears the scene; returns how many instances were destroyed.
    pub async fn stop(&self) -> RenderResult<usize> {
        let (reply, done) = oneshot::channel();
        self.sender
            .send(RenderMessage::Stop(reply))
            .await
            .map_err(|_| RenderError::worker("render service is not running"))?;
        done.await
            .map_err(|_| RenderError::worker("render service stopped mid-teardown"))
    }

    /// Live instance count after the most recent cycle.
    pub fn instance_count(&self) -> usize {
        *self.count.borrow()
    }

    /// A receiver that is notified whenever the live count changes.
    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.count.clone()
    }
}

/// Owns the render actor task.
pub struct RenderService<P, S: InstanceSpawner<P>> {
    handle: RenderHandle,
    worker: JoinHandle<FrameRenderer<P, S>>,
}

impl<P, S> RenderService<P, S>
where
    P: Send + Sync + 'static,
    S: InstanceSpawner<P> + Send + 'static,
    S::Handle: Send + 'static,
{
    /// Moves `renderer` onto its own task. Must be called inside a tokio runtime.
    pub fn spawn(renderer: FrameRenderer<P, S>) -> Self {
        let (sender, receiver) = mpsc::channel(FRAME_QUEUE_DEPTH);
        let (count_tx, count) = watch::channel(renderer.instance_count());
        let worker = tokio::spawn(Self::run(renderer, receiver, count_tx));
        Self {
            handle: RenderHandle { sender, count },
            worker,
        }
    }

    async fn run(
        mut renderer: FrameRenderer<P, S>,
        mut receiver: mpsc::Receiver<RenderMessage>,
        count_tx: watch::Sender<usize>,
    ) -> FrameRenderer<P, S> {
        tracing::info!("render service started");
        while let Some(message) = receiver.recv().await {
            match message {
                RenderMessage::Frame(frame, reply) => {
                    let result = renderer.render_new_frame(&frame).await;
                    count_tx.send_replace(renderer.instance_count());
                    let _ = reply.send(result);
                }
                RenderMessage::Stop(reply) => {
                    let destroyed = renderer.clear_frame();
                    count_tx.send_replace(0);
                    let _ = reply.send(destroyed);
                }
                RenderMessage::Shutdown => break,
            }
        }
        renderer.clear_frame();
        count_tx.send_replace(0);
        tracing::info!(frames = renderer.frames_rendered(), "render service stopped");
        renderer
    }

    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    /// Clears the scene, stops the actor and returns the renderer.
    pub async fn shutdown(self) -> RenderResult<FrameRenderer<P, S>> {
        // A closed channel means the actor already exited on its own.
        let _ = self.handle.sender.send(RenderMessage::Shutdown).await;
        self.worker
            .await
            .map_err(|e| RenderError::worker(format!("render service panicked: {e}")))
    }
}
