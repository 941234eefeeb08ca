// ABOUTME: Timed playback of multi-frame images onto an in-place updating output sink
// ABOUTME: Runs as a tokio task that loops frames cyclically until its stop handle fires

use crate::constants::animation::MIN_FRAME_EDGE;
use crate::dimensions::DimensionRequest;
use crate::error::{RenderError, Result};
use crate::pixels::Frame;
use crate::renderer::GlyphRenderer;
use crossterm::cursor::{Hide, MoveToColumn, MoveToPreviousLine, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::Instant;

/// Destination for rendered frames. Each `write` replaces whatever the
/// previous `write` put on screen.
pub trait OutputSink: Send + 'static {
    fn write(&mut self, frame: &str) -> io::Result<()>;

    /// Called once when playback stops
    fn done(&mut self) {}

    /// Called for every frame that failed to render and was skipped
    fn error(&mut self, err: &RenderError) {
        let _ = err;
    }
}

impl<F> OutputSink for F
where
    F: FnMut(&str) + Send + 'static,
{
    fn write(&mut self, frame: &str) -> io::Result<()> {
        self(frame);
        Ok(())
    }
}

/// Rewrites the previous frame in place using cursor movement
#[derive(Debug)]
pub struct LogUpdateSink<W: Write> {
    out: W,
    previous_lines: u16,
    cursor_hidden: bool,
}

impl LogUpdateSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> LogUpdateSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            previous_lines: 0,
            cursor_hidden: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> OutputSink for LogUpdateSink<W> {
    fn write(&mut self, frame: &str) -> io::Result<()> {
        if !self.cursor_hidden {
            queue!(self.out, Hide)?;
            self.cursor_hidden = true;
        }
        if self.previous_lines > 0 {
            queue!(
                self.out,
                MoveToPreviousLine(self.previous_lines),
                MoveToColumn(0),
                Clear(ClearType::FromCursorDown)
            )?;
        }

        self.out.write_all(frame.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;

        self.previous_lines = u16::try_from(frame.lines().count().max(1)).unwrap_or(u16::MAX);
        Ok(())
    }

    fn done(&mut self) {
        if self.cursor_hidden {
            let _ = queue!(self.out, Show);
            self.cursor_hidden = false;
        }
        let _ = self.out.flush();
    }

    fn error(&mut self, err: &RenderError) {
        log::debug!("Skipped animation frame: {}", err);
    }
}

/// Turns one decoded frame into the text handed to the sink
pub type FrameRenderer = Box<dyn FnMut(&Frame) -> Result<String> + Send>;

/// Frame renderer drawing every frame as half-blocks at the requested size
pub fn halfblock_frames(glyphs: GlyphRenderer, request: DimensionRequest) -> FrameRenderer {
    Box::new(move |frame: &Frame| glyphs.render(&frame.buffer, &request))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Stopped,
}

/// Position of a driver in its cyclic frame sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub index: usize,
    /// Time spent on the current frame so far
    pub elapsed: Duration,
    pub state: PlaybackState,
}

impl AnimationState {
    fn new() -> Self {
        Self {
            index: 0,
            elapsed: Duration::ZERO,
            state: PlaybackState::Idle,
        }
    }

    fn advance(&mut self, frame_count: usize) {
        self.index = (self.index + 1) % frame_count;
        self.elapsed = Duration::ZERO;
    }
}

pub struct AnimationDriver {
    frames: Arc<[Frame]>,
    renderer: FrameRenderer,
    min_interval: Duration,
    state: AnimationState,
}

impl AnimationDriver {
    pub fn new(
        frames: Vec<Frame>,
        maximum_frame_rate: u32,
        renderer: FrameRenderer,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(RenderError::validation("frame", "animation has no frames"));
        }
        if maximum_frame_rate == 0 {
            return Err(RenderError::validation(
                "maximum_frame_rate",
                "must be greater than 0",
            ));
        }
        if let Some(small) = frames.iter().find(|f| {
            f.buffer.width() < MIN_FRAME_EDGE || f.buffer.height() < MIN_FRAME_EDGE
        }) {
            return Err(RenderError::validation(
                "frame",
                format!(
                    "{}x{} is smaller than the {}x{} minimum",
                    small.buffer.width(),
                    small.buffer.height(),
                    MIN_FRAME_EDGE,
                    MIN_FRAME_EDGE
                ),
            ));
        }

        Ok(Self {
            frames: frames.into(),
            renderer,
            min_interval: Duration::from_secs_f64(1.0 / maximum_frame_rate as f64),
            state: AnimationState::new(),
        })
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Display time of frame `index` after rate limiting
    pub fn frame_interval(&self, index: usize) -> Duration {
        frame_interval(&self.frames, index, self.min_interval)
    }

    /// Start playback on the current tokio runtime
    pub fn spawn<S: OutputSink>(self, sink: S) -> Result<StopHandle> {
        let runtime = Handle::try_current().map_err(|_| RenderError::NoRuntime)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = runtime.spawn(self.run(sink, stop_rx));

        Ok(StopHandle {
            stop: stop_tx,
            task: Some(task),
        })
    }

    async fn run<S: OutputSink>(self, mut sink: S, mut stop: watch::Receiver<bool>) {
        let AnimationDriver {
            frames,
            mut renderer,
            min_interval,
            mut state,
        } = self;
        state.state = PlaybackState::Playing;
        log::debug!("Animation started with {} frames", frames.len());

        loop {
            if *stop.borrow() {
                break;
            }

            let started = Instant::now();
            let index = state.index;

            // Resizing and encoding are CPU-bound, keep them off the async workers
            let render_frames = Arc::clone(&frames);
            let rendered = task::spawn_blocking(move || {
                let result = renderer(&render_frames[index]);
                (renderer, result)
            })
            .await;
            let result = match rendered {
                Ok((returned, result)) => {
                    renderer = returned;
                    result
                }
                Err(e) => {
                    log::warn!("Frame renderer failed on frame {}, stopping: {}", index, e);
                    break;
                }
            };

            match result {
                Ok(text) => {
                    // A render that was in flight when stop arrived is discarded
                    if *stop.borrow() {
                        break;
                    }
                    if let Err(e) = sink.write(&text) {
                        log::warn!("Output sink rejected frame {}, stopping: {}", index, e);
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Skipping animation frame {}: {}", index, e);
                    sink.error(&e);
                }
            }

            let interval = frame_interval(&frames, index, min_interval);
            state.elapsed = started.elapsed();
            let wait = interval.saturating_sub(state.elapsed);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = stop.wait_for(|stopped| *stopped) => break,
            }

            state.advance(frames.len());
        }

        state.state = PlaybackState::Stopped;
        sink.done();
        log::debug!("Animation stopped");
    }
}

/// How long `index` stays on screen: the gap to the next frame's time code
/// (the last frame uses its own delay), never below `min_interval`
fn frame_interval(frames: &[Frame], index: usize, min_interval: Duration) -> Duration {
    let current = &frames[index];
    let natural = match frames.get(index + 1) {
        Some(next) => next.time_code.saturating_sub(current.time_code),
        None => current.delay,
    };
    natural.max(min_interval)
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("frames", &self.frames.len())
            .field("min_interval", &self.min_interval)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Cancellation handle for a running animation. Dropping it stops playback.
#[derive(Debug)]
pub struct StopHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl StopHandle {
    /// Request a stop. No frame is written after this returns.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Whether the playback task has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for playback to end on its own, without requesting a stop
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                log::warn!("Animation task ended abnormally: {}", e);
            }
            self.task = None;
        }
    }

    /// Stop and wait for the sink's `done` hook to run
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Animation task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
