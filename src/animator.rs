use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::chart::{ChartLayout, ChartScene};
use crate::data::Dataset;
use crate::ease::Ease;
use crate::error::RankraceResult;
use crate::playback::{PlaybackPhase, PlaybackState};
use crate::reconcile::blend_scenes;
use crate::render_cpu::CpuRenderer;
use crate::scale::Palette;
use crate::sink::FrameSink;

/// Fixed-interval tick source on a background thread.
///
/// The channel holds at most one pending tick: when the consumer falls
/// behind, further ticks are dropped rather than queued, so a slow render
/// never builds a backlog. Dropping the ticker stops the thread and joins
/// it, so a ticker can never outlive its consumer.
pub struct Ticker {
    rx: mpsc::Receiver<()>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                match tx.try_send(()) {
                    Ok(()) | Err(mpsc::TrySendError::Full(())) => {}
                    Err(mpsc::TrySendError::Disconnected(())) => break,
                }
                if interval.is_zero() {
                    thread::yield_now();
                } else {
                    thread::sleep(interval);
                }
            }
        });
        Self {
            rx,
            stop,
            handle: Some(handle),
        }
    }

    /// Block until the next tick. `None` once the ticker is stopped.
    pub fn wait(&self) -> Option<()> {
        self.rx.recv().ok()
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // At most one tick can be pending; discard it before joining.
        while self.rx.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Animation knobs.
#[derive(Clone, Copy, Debug)]
pub struct AnimatorOpts {
    /// Rendered frames per dataset frame; 1 emits the resolved scene only,
    /// larger values emit eased in-between frames as well.
    pub steps_per_frame: usize,
    pub ease: Ease,
    /// Tick interval used by [`Animator::run`].
    pub interval: Duration,
}

impl Default for AnimatorOpts {
    fn default() -> Self {
        Self {
            steps_per_frame: 1,
            ease: Ease::default(),
            interval: Duration::from_millis(150),
        }
    }
}

/// Totals reported by a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames delivered to the sink, in-between frames included.
    pub frames_rendered: usize,
    /// Dataset frames consumed.
    pub years_played: usize,
}

/// Drives playback over a dataset: each tick advances the cursor, builds the
/// next scene, blends it against the previous one, and hands the rasterized
/// frames to a sink.
pub struct Animator {
    dataset: Dataset,
    layout: ChartLayout,
    palette: Palette,
    playback: PlaybackState,
    renderer: CpuRenderer,
    opts: AnimatorOpts,
    prev_scene: Option<ChartScene>,
    stats: RunStats,
}

impl Animator {
    pub fn new(dataset: Dataset, layout: ChartLayout, renderer: CpuRenderer, opts: AnimatorOpts) -> Self {
        let palette = Palette::from_dataset(&dataset);
        let playback = PlaybackState::ready(dataset.len());
        Self {
            dataset,
            layout,
            palette,
            playback,
            renderer,
            opts,
            prev_scene: None,
            stats: RunStats::default(),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.playback.phase()
    }

    pub fn toggle_play(&mut self) -> PlaybackPhase {
        self.playback.toggle_play()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// One tick: advance the cursor and render. Returns `false` when nothing
    /// was emitted (paused or finished).
    pub fn tick(&mut self, sink: &mut dyn FrameSink) -> RankraceResult<bool> {
        let Some(index) = self.playback.advance_frame() else {
            return Ok(false);
        };
        let next = ChartScene::build(&self.dataset, index, &self.layout, &self.palette)?;

        match (&self.prev_scene, self.opts.steps_per_frame) {
            (Some(prev), steps) if steps > 1 => {
                for step in 1..=steps {
                    let t = step as f64 / steps as f64;
                    let blended = blend_scenes(prev, &next, t, self.opts.ease);
                    let frame = self.renderer.render_scene(&blended, &self.layout)?;
                    sink.write_frame(&frame)?;
                    self.stats.frames_rendered += 1;
                }
            }
            _ => {
                let frame = self.renderer.render_scene(&next, &self.layout)?;
                sink.write_frame(&frame)?;
                self.stats.frames_rendered += 1;
            }
        }

        self.prev_scene = Some(next);
        self.stats.years_played += 1;
        Ok(true)
    }

    /// Play the whole dataset front to back on a fixed-interval ticker.
    ///
    /// The ticker is stopped as soon as playback reaches the end; nothing
    /// keeps firing after the final frame.
    #[tracing::instrument(skip_all, fields(years = self.dataset.len()))]
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> RankraceResult<RunStats> {
        let mut ticker = Ticker::new(self.opts.interval);
        while ticker.wait().is_some() {
            self.tick(sink)?;
            if self.playback.is_finished() {
                break;
            }
        }
        ticker.stop();
        sink.finish()?;
        tracing::debug!(
            frames = self.stats.frames_rendered,
            years = self.stats.years_played,
            "run complete"
        );
        Ok(self.stats)
    }
}
