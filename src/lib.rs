#![forbid(unsafe_code)]

pub mod animator;
pub mod chart;
pub mod core;
pub mod data;
pub mod ease;
pub mod error;
pub mod playback;
pub mod reconcile;
pub mod render_cpu;
pub mod scale;
pub mod sink;

pub use animator::{Animator, AnimatorOpts, RunStats, Ticker};
pub use chart::{ChartLayout, ChartScene};
pub use core::{Canvas, FrameRgba, Margins, Rgba8};
pub use data::{DEFAULT_RANK_CAP, Dataset, EntityValue, YearSnapshot};
pub use ease::Ease;
pub use error::{RankraceError, RankraceResult};
pub use playback::{PlaybackPhase, PlaybackState, progress_fraction};
pub use reconcile::blend_scenes;
pub use render_cpu::{CpuRenderer, RenderOptions};
pub use scale::{BandScale, LinearScale, Palette, TABLEAU10};
pub use sink::{FrameSink, InMemorySink, PngDirSink};
