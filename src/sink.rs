use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::core::FrameRgba;
use crate::error::{RankraceError, RankraceResult};

/// Destination for rendered frames, consumed in playback order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &FrameRgba) -> RankraceResult<()>;

    /// Called once after the last frame. Default is a no-op.
    fn finish(&mut self) -> RankraceResult<()> {
        Ok(())
    }
}

/// Writes each frame as `frame_00000.png`, `frame_00001.png`, ... into a
/// directory, creating it on first use.
pub struct PngDirSink {
    dir: PathBuf,
    next_index: usize,
}

impl PngDirSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            next_index: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.next_index
    }

    fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngDirSink {
    fn write_frame(&mut self, frame: &FrameRgba) -> RankraceResult<()> {
        if frame.data.len() != frame.expected_len() {
            return Err(RankraceError::render(format!(
                "frame byte length {} does not match {}x{} rgba8",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        if self.next_index == 0 {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        }
        let path = self.frame_path(self.next_index);
        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        self.next_index += 1;
        Ok(())
    }
}

/// Keeps every frame in memory; used by tests and the library API.
#[derive(Default)]
pub struct InMemorySink {
    pub frames: Vec<FrameRgba>,
    pub finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for InMemorySink {
    fn write_frame(&mut self, frame: &FrameRgba) -> RankraceResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> RankraceResult<()> {
        self.finished = true;
        Ok(())
    }
}
