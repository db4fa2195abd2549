use thiserror::Error;

/// Everything that can go wrong while reading or reducing a .bvh file.
#[derive(Debug, Error)]
pub enum BvhError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no MOTION line found")]
    MissingMotion,
    #[error("expected `Frames: <n>` after MOTION, found end of file")]
    MissingFrameCount,
    #[error("invalid frame count line: {0:?}")]
    InvalidFrameCount(String),
    #[error("expected `Frame Time: <t>` after the frame count")]
    MissingFrameTime,
    #[error("invalid frame time line: {0:?}")]
    InvalidFrameTime(String),
    #[error("frame {index} requested but only {available} frame lines are present")]
    FrameOutOfRange { index: usize, available: usize },
    #[error("frame rates must be positive (source {source_fps}, target {target_fps})")]
    ZeroFrameRate { source_fps: u32, target_fps: u32 },
    #[error("target frame rate {target_fps} is above source frame rate {source_fps}")]
    TargetAboveSource { source_fps: u32, target_fps: u32 },
    #[error("skipping {skip_start} + {skip_end} frames exceeds the {frames} frames in the file")]
    SkipExceedsFrames {
        skip_start: usize,
        skip_end: usize,
        frames: usize,
    },
    #[error("hierarchy error on line {line}: {message}")]
    Hierarchy { line: usize, message: String },
}

pub type BvhResult<T> = Result<T, BvhError>;
