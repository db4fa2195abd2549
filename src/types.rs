use crate::error::{BvhError, BvhResult};

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type ParentIndex = isize; // can be -1 if joint has no parent
pub type Position = [f64; 3];
pub type Depth = usize;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Default source rate of the mocap takes this tool was written for.
pub const DEFAULT_SOURCE_FPS: u32 = 120;
/// Default rate frames are decimated to.
pub const DEFAULT_TARGET_FPS: u32 = 10;

/// Parameters of a single trim + decimate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceParams {
    /// Frames dropped from the beginning of the take (e.g. T-pose calibration).
    pub skip_frames_start: usize,
    /// Frames dropped from the end of the take.
    pub skip_frames_end: usize,
    pub source_fps: u32,
    pub target_fps: u32,
}

impl Default for ReduceParams {
    fn default() -> Self {
        ReduceParams {
            skip_frames_start: 0,
            skip_frames_end: 0,
            source_fps: DEFAULT_SOURCE_FPS,
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

/// Like [`ReduceParams`] but the source rate may be left out and read from the
/// file's `Frame Time:` header instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceOptions {
    pub skip_frames_start: usize,
    pub skip_frames_end: usize,
    pub source_fps: Option<u32>,
    pub target_fps: u32,
}

impl ReduceOptions {
    pub fn resolve(&self, header_fps: u32) -> ReduceParams {
        ReduceParams {
            skip_frames_start: self.skip_frames_start,
            skip_frames_end: self.skip_frames_end,
            source_fps: self.source_fps.unwrap_or(header_fps),
            target_fps: self.target_fps,
        }
    }
}

impl From<ReduceParams> for ReduceOptions {
    fn from(params: ReduceParams) -> Self {
        ReduceOptions {
            skip_frames_start: params.skip_frames_start,
            skip_frames_end: params.skip_frames_end,
            source_fps: Some(params.source_fps),
            target_fps: params.target_fps,
        }
    }
}

/// A .bvh document split at its MOTION marker. Borrows from the source text so
/// every line (line ending included) can be written back out verbatim.
#[derive(Debug)]
pub struct MotionSection<'a> {
    /// Everything up to and including the `MOTION` line.
    pub header: Vec<&'a str>,
    /// Value of the `Frames:` line.
    pub num_frames: usize,
    /// The raw `Frame Time:` line. Reducing replaces it, so it is only parsed on demand.
    pub frame_time_line: &'a str,
    /// Lines following `Frame Time:`, one per frame.
    pub frame_lines: Vec<&'a str>,
}

impl MotionSection<'_> {
    /// Value of the `Frame Time:` line, in seconds.
    pub fn frame_time(&self) -> BvhResult<f64> {
        self.frame_time_line
            .trim()
            .strip_prefix("Frame Time:")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .ok_or_else(|| {
                BvhError::InvalidFrameTime(self.frame_time_line.trim_end().to_string())
            })
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl Channel {
    pub fn from_name(name: &str) -> Option<Channel> {
        match name {
            "Xposition" => Some(Channel::Xposition),
            "Yposition" => Some(Channel::Yposition),
            "Zposition" => Some(Channel::Zposition),
            "Xrotation" => Some(Channel::Xrotation),
            "Yrotation" => Some(Channel::Yrotation),
            "Zrotation" => Some(Channel::Zrotation),
            _ => None,
        }
    }

    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            Channel::Xrotation | Channel::Yrotation | Channel::Zrotation
        )
    }
}

#[derive(Debug)]
pub struct Joint {
    pub name: String,
    pub index: Index,
    pub parent_index: ParentIndex,
    pub depth: Depth,
    pub children: Vec<Index>,
    pub offset: Position,
    pub channels: Vec<Channel>,
    pub is_leaf: bool,
    pub endsite: Option<Endsite>,
}

#[derive(Debug)]
pub struct Endsite {
    pub offset: Position,
}

#[derive(Debug)]
pub struct BvhMetadata {
    pub joints: Vec<Joint>,
    pub num_frames: usize,
    pub frame_time: f64,
    pub fps: u32,
    /// Number of frame lines actually present after the `Frame Time:` line.
    /// Can disagree with `num_frames` for truncated or hand-edited files.
    pub num_frame_lines: usize,
    /// Frame lines whose value count differs from `num_channels()`.
    pub malformed_frames: Vec<Index>,
}

impl BvhMetadata {
    /// Total number of channel values expected on each frame line.
    pub fn num_channels(&self) -> usize {
        self.joints.iter().map(|joint| joint.channels.len()).sum()
    }

    pub fn root(&self) -> Option<&Joint> {
        self.joints.iter().find(|joint| joint.parent_index == -1)
    }
}
