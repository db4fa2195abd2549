//! Trim and decimate the MOTION block of a .bvh file.
//!
//! Frames are selected, never blended: every kept frame line is written out exactly
//! as it appeared in the input. The HIERARCHY block is copied verbatim and only the
//! `Frames:` / `Frame Time:` header lines are rewritten.

use crate::error::{BvhError, BvhResult};
use crate::parse::split_motion;
use crate::types::{MotionSection, ReduceOptions, ReduceParams};
use crate::utils;
use std::path::{Path, PathBuf};

/// Outcome of a conversion, mostly for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceSummary {
    pub source_frames: usize,
    pub output_frames: usize,
    pub stride: usize,
}

/// Frame indices kept for a take of `num_frames` frames.
///
/// Walks `skip_frames_start..num_frames - skip_frames_end` and keeps the indices
/// that are a multiple of `stride`, stopping once `(num_frames - skips) / stride`
/// indices have been collected so the rewritten `Frames:` header always matches.
pub fn selected_frames(num_frames: usize, params: &ReduceParams) -> BvhResult<Vec<usize>> {
    let stride = utils::__stride(params)?;
    __select(num_frames, stride, params)
}

fn __select(num_frames: usize, stride: usize, params: &ReduceParams) -> BvhResult<Vec<usize>> {
    let kept = num_frames
        .checked_sub(params.skip_frames_start)
        .and_then(|rest| rest.checked_sub(params.skip_frames_end))
        .ok_or(BvhError::SkipExceedsFrames {
            skip_start: params.skip_frames_start,
            skip_end: params.skip_frames_end,
            frames: num_frames,
        })?;
    let end = num_frames - params.skip_frames_end;
    let new_frame_count = kept / stride;

    Ok((params.skip_frames_start..end)
        .filter(|i| i % stride == 0)
        .take(new_frame_count)
        .collect())
}

fn __push_line(out: &mut String, line: &str) {
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push('\n');
    }
}

fn __render(motion: &MotionSection, frames: &[usize], target_fps: u32) -> BvhResult<String> {
    let mut out = String::new();
    for line in &motion.header {
        __push_line(&mut out, line);
    }
    out.push_str(&format!("Frames: {}\n", frames.len()));
    out.push_str(&format!(
        "Frame Time: {}\n",
        utils::__format_frame_time(target_fps)
    ));

    for &i in frames {
        let line = motion
            .frame_lines
            .get(i)
            .ok_or(BvhError::FrameOutOfRange {
                index: i,
                available: motion.frame_lines.len(),
            })?;
        __push_line(&mut out, line);
    }
    out.push('\n');
    Ok(out)
}

/// Reduce a .bvh document held in memory. Returns the new document text.
pub fn decimate_str(text: &str, params: &ReduceParams) -> BvhResult<(String, ReduceSummary)> {
    let motion = split_motion(text)?;
    if motion.frame_lines.len() != motion.num_frames {
        tracing::warn!(
            "header says {} frames but {} frame lines follow",
            motion.num_frames,
            motion.frame_lines.len()
        );
    }

    let stride = utils::__stride(params)?;
    let frames = __select(motion.num_frames, stride, params)?;
    tracing::debug!(
        "stride {} over frames {}..{}, keeping {}",
        stride,
        params.skip_frames_start,
        motion.num_frames - params.skip_frames_end,
        frames.len()
    );

    let out = __render(&motion, &frames, params.target_fps)?;
    Ok((
        out,
        ReduceSummary {
            source_frames: motion.num_frames,
            output_frames: frames.len(),
            stride,
        },
    ))
}

/// `clip.bvh` -> `clip_reduced.txt`, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let is_bvh = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bvh"));
    let stem = if is_bvh {
        input.file_stem()
    } else {
        input.file_name()
    }
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
    input.with_file_name(format!("{}_reduced.txt", stem))
}

/// Resolve `options` against the document header: a missing source rate is taken
/// from `Frame Time:` (0.0083333 -> 120).
pub fn resolve_params(text: &str, options: &ReduceOptions) -> BvhResult<ReduceParams> {
    if let Some(source_fps) = options.source_fps {
        return Ok(options.resolve(source_fps));
    }
    let motion = split_motion(text)?;
    let frame_time = motion.frame_time()?;
    let source_fps = utils::__fps_from_frame_time(frame_time);
    if source_fps == 0 {
        return Err(BvhError::InvalidFrameTime(
            motion.frame_time_line.trim_end().to_string(),
        ));
    }
    tracing::debug!(
        "source rate {} fps inferred from frame time {}",
        source_fps,
        frame_time
    );
    Ok(options.resolve(source_fps))
}

/// Read `input`, reduce it and write the result to `output`, overwriting any existing file.
pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &ReduceOptions,
) -> BvhResult<ReduceSummary> {
    let text = std::fs::read_to_string(input)?;
    let params = resolve_params(&text, options)?;
    let (reduced, summary) = decimate_str(&text, &params)?;
    std::fs::write(output, reduced)?;
    tracing::info!(
        "{:?} -> {:?}: {} frames @ {} fps -> {} frames @ {} fps",
        input,
        output,
        summary.source_frames,
        params.source_fps,
        summary.output_frames,
        params.target_fps
    );
    Ok(summary)
}
