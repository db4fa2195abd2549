use crate::error::{BvhError, BvhResult};
use crate::types::ReduceParams;

/// Index step between kept frames. Validates the frame rates on the way.
pub(crate) fn __stride(params: &ReduceParams) -> BvhResult<usize> {
    let (source_fps, target_fps) = (params.source_fps, params.target_fps);
    if source_fps == 0 || target_fps == 0 {
        return Err(BvhError::ZeroFrameRate {
            source_fps,
            target_fps,
        });
    }
    if target_fps > source_fps {
        return Err(BvhError::TargetAboveSource {
            source_fps,
            target_fps,
        });
    }
    if source_fps % target_fps != 0 {
        tracing::warn!(
            "source rate {} is not a multiple of target rate {}, output will play at {:.3} fps",
            source_fps,
            target_fps,
            source_fps as f64 / (source_fps / target_fps) as f64
        );
    }
    Ok((source_fps / target_fps) as usize)
}

/// `Frame Time:` value for a given rate, always 7 decimal places.
pub(crate) fn __format_frame_time(fps: u32) -> String {
    format!("{:.7}", 1.0 / fps as f64)
}

/// Nearest whole frame rate for a `Frame Time:` value (0.0083333 -> 120).
pub(crate) fn __fps_from_frame_time(frame_time: f64) -> u32 {
    if frame_time <= 0.0 {
        return 0;
    }
    (1.0 / frame_time).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(source_fps: u32, target_fps: u32) -> ReduceParams {
        ReduceParams {
            source_fps,
            target_fps,
            ..ReduceParams::default()
        }
    }

    #[test]
    fn stride_is_integer_ratio() {
        assert_eq!(__stride(&params(120, 10)).unwrap(), 12);
        assert_eq!(__stride(&params(120, 120)).unwrap(), 1);
        // not evenly divisible, floors like integer division
        assert_eq!(__stride(&params(120, 50)).unwrap(), 2);
    }

    #[test]
    fn stride_rejects_bad_rates() {
        assert!(matches!(
            __stride(&params(0, 10)),
            Err(BvhError::ZeroFrameRate { .. })
        ));
        assert!(matches!(
            __stride(&params(120, 0)),
            Err(BvhError::ZeroFrameRate { .. })
        ));
        assert!(matches!(
            __stride(&params(30, 60)),
            Err(BvhError::TargetAboveSource { .. })
        ));
    }

    #[test]
    fn frame_time_has_seven_decimals() {
        assert_eq!(__format_frame_time(10), "0.1000000");
        assert_eq!(__format_frame_time(30), "0.0333333");
        assert_eq!(__format_frame_time(120), "0.0083333");
    }

    #[test]
    fn fps_rounds_frame_time() {
        assert_eq!(__fps_from_frame_time(0.0083333), 120);
        assert_eq!(__fps_from_frame_time(0.033333), 30);
        assert_eq!(__fps_from_frame_time(0.0), 0);
    }
}
