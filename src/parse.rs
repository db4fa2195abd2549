use crate::error::{BvhError, BvhResult};
use crate::types::*;
use crate::utils;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RE_JOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ROOT|JOINT)\s+(\S+)").expect("joint regex is valid"));
static RE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OFFSET\s+(.+)").expect("offset regex is valid"));
static RE_CHANNELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CHANNELS\s+(\d+)\s*(.*)").expect("channels regex is valid"));

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Split a .bvh document at its `MOTION` line.
///
/// Lines keep their line endings, so `header` and `frame_lines` can be concatenated
/// back into the original text. Blank lines after the last frame are dropped.
pub fn split_motion(text: &str) -> BvhResult<MotionSection<'_>> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let motion_index = lines
        .iter()
        .position(|line| line.trim() == "MOTION")
        .ok_or(BvhError::MissingMotion)?;

    //// Frames: <n>
    let frames_line = lines
        .get(motion_index + 1)
        .ok_or(BvhError::MissingFrameCount)?;
    let num_frames = frames_line
        .trim()
        .strip_prefix("Frames:")
        .and_then(|value| value.trim().parse::<usize>().ok())
        .ok_or_else(|| BvhError::InvalidFrameCount(frames_line.trim_end().to_string()))?;

    //// Frame Time: <t>
    let frame_time_line = *lines
        .get(motion_index + 2)
        .ok_or(BvhError::MissingFrameTime)?;

    let mut frame_lines = lines[motion_index + 3..].to_vec();
    while frame_lines.last().is_some_and(|line| line.trim().is_empty()) {
        frame_lines.pop();
    }

    Ok(MotionSection {
        header: lines[..=motion_index].to_vec(),
        num_frames,
        frame_time_line,
        frame_lines,
    })
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Used during joint creation to fill in its parent index.
/// Alogirthm: searches backwards for the joint with depth 1 less than the current joint's depth.
fn __find_parent_joint_index_by_depth(
    joint_depth: Depth,
    joints: &[Joint],
    line_number: usize,
) -> BvhResult<ParentIndex> {
    // detect root joint
    if joints.is_empty() {
        return Ok(-1);
    }
    joints
        .iter()
        .rev()
        .find(|joint| joint.depth + 1 == joint_depth)
        .map(|joint| joint.index as ParentIndex)
        .ok_or_else(|| BvhError::Hierarchy {
            line: line_number,
            message: format!("no parent joint at depth {}", joint_depth.saturating_sub(1)),
        })
}

fn __parse_offset(values: &str, line_number: usize) -> BvhResult<Position> {
    let offset: Vec<f64> = values
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| BvhError::Hierarchy {
            line: line_number,
            message: format!("invalid OFFSET value: {}", e),
        })?;
    match offset.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(BvhError::Hierarchy {
            line: line_number,
            message: format!("OFFSET needs 3 values, found {}", offset.len()),
        }),
    }
}

/// Parse the HIERARCHY block (every line before `MOTION`) into a flat list of joints.
fn parse_hierarchy(header: &[&str]) -> BvhResult<Vec<Joint>> {
    let mut joints: Vec<Joint> = Vec::new();
    let mut parsing_endsite = false;
    let mut depth: Depth = 0;

    for (i, line) in header.iter().enumerate() {
        let line_number = i + 1;
        let line = line.trim();

        let hierarchy_error = |message: &str| BvhError::Hierarchy {
            line: line_number,
            message: message.to_string(),
        };

        if line.starts_with("HIERARCHY") || line.starts_with("MOTION") || line.is_empty() {
            continue;
        } else if line.starts_with("ROOT") || line.starts_with("JOINT") {
            //// Create joint
            let captures = RE_JOINT
                .captures(line)
                .ok_or_else(|| hierarchy_error("ROOT/JOINT without a name"))?;
            let name = captures[2].to_string();
            let index = joints.len();
            let parent_index = __find_parent_joint_index_by_depth(depth, &joints, line_number)?;
            //// If joint has a parent, add this joint to its parent's children
            if parent_index != -1 {
                joints[parent_index as Index].children.push(index);
            }
            joints.push(Joint {
                name,
                index,
                parent_index,
                depth,
                children: Vec::new(),
                offset: [0.0; 3],
                channels: Vec::new(),
                is_leaf: false,
                endsite: None,
            });
        } else if line.to_lowercase().starts_with("end") {
            //// Create endsite
            let joint = joints
                .last_mut()
                .ok_or_else(|| hierarchy_error("End Site before any joint"))?;
            joint.endsite = Some(Endsite { offset: [0.0; 3] });
            joint.is_leaf = true;
            parsing_endsite = true;
        } else if line == "{" {
            depth += 1;
        } else if line == "}" {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| hierarchy_error("unbalanced closing brace"))?;
            parsing_endsite = false;
        } else if let Some(captures) = RE_OFFSET.captures(line) {
            let offset = __parse_offset(&captures[1], line_number)?;
            let joint = joints
                .last_mut()
                .ok_or_else(|| hierarchy_error("OFFSET before any joint"))?;
            if parsing_endsite {
                joint.endsite = Some(Endsite { offset });
            } else {
                joint.offset = offset;
            }
        } else if let Some(captures) = RE_CHANNELS.captures(line) {
            //// Parse channels
            let declared: usize = captures[1]
                .parse()
                .map_err(|_| hierarchy_error("channel count is not a number"))?;
            let channels = captures[2]
                .split_whitespace()
                .map(|name| {
                    Channel::from_name(name)
                        .ok_or_else(|| hierarchy_error(&format!("unknown channel {:?}", name)))
                })
                .collect::<BvhResult<Vec<Channel>>>()?;
            if channels.len() != declared {
                return Err(hierarchy_error(&format!(
                    "CHANNELS declares {} channels but names {}",
                    declared,
                    channels.len()
                )));
            }
            let joint = joints
                .last_mut()
                .ok_or_else(|| hierarchy_error("CHANNELS before any joint"))?;
            joint.channels = channels;
        } else {
            return Err(hierarchy_error(&format!("unexpected line {:?}", line)));
        }
    }

    if depth != 0 {
        return Err(BvhError::Hierarchy {
            line: header.len(),
            message: format!("{} unclosed brace(s) before MOTION", depth),
        });
    }
    Ok(joints)
}

fn parse_bvh(text: &str) -> BvhResult<BvhMetadata> {
    let motion = split_motion(text)?;
    let frame_time = motion.frame_time()?;
    let joints = parse_hierarchy(&motion.header)?;

    let num_channels: usize = joints.iter().map(|joint| joint.channels.len()).sum();
    let malformed_frames: Vec<Index> = motion
        .frame_lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.split_whitespace().count() != num_channels)
        .map(|(i, _)| i)
        .collect();

    Ok(BvhMetadata {
        joints,
        num_frames: motion.num_frames,
        frame_time,
        fps: utils::__fps_from_frame_time(frame_time),
        num_frame_lines: motion.frame_lines.len(),
        malformed_frames,
    })
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file(file_path: impl AsRef<Path>) -> BvhResult<BvhMetadata> {
    let contents = std::fs::read_to_string(file_path)?;
    parse_bvh(&contents)
}

/// load a bvh file from a string
pub fn load_bvh_from_string(bvh_string: &str) -> BvhResult<BvhMetadata> {
    parse_bvh(bvh_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_JOINTS: &str = "HIERARCHY
ROOT Hips
{
\tOFFSET 0.0 0.0 0.0
\tCHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
\tJOINT Spine
\t{
\t\tOFFSET 0.0 10.5 0.0
\t\tCHANNELS 3 Zrotation Xrotation Yrotation
\t\tEnd Site
\t\t{
\t\t\tOFFSET 0.0 4.0 0.0
\t\t}
\t}
}
MOTION
Frames: 3
Frame Time: 0.0083333
0 1 2 3 4 5 6 7 8
10 11 12 13 14 15 16 17 18
20 21 22 23 24 25 26 27 28

";

    #[test]
    fn split_motion_finds_header_and_frames() {
        let motion = split_motion(TWO_JOINTS).unwrap();
        assert_eq!(motion.header.len(), 16);
        assert_eq!(motion.header.last(), Some(&"MOTION\n"));
        assert_eq!(motion.num_frames, 3);
        assert!((motion.frame_time().unwrap() - 0.0083333).abs() < 1e-12);
        // trailing blank lines are not frames
        assert_eq!(motion.frame_lines.len(), 3);
        assert_eq!(motion.frame_lines[1], "10 11 12 13 14 15 16 17 18\n");
    }

    #[test]
    fn split_motion_accepts_crlf() {
        let text = "HIERARCHY\r\nMOTION\r\nFrames: 1\r\nFrame Time: 0.1\r\n1 2 3\r\n";
        let motion = split_motion(text).unwrap();
        assert_eq!(motion.num_frames, 1);
        assert_eq!(motion.frame_lines, vec!["1 2 3\r\n"]);
    }

    #[test]
    fn split_motion_reports_missing_pieces() {
        assert!(matches!(
            split_motion("HIERARCHY\nROOT Hips\n"),
            Err(BvhError::MissingMotion)
        ));
        assert!(matches!(
            split_motion("MOTION\n"),
            Err(BvhError::MissingFrameCount)
        ));
        assert!(matches!(
            split_motion("MOTION\nFrames: lots\nFrame Time: 0.1\n"),
            Err(BvhError::InvalidFrameCount(_))
        ));
        assert!(matches!(
            split_motion("MOTION\nFrames: 2\n"),
            Err(BvhError::MissingFrameTime)
        ));
        // the frame time line is only checked once its value is asked for
        let motion = split_motion("MOTION\nFrames: 2\nFrameTime 0.1\n").unwrap();
        assert_eq!(motion.frame_time_line, "FrameTime 0.1\n");
        assert!(matches!(
            motion.frame_time(),
            Err(BvhError::InvalidFrameTime(_))
        ));
    }

    #[test]
    fn inspection_needs_a_readable_frame_time() {
        let text = TWO_JOINTS.replace("Frame Time: 0.0083333", "Frame Time: 0,0083333");
        assert!(matches!(
            load_bvh_from_string(&text),
            Err(BvhError::InvalidFrameTime(_))
        ));
    }

    #[test]
    fn hierarchy_joints_and_parents() {
        let metadata = load_bvh_from_string(TWO_JOINTS).unwrap();
        assert_eq!(metadata.joints.len(), 2);

        let hips = &metadata.joints[0];
        assert_eq!(hips.name, "Hips");
        assert_eq!(hips.parent_index, -1);
        assert_eq!(hips.children, vec![1]);
        assert_eq!(hips.channels.len(), 6);
        assert!(!hips.is_leaf);

        let spine = &metadata.joints[1];
        assert_eq!(spine.parent_index, 0);
        assert_eq!(spine.depth, 1);
        assert_eq!(spine.offset, [0.0, 10.5, 0.0]);
        assert!(spine.is_leaf);
        assert_eq!(spine.endsite.as_ref().unwrap().offset, [0.0, 4.0, 0.0]);
        assert!(spine.channels.iter().all(Channel::is_rotation));

        assert_eq!(metadata.root().unwrap().name, "Hips");
        assert_eq!(metadata.num_channels(), 9);
        assert_eq!(metadata.fps, 120);
        assert_eq!(metadata.num_frame_lines, 3);
        assert!(metadata.malformed_frames.is_empty());
    }

    #[test]
    fn short_frame_lines_are_flagged() {
        let text = TWO_JOINTS.replace("10 11 12 13 14 15 16 17 18", "10 11 12");
        let metadata = load_bvh_from_string(&text).unwrap();
        assert_eq!(metadata.malformed_frames, vec![1]);
    }

    #[test]
    fn hierarchy_errors_carry_line_numbers() {
        let text = TWO_JOINTS.replace("CHANNELS 3 Zrotation", "CHANNELS 4 Zrotation");
        match load_bvh_from_string(&text) {
            Err(BvhError::Hierarchy { line, .. }) => assert_eq!(line, 9),
            other => panic!("expected hierarchy error, got {:?}", other),
        }

        let text = TWO_JOINTS.replace("Yrotation\n\t\tEnd", "Wrotation\n\t\tEnd");
        assert!(matches!(
            load_bvh_from_string(&text),
            Err(BvhError::Hierarchy { .. })
        ));
    }
}
