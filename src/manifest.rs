//! reduce.toml batch manifest
//!
//! Lists the takes to reduce together with their trim points, e.g.
//!
//! ```toml
//! target_fps = 10
//!
//! [[clip]]
//! input = "TABLE_stand_grabCup_lookAtCup_drinkCup_putDownCup.bvh"
//! skip_frames_start = 1080
//! skip_frames_end = 600
//!
//! [[clip]]
//! input = "talking-gestures.bvh"
//! output = "talking.txt"
//! skip_frames_start = 9350
//! skip_frames_end = 13362
//! source_fps = 120
//! ```

use crate::decimate::{self, ReduceSummary};
use crate::types::{ReduceOptions, DEFAULT_TARGET_FPS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// reduce.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ReduceManifest {
    /// Source rate for clips that don't set one.
    /// Default: inferred from each file's `Frame Time:` header
    #[serde(default)]
    pub source_fps: Option<u32>,

    /// Target rate for clips that don't set one.
    /// Default: 10
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    #[serde(default, rename = "clip")]
    pub clips: Vec<ClipEntry>,
}

fn default_target_fps() -> u32 {
    DEFAULT_TARGET_FPS
}

/// Single take to reduce
#[derive(Debug, Deserialize)]
pub struct ClipEntry {
    pub input: PathBuf,

    /// Defaults to `<input stem>_reduced.txt` next to the input.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub skip_frames_start: usize,
    #[serde(default)]
    pub skip_frames_end: usize,
    #[serde(default)]
    pub source_fps: Option<u32>,
    #[serde(default)]
    pub target_fps: Option<u32>,
}

impl ReduceManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse reduce manifest")
    }

    /// Conversion options for a clip, falling back to the manifest-wide rates.
    pub fn options_for(&self, clip: &ClipEntry) -> ReduceOptions {
        ReduceOptions {
            skip_frames_start: clip.skip_frames_start,
            skip_frames_end: clip.skip_frames_end,
            source_fps: clip.source_fps.or(self.source_fps),
            target_fps: clip.target_fps.unwrap_or(self.target_fps),
        }
    }

    /// Input and output paths of a clip, with relative paths taken from `base_dir`.
    pub fn paths_for(&self, clip: &ClipEntry, base_dir: &Path) -> (PathBuf, PathBuf) {
        let input = base_dir.join(&clip.input);
        let output = match &clip.output {
            Some(output) => base_dir.join(output),
            None => decimate::default_output_path(&input),
        };
        (input, output)
    }

    /// Reduce every clip in order. Stops at the first failure.
    pub fn run(&self, base_dir: &Path) -> Result<Vec<ReduceSummary>> {
        if self.clips.is_empty() {
            tracing::warn!("Manifest lists no clips");
        }
        let mut summaries = Vec::with_capacity(self.clips.len());
        for clip in &self.clips {
            let (input, output) = self.paths_for(clip, base_dir);
            let summary = decimate::convert_file(&input, &output, &self.options_for(clip))
                .with_context(|| format!("Failed to reduce {}", input.display()))?;
            summaries.push(summary);
        }
        tracing::info!("Reduced {} clip(s)", summaries.len());
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_values_override_defaults() {
        let manifest = ReduceManifest::parse(
            r#"
source_fps = 120

[[clip]]
input = "a.bvh"
skip_frames_start = 600
skip_frames_end = 600

[[clip]]
input = "b.bvh"
output = "out/b.txt"
source_fps = 60
target_fps = 30
"#,
        )
        .unwrap();

        assert_eq!(manifest.clips.len(), 2);
        assert_eq!(
            manifest.options_for(&manifest.clips[0]),
            ReduceOptions {
                skip_frames_start: 600,
                skip_frames_end: 600,
                source_fps: Some(120),
                target_fps: 10,
            }
        );
        assert_eq!(
            manifest.options_for(&manifest.clips[1]),
            ReduceOptions {
                skip_frames_start: 0,
                skip_frames_end: 0,
                source_fps: Some(60),
                target_fps: 30,
            }
        );
    }

    #[test]
    fn paths_resolve_against_manifest_dir() {
        let manifest =
            ReduceManifest::parse("[[clip]]\ninput = \"a.bvh\"\n\n[[clip]]\ninput = \"b.bvh\"\noutput = \"b.txt\"\n")
                .unwrap();
        let base = Path::new("takes");
        assert_eq!(
            manifest.paths_for(&manifest.clips[0], base),
            (PathBuf::from("takes/a.bvh"), PathBuf::from("takes/a_reduced.txt"))
        );
        assert_eq!(
            manifest.paths_for(&manifest.clips[1], base),
            (PathBuf::from("takes/b.bvh"), PathBuf::from("takes/b.txt"))
        );
        // source rate left to the file header
        assert_eq!(manifest.options_for(&manifest.clips[0]).source_fps, None);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(ReduceManifest::parse("[[clip]]\ninput = \"a.bvh\"\nskip_frames_start = -1\n").is_err());
        assert!(ReduceManifest::parse("[[clip]]\nskip_frames_start = 1\n").is_err());
    }
}
