//! # Batch Orchestrator
//!
//! Generates a numbered series of scores into one directory.
//!
//! ## Output
//! For piece `i` (1-based) in `out_dir`:
//! - `score_{i:04}.musicxml` always
//! - `score_{i:04}.json` when `write_json` is set
//! - `score_{i:04}.svg`, `.mei`, `.png` when a renderer is configured
//! - `manifest.json` once, summarizing every piece
//!
//! Each piece draws from its own generator seeded with
//! `derive_piece_seed(seed, i)`, so piece 7 of a batch is the same score no
//! matter how many pieces come before it.
//!
//! ## Configuration
//! A YAML file with kebab-case keys, all optional:
//! ```yaml
//! count: 10
//! out-dir: output_mei_png_varied
//! seed: 1234
//! json: true
//! render:
//!   verovio: /usr/local/bin/verovio
//!   rasterizer: rsvg-convert
//!   scale: 40
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::assemble_score;
use crate::error::IncipitError;
use crate::musicxml::to_musicxml;
use crate::random::{create_rng, derive_piece_seed, entropy_seed};
use crate::render::{Renderer, VerovioCli};
use crate::score::Score;

pub const DEFAULT_COUNT: u32 = 10;
pub const DEFAULT_OUT_DIR: &str = "output_mei_png_varied";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Raw batch configuration for YAML deserialization
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawBatchConfig {
    pub count: Option<u32>,
    pub out_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub json: Option<bool>,
    pub render: Option<RawRenderConfig>,
}

/// Raw renderer settings for YAML deserialization
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawRenderConfig {
    pub verovio: Option<PathBuf>,
    pub rasterizer: Option<PathBuf>,
    /// `false` skips PNG rasterization
    pub png: Option<bool>,
    pub scale: Option<u32>,
}

impl RawBatchConfig {
    pub fn from_yaml(source: &str) -> Result<Self, IncipitError> {
        serde_yaml::from_str(source).map_err(|e| IncipitError::ConfigError(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, IncipitError> {
        let source = fs::read_to_string(path).map_err(|e| IncipitError::io(path, e))?;
        Self::from_yaml(&source)
    }

    /// Fill defaults and check values. A missing seed is drawn from OS entropy.
    pub fn resolve(self) -> Result<BatchConfig, IncipitError> {
        let count = self.count.unwrap_or(DEFAULT_COUNT);
        if count == 0 {
            return Err(IncipitError::ConfigError(
                "count must be at least 1".to_string(),
            ));
        }

        let out_dir = self
            .out_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        if out_dir.as_os_str().is_empty() {
            return Err(IncipitError::ConfigError(
                "out-dir must not be empty".to_string(),
            ));
        }

        let render = match self.render {
            Some(raw) => Some(raw.resolve()?),
            None => None,
        };

        Ok(BatchConfig {
            count,
            out_dir,
            seed: self.seed.unwrap_or_else(entropy_seed),
            write_json: self.json.unwrap_or(false),
            render,
        })
    }
}

impl RawRenderConfig {
    fn resolve(self) -> Result<VerovioCli, IncipitError> {
        let defaults = VerovioCli::default();
        let scale = self.scale.unwrap_or(defaults.scale);
        if scale == 0 {
            return Err(IncipitError::ConfigError(
                "render scale must be positive".to_string(),
            ));
        }
        let rasterizer = if self.png.unwrap_or(true) {
            self.rasterizer.or(defaults.rasterizer)
        } else {
            None
        };
        Ok(VerovioCli {
            verovio: self.verovio.unwrap_or(defaults.verovio),
            rasterizer,
            scale,
        })
    }
}

/// Validated batch settings
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub count: u32,
    pub out_dir: PathBuf,
    pub seed: u64,
    pub write_json: bool,
    pub render: Option<VerovioCli>,
}

/// One line of the manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieceSummary {
    pub stem: String,
    pub seed: u64,
    pub key_fifths: i8,
    pub time_signature: String,
    pub tempo_bpm: u16,
    pub events: usize,
    pub rests: usize,
    pub remainder_fragments: usize,
    pub rendered: bool,
}

impl PieceSummary {
    fn new(stem: String, seed: u64, score: &Score, rendered: bool) -> Self {
        Self {
            stem,
            seed,
            key_fifths: score.key_signature.fifths,
            time_signature: score.time_signature.to_string(),
            tempo_bpm: score.tempo.bpm,
            events: score.events().count(),
            rests: score.events().filter(|e| e.is_rest()).count(),
            remainder_fragments: score
                .events()
                .filter(|e| e.duration().is_remainder())
                .count(),
            rendered,
        }
    }
}

/// Everything a batch produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub base_seed: u64,
    pub out_dir: PathBuf,
    pub pieces: Vec<PieceSummary>,
}

/// File stem for piece `index` (1-based)
pub fn piece_stem(index: u32) -> String {
    format!("score_{:04}", index)
}

/// Generate piece `index` of the batch seeded with `base_seed`
pub fn generate_piece(base_seed: u64, index: u32) -> Result<(u64, Score), IncipitError> {
    let seed = derive_piece_seed(base_seed, index);
    let score = assemble_score(&mut create_rng(seed))?;
    Ok((seed, score))
}

/// MusicXML for the first piece of the batch seeded with `base_seed`,
/// identical to what `run_batch` writes to `score_0001.musicxml`.
pub fn first_piece_musicxml(base_seed: u64) -> Result<String, IncipitError> {
    let (_, score) = generate_piece(base_seed, 1)?;
    to_musicxml(&score)
}

/// Run a batch using the renderer from the configuration, if any.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport, IncipitError> {
    let renderer = config.render.as_ref().map(|r| r as &dyn Renderer);
    run_batch_with(config, renderer)
}

/// Run a batch with an explicit renderer.
pub fn run_batch_with(
    config: &BatchConfig,
    renderer: Option<&dyn Renderer>,
) -> Result<BatchReport, IncipitError> {
    fs::create_dir_all(&config.out_dir).map_err(|e| IncipitError::io(&config.out_dir, e))?;

    info!(
        "Generating {} scores into {} (seed {})",
        config.count,
        config.out_dir.display(),
        config.seed
    );

    let mut pieces = Vec::with_capacity(config.count as usize);

    for index in 1..=config.count {
        let (seed, score) = generate_piece(config.seed, index)?;
        let stem_name = piece_stem(index);
        let stem = config.out_dir.join(&stem_name);

        let xml_path = stem.with_extension("musicxml");
        let xml = to_musicxml(&score)?;
        fs::write(&xml_path, xml).map_err(|e| IncipitError::io(&xml_path, e))?;

        if config.write_json {
            let json_path = stem.with_extension("json");
            let json = serde_json::to_string_pretty(&score)?;
            fs::write(&json_path, json).map_err(|e| IncipitError::io(&json_path, e))?;
        }

        let rendered = match renderer {
            Some(renderer) => {
                renderer.render(&xml_path, &stem)?;
                true
            }
            None => false,
        };

        info!(
            "Exported {} ({}, {}, {} BPM)",
            stem_name, score.time_signature, score.key_signature, score.tempo.bpm
        );

        pieces.push(PieceSummary::new(stem_name, seed, &score, rendered));
    }

    let report = BatchReport {
        base_seed: config.seed,
        out_dir: config.out_dir.clone(),
        pieces,
    };

    let manifest_path = config.out_dir.join(MANIFEST_FILE);
    let manifest = serde_json::to_string_pretty(&report)?;
    fs::write(&manifest_path, manifest).map_err(|e| IncipitError::io(&manifest_path, e))?;

    info!("Wrote {} scores and {}", report.pieces.len(), MANIFEST_FILE);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedPiece;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Records what it was asked to render instead of running tools
    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, musicxml: &Path, stem: &Path) -> Result<RenderedPiece, IncipitError> {
            assert!(musicxml.exists());
            self.calls
                .borrow_mut()
                .push((musicxml.to_path_buf(), stem.to_path_buf()));
            Ok(RenderedPiece {
                svg: stem.with_extension("svg"),
                mei: stem.with_extension("mei"),
                png: None,
            })
        }
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _musicxml: &Path, _stem: &Path) -> Result<RenderedPiece, IncipitError> {
            Err(IncipitError::RenderError {
                tool: "verovio".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    fn config_in(dir: &Path, count: u32) -> BatchConfig {
        BatchConfig {
            count,
            out_dir: dir.to_path_buf(),
            seed: 99,
            write_json: true,
            render: None,
        }
    }

    #[test]
    fn test_piece_stem() {
        assert_eq!(piece_stem(1), "score_0001");
        assert_eq!(piece_stem(42), "score_0042");
    }

    #[test]
    fn test_batch_writes_files_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let report = run_batch(&config_in(&out, 3)).unwrap();

        assert_eq!(report.pieces.len(), 3);
        for index in 1..=3 {
            let stem = out.join(piece_stem(index));
            assert!(stem.with_extension("musicxml").exists());
            assert!(stem.with_extension("json").exists());
        }
        assert!(!out.join("score_0004.musicxml").exists());

        let manifest = fs::read_to_string(out.join(MANIFEST_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["base_seed"], 99);
        assert_eq!(parsed["pieces"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["pieces"][0]["stem"], "score_0001");
    }

    #[test]
    fn test_batch_is_reproducible_per_piece() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let short = run_batch(&config_in(a.path(), 2)).unwrap();
        let long = run_batch(&config_in(b.path(), 4)).unwrap();

        assert_eq!(short.pieces.as_slice(), &long.pieces[..2]);
        let first_a = fs::read_to_string(a.path().join("score_0002.musicxml")).unwrap();
        let first_b = fs::read_to_string(b.path().join("score_0002.musicxml")).unwrap();
        assert_eq!(first_a, first_b);
    }

    #[test]
    fn test_renderer_receives_every_piece() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let report = run_batch_with(&config_in(dir.path(), 2), Some(&renderer)).unwrap();

        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, dir.path().join("score_0002.musicxml"));
        assert_eq!(calls[1].1, dir.path().join("score_0002"));
        assert!(report.pieces.iter().all(|p| p.rendered));
    }

    #[test]
    fn test_render_failure_stops_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_batch_with(&config_in(dir.path(), 3), Some(&FailingRenderer));
        assert!(matches!(result, Err(IncipitError::RenderError { .. })));
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_yaml_config() {
        let raw = RawBatchConfig::from_yaml(
            r#"
count: 4
out-dir: pieces
seed: 1234
json: true
render:
  verovio: /opt/verovio
  png: false
"#,
        )
        .unwrap();
        let config = raw.resolve().unwrap();

        assert_eq!(config.count, 4);
        assert_eq!(config.out_dir, PathBuf::from("pieces"));
        assert_eq!(config.seed, 1234);
        assert!(config.write_json);
        assert_eq!(
            config.render,
            Some(VerovioCli {
                verovio: PathBuf::from("/opt/verovio"),
                rasterizer: None,
                scale: 40,
            })
        );
    }

    #[test]
    fn test_first_piece_matches_batch_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig {
            count: 1,
            out_dir: dir.path().to_path_buf(),
            seed: 31,
            write_json: false,
            render: None,
        };
        run_batch_with(&config, None).unwrap();

        let written = fs::read_to_string(dir.path().join("score_0001.musicxml")).unwrap();
        assert_eq!(first_piece_musicxml(31).unwrap(), written);
    }

    #[test]
    fn test_config_defaults() {
        let config = RawBatchConfig::from_yaml("seed: 5").unwrap().resolve().unwrap();
        assert_eq!(config.count, DEFAULT_COUNT);
        assert_eq!(config.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert!(!config.write_json);
        assert_eq!(config.render, None);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let zero = RawBatchConfig::from_yaml("count: 0").unwrap();
        assert!(matches!(zero.resolve(), Err(IncipitError::ConfigError(_))));

        assert!(matches!(
            RawBatchConfig::from_yaml("colour: blue"),
            Err(IncipitError::ConfigError(_))
        ));
    }
}
