//! # Rendering Pipeline
//!
//! Turns a written MusicXML file into engraved output using external tools.
//!
//! ## Pipeline
//! ```text
//! score_0001.musicxml ──verovio──► score_0001.svg ──rsvg-convert──► score_0001.png
//!                     └─verovio──► score_0001.mei
//! ```
//!
//! The tools are treated as opaque. This module only passes them the layout
//! options (page fitted to content, scale 40, no header or footer), removes
//! the `<title>` elements Verovio embeds in both documents, and reports any
//! tool failure as `IncipitError::RenderError`. Nothing is retried.
//!
//! ## Related Modules
//! - `batch` - Calls a `Renderer` once per written score

use log::warn;
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::IncipitError;

/// Output format selection for the engraved first page
const SVG_ARGS: &[&str] = &["--to", "svg", "--page", "1"];
const MEI_ARGS: &[&str] = &["--to", "mei"];

/// Files produced for one score
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPiece {
    pub svg: PathBuf,
    pub mei: PathBuf,
    pub png: Option<PathBuf>,
}

/// Turns a MusicXML file into rendered files next to `stem`.
pub trait Renderer {
    /// `stem` is the output path without extension, e.g. `out/score_0001`.
    fn render(&self, musicxml: &Path, stem: &Path) -> Result<RenderedPiece, IncipitError>;
}

/// Renders with the `verovio` command line tool, then rasterizes the SVG
/// with an SVG-to-PNG converter on a white background.
#[derive(Debug, Clone, PartialEq)]
pub struct VerovioCli {
    pub verovio: PathBuf,
    /// `None` skips PNG output
    pub rasterizer: Option<PathBuf>,
    pub scale: u32,
}

impl Default for VerovioCli {
    fn default() -> Self {
        Self {
            verovio: PathBuf::from("verovio"),
            rasterizer: Some(PathBuf::from("rsvg-convert")),
            scale: 40,
        }
    }
}

impl VerovioCli {
    fn layout_args(&self) -> Vec<String> {
        vec![
            "--adjust-page-height".to_string(),
            "--adjust-page-width".to_string(),
            "--scale".to_string(),
            self.scale.to_string(),
            "--header".to_string(),
            "none".to_string(),
            "--footer".to_string(),
            "none".to_string(),
        ]
    }

    /// Full verovio command line: layout options, then `extra`, then output and input
    fn verovio_args(&self, musicxml: &Path, output: &Path, extra: &[&str]) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.layout_args().into_iter().map(OsString::from).collect();
        args.extend(extra.iter().map(OsString::from));
        args.push(OsString::from("-o"));
        args.push(output.as_os_str().to_os_string());
        args.push(musicxml.as_os_str().to_os_string());
        args
    }

    fn run_verovio(&self, musicxml: &Path, output: &Path, extra: &[&str]) -> Result<(), IncipitError> {
        let args = self.verovio_args(musicxml, output, extra);
        let args: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();
        run_tool(&self.verovio, &args)
    }
}

impl Renderer for VerovioCli {
    fn render(&self, musicxml: &Path, stem: &Path) -> Result<RenderedPiece, IncipitError> {
        let svg = stem.with_extension("svg");
        let mei = stem.with_extension("mei");

        self.run_verovio(musicxml, &svg, SVG_ARGS)?;
        self.run_verovio(musicxml, &mei, MEI_ARGS)?;

        clean_in_place(&svg)?;
        clean_in_place(&mei)?;

        let png = match &self.rasterizer {
            Some(rasterizer) => {
                let png = stem.with_extension("png");
                let args = [
                    OsStr::new("--background-color=white"),
                    OsStr::new("-o"),
                    png.as_os_str(),
                    svg.as_os_str(),
                ];
                run_tool(rasterizer, &args)?;
                Some(png)
            }
            None => None,
        };

        Ok(RenderedPiece { svg, mei, png })
    }
}

fn title_pattern() -> Result<Regex, IncipitError> {
    Regex::new(r"(?s)<title>.*?</title>").map_err(|e| IncipitError::RenderError {
        tool: "regex".to_string(),
        message: e.to_string(),
    })
}

/// Remove every `<title>...</title>` element and surrounding whitespace.
pub fn strip_titles(document: &str) -> Result<String, IncipitError> {
    Ok(title_pattern()?.replace_all(document, "").trim().to_string())
}

/// Strip titles from the file at `path`. Returns how many were removed.
fn clean_in_place(path: &Path) -> Result<usize, IncipitError> {
    let document = fs::read_to_string(path).map_err(|e| IncipitError::io(path, e))?;
    let title = title_pattern()?;
    let stripped = title.find_iter(&document).count();
    if stripped == 0 {
        warn!("{}: no <title> elements to strip", path.display());
    }
    let cleaned = title.replace_all(&document, "");
    fs::write(path, cleaned.trim()).map_err(|e| IncipitError::io(path, e))?;
    Ok(stripped)
}

fn run_tool(tool: &Path, args: &[&OsStr]) -> Result<(), IncipitError> {
    let tool_name = tool.display().to_string();
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| IncipitError::RenderError {
            tool: tool_name.clone(),
            message: e.to_string(),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(IncipitError::RenderError {
            tool: tool_name,
            message: format!("exited with {}: {}", output.status, stderr.trim()),
        });
    }
    if !stderr.trim().is_empty() {
        warn!("{}: {}", tool_name, stderr.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_titles() {
        let svg = "\n<svg><title>Verovio\nrender</title><g/></svg>\n";
        assert_eq!(strip_titles(svg).unwrap(), "<svg><g/></svg>");
    }

    #[test]
    fn test_strip_titles_non_greedy() {
        let mei = "<a><title>one</title><b/><title>two</title></a>";
        assert_eq!(strip_titles(mei).unwrap(), "<a><b/></a>");
    }

    #[test]
    fn test_missing_tool_is_a_render_error() {
        let renderer = VerovioCli {
            verovio: PathBuf::from("/nonexistent/verovio-binary"),
            rasterizer: None,
            scale: 40,
        };
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("score_0001.musicxml");
        fs::write(&xml, "<score-partwise/>").unwrap();

        match renderer.render(&xml, &dir.path().join("score_0001")) {
            Err(IncipitError::RenderError { tool, .. }) => {
                assert!(tool.contains("verovio-binary"));
            }
            other => panic!("expected RenderError, got {:?}", other),
        }
    }

    #[test]
    fn test_default_layout() {
        let renderer = VerovioCli::default();
        let args = renderer.layout_args();
        assert!(args.contains(&"--adjust-page-height".to_string()));
        assert_eq!(renderer.scale, 40);
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_verovio_svg_command_line() {
        let renderer = VerovioCli::default();
        let args = renderer.verovio_args(
            Path::new("out/s.musicxml"),
            Path::new("out/s.svg"),
            SVG_ARGS,
        );
        assert_eq!(
            strings(args),
            vec![
                "--adjust-page-height",
                "--adjust-page-width",
                "--scale",
                "40",
                "--header",
                "none",
                "--footer",
                "none",
                "--to",
                "svg",
                "--page",
                "1",
                "-o",
                "out/s.svg",
                "out/s.musicxml",
            ]
        );
    }

    #[test]
    fn test_verovio_mei_command_line() {
        let renderer = VerovioCli {
            scale: 55,
            ..VerovioCli::default()
        };
        let args = renderer.verovio_args(
            Path::new("out/s.musicxml"),
            Path::new("out/s.mei"),
            MEI_ARGS,
        );
        let args = strings(args);
        assert_eq!(
            args[args.len() - 5..].to_vec(),
            vec!["--to", "mei", "-o", "out/s.mei", "out/s.musicxml"]
        );
        assert_eq!(args[3], "55");
        assert!(!args.iter().any(|arg| arg == "--type"));
    }

    #[test]
    fn test_clean_in_place_counts_titles() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("score_0001.svg");
        fs::write(&svg, "<svg><title>a</title><g/><title>b</title></svg>\n").unwrap();

        assert_eq!(clean_in_place(&svg).unwrap(), 2);
        assert_eq!(fs::read_to_string(&svg).unwrap(), "<svg><g/></svg>");
    }

    #[test]
    fn test_clean_in_place_without_titles() {
        let dir = tempfile::tempdir().unwrap();
        let mei = dir.path().join("score_0001.mei");
        fs::write(&mei, "  <mei><music/></mei>\n").unwrap();

        assert_eq!(clean_in_place(&mei).unwrap(), 0);
        assert_eq!(fs::read_to_string(&mei).unwrap(), "<mei><music/></mei>");
    }
}
