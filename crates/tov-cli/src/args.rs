//! Command-line definition and value parsers.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tov_core::FontWeight;

#[derive(Parser, Debug)]
#[command(name = "tov", version, about = "Render text overlays onto template backgrounds")]
pub struct Cli {
    /// Template catalog (JSON array). The built-in presets when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the catalog's templates
    Templates,
    /// Render a template or saved project to PNG
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Template ID; defaults to the last one used, then the first
    #[arg(short, long, conflicts_with = "project")]
    pub template: Option<String>,

    /// Saved project JSON to reopen
    #[arg(short, long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// Background image, overriding the template's
    #[arg(short, long, value_name = "FILE")]
    pub background: Option<PathBuf>,

    /// Font face: `FAMILY[:WEIGHT]=PATH`, or a bare PATH named after its
    /// family (e.g. `KaiTi.ttf`). Repeatable.
    #[arg(short, long = "font", value_name = "SPEC", value_parser = parse_font)]
    pub fonts: Vec<FontArg>,

    /// Layer edit `LAYER:KEY=VALUE`, e.g. `layer-1:text=Hello`. Repeatable;
    /// applied in order.
    #[arg(short, long = "set", value_name = "EDIT", value_parser = parse_edit)]
    pub edits: Vec<LayerEdit>,

    /// Editor config JSON (canvas size, history depth)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub out: PathBuf,

    /// Also write the project JSON next to the PNG
    #[arg(long)]
    pub save_project: bool,

    /// Preferences file; remembers the last template
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontArg {
    pub family: String,
    pub weight: u16,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerEdit {
    pub layer: String,
    pub key: String,
    pub value: String,
}

pub fn parse_font(spec: &str) -> Result<FontArg, String> {
    let Some((face, path)) = spec.split_once('=') else {
        let path = PathBuf::from(spec);
        let family = Path::new(spec)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("cannot name a family after `{spec}`"))?
            .to_string();
        return Ok(FontArg {
            family,
            weight: FontWeight::numeric(FontWeight::NORMAL),
            path,
        });
    };
    let (family, weight) = match face.split_once(':') {
        Some((family, weight)) => (family, FontWeight::numeric(weight)),
        None => (face, FontWeight::numeric(FontWeight::NORMAL)),
    };
    if family.trim().is_empty() || path.is_empty() {
        return Err(format!("expected FAMILY[:WEIGHT]=PATH, got `{spec}`"));
    }
    Ok(FontArg {
        family: family.trim().to_string(),
        weight,
        path: PathBuf::from(path),
    })
}

pub fn parse_edit(spec: &str) -> Result<LayerEdit, String> {
    let (layer, rest) = spec
        .split_once(':')
        .ok_or_else(|| format!("expected LAYER:KEY=VALUE, got `{spec}`"))?;
    let (key, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("expected LAYER:KEY=VALUE, got `{spec}`"))?;
    if layer.is_empty() || key.is_empty() {
        return Err(format!("expected LAYER:KEY=VALUE, got `{spec}`"));
    }
    Ok(LayerEdit {
        layer: layer.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}
