//! `tov`: headless text overlay renderer.
//!
//! Usage:
//!   tov templates
//!   tov render -t 3 --set layer-1:text=Hello -f KaiTi=kaiti.ttf -b photo.jpg -o out/
//!   tov render -p project_1718000000000.json -o out/ --save-project

mod args;

use anyhow::{Context, Result, bail};
use args::{Cli, Command, RenderArgs};
use clap::Parser;
use image::RgbaImage;
use std::path::Path;
use tov_core::{LayerId, LayerPatch, ProjectSnapshot, TemplateCatalog, TemplateId};
use tov_editor::adapters::{DirectoryPersistence, FixedPicker, JsonFileSettings, MemorySettings};
use tov_editor::{AppPreferences, BackgroundRequest, EditingSession, EditorConfig, SettingsStore};
use tov_render::{FontBook, LoadError, SoftwareRasterizer, load_image_file};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Command::Templates => {
            for template in catalog.iter() {
                println!(
                    "{:<6} {:<20} {} layer(s)  {}",
                    template.id.as_str(),
                    template.name,
                    template.layers.len(),
                    template.background
                );
            }
            Ok(())
        }
        Command::Render(args) => render(catalog, args),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<TemplateCatalog> {
    let Some(path) = path else {
        return Ok(TemplateCatalog::builtin());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    TemplateCatalog::from_json(&json).with_context(|| format!("parsing catalog {}", path.display()))
}

fn render(catalog: TemplateCatalog, args: RenderArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EditorConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EditorConfig::default(),
    };
    let mut settings: Box<dyn SettingsStore> = match &args.settings {
        Some(path) => Box::new(JsonFileSettings::open(path)),
        None => Box::new(MemorySettings::new()),
    };
    let mut prefs = AppPreferences::load(settings.as_ref());

    let (width, height) = config.canvas_size();
    let mut session: EditingSession<RgbaImage> = EditingSession::new(catalog, config);

    // Pick what to open: a saved project, an explicit template, or the
    // remembered one.
    let mut request = session.background_request().cloned();
    if let Some(path) = &args.project {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading project {}", path.display()))?;
        let snapshot = ProjectSnapshot::from_json(&json)
            .with_context(|| format!("parsing project {}", path.display()))?;
        request = Some(open(&mut session, |s| s.restore(snapshot))?);
    } else if let Some(id) = &args.template {
        let id = TemplateId::new(id.as_str());
        request = Some(open(&mut session, |s| s.select_template(&id))?);
    } else if let Some(id) = remembered_template(session.catalog(), prefs.last_template.as_deref()) {
        request = Some(open(&mut session, |s| s.select_template(&id))?);
    }
    if let Some(path) = &args.background {
        let picked = path.display().to_string();
        request = session.choose_background(&mut FixedPicker::new(picked));
    }
    if let Some(request) = request {
        deliver_background(&mut session, &request);
    }

    for edit in &args.edits {
        let Some(id) = LayerId::get(&edit.layer).filter(|id| session.layers().contains(*id)) else {
            bail!(
                "no layer `{}` in template `{}`",
                edit.layer,
                session.template().id
            );
        };
        let mut patch = LayerPatch::default();
        patch
            .set_field(&edit.key, &edit.value)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("editing layer `{}`", edit.layer))?;
        session.update_layer(id, &patch);
    }

    let mut fonts = FontBook::new();
    for font in &args.fonts {
        fonts
            .add_font_file(&font.family, font.weight, &font.path)
            .with_context(|| format!("loading font {}", font.path.display()))?;
    }
    if fonts.is_empty() {
        log::warn!("no fonts given (--font); text will not be drawn");
    }
    let mut raster = SoftwareRasterizer::new(width, height, fonts);
    let mut persistence = DirectoryPersistence::new(args.out.clone());

    let exported = session.export_frame(&mut raster, &mut persistence);
    report(&mut session);
    let record = exported.context("export failed")?;
    println!("{}", args.out.join(&record.file_name).display());

    if args.save_project {
        if !session.save_project(&mut persistence) {
            report(&mut session);
            bail!("could not save the project to {}", args.out.display());
        }
        if let Some(path) = persistence.last_saved() {
            println!("{}", path.display());
        }
    }

    prefs.last_template = Some(session.template().id.to_string());
    if !prefs.save(settings.as_mut()) {
        log::warn!("preferences were not saved");
    }
    Ok(())
}

/// The remembered template, if the catalog still has it. Otherwise the
/// session stays on the catalog's first template.
fn remembered_template(catalog: &TemplateCatalog, last: Option<&str>) -> Option<TemplateId> {
    let id = TemplateId::new(last?);
    if catalog.get(&id).is_some() {
        Some(id)
    } else {
        log::warn!("remembered template `{id}` is not in the catalog; using the first");
        None
    }
}

fn open<F>(session: &mut EditingSession<RgbaImage>, action: F) -> Result<BackgroundRequest>
where
    F: FnOnce(&mut EditingSession<RgbaImage>) -> Option<BackgroundRequest>,
{
    match action(session) {
        Some(request) => Ok(request),
        None => {
            let reason = session
                .drain_notices()
                .into_iter()
                .map(|n| n.message)
                .collect::<Vec<_>>()
                .join("; ");
            bail!("{reason}")
        }
    }
}

/// Decode a background from the local filesystem. Remote URLs cannot be
/// fetched here; the frame is rendered without them.
fn deliver_background(session: &mut EditingSession<RgbaImage>, request: &BackgroundRequest) {
    let result = if request.source.starts_with("http://") || request.source.starts_with("https://") {
        Err(LoadError::Unavailable(format!(
            "{} is remote; pass --background",
            request.source
        )))
    } else {
        load_image_file(&request.source)
    };
    session.background_loaded(request.generation, result);
}

fn report(session: &mut EditingSession<RgbaImage>) {
    for notice in session.drain_notices() {
        if notice.is_error() {
            eprintln!("{notice}");
        } else {
            log::info!("{notice}");
        }
    }
}
