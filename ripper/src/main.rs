//! Ripper.
//!
//! Watches the game window and tells the user what to click until the
//! achievements screen is ready for a guided scan.

mod assets;
mod capture;
mod config;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use data::CategorySchema;
use guide::detect::AnchorCatalog;
use guide::{GuideRuntime, Phase, Pipeline, RuntimeUpdate};

fn load_schema(cfg: &config::Config) -> Result<CategorySchema> {
    match &cfg.schema_path {
        Some(path) => CategorySchema::load(path),
        None => Ok(CategorySchema::bundled()),
    }
}

/// A missing anchor folder only costs the template tier; text still works.
fn load_catalog(cfg: &config::Config) -> AnchorCatalog {
    match assets::resolve_anchor_dir(cfg.assets_dir.as_deref()).and_then(AnchorCatalog::load_dir) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::warn!(error = %err, "no anchors loaded; relying on text recognition");
            AnchorCatalog::empty()
        }
    }
}

/// Log every instruction change once; per-frame details go to debug.
fn reporter() -> impl FnMut(&RuntimeUpdate) + 'static {
    let mut last: Option<(Phase, String)> = None;
    move |update: &RuntimeUpdate| {
        tracing::debug!(
            tokens = update.frame_stats.token_count,
            unchanged = update.frame_stats.unchanged_from_previous,
            signature = %update.frame_stats.frame_signature,
            anchors = ?update.frame_stats.matched_anchors,
            total_ms = ?update.telemetry.total_ms,
            "frame evaluated"
        );

        let current = (update.phase, update.instruction.message.clone());
        if last.as_ref() == Some(&current) {
            return;
        }
        tracing::info!(
            phase = %update.phase,
            state = %update.state,
            highlight = ?update.instruction.highlight.map(|r| r.to_string()),
            "{}",
            update.instruction.message
        );
        last = Some(current);
    }
}

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = config::Config::load_or_default();
    if let Ok(path) = config::Config::path()
        && !path.exists()
        && let Err(err) = cfg.save()
    {
        tracing::warn!(error = %err, "failed to write default config");
    }

    let schema = load_schema(&cfg).context("load category schema")?;
    let catalog = load_catalog(&cfg);

    let ocr_assets = assets::resolve_ocr_assets(cfg.assets_dir.as_deref(), &cfg.ocr_language)?;
    let ocr = ie::Ocr::try_new(&ocr_assets.detection, &ocr_assets.recognition, &ocr_assets.charset)?;
    let window = capture::WindowCapture::new(cfg.app_name.clone(), cfg.max_capture_height, ocr);

    let pipeline = Pipeline::new(Arc::new(catalog), Arc::new(schema), cfg.guide.clone());
    let mut runtime = GuideRuntime::new(move || window.capture_frame(), pipeline);
    let _subscription = runtime.subscribe(reporter());

    tracing::info!(window = %cfg.app_name, tick = ?runtime.base_tick(), "watching");
    loop {
        runtime.poll_once(Instant::now());
        std::thread::sleep(runtime.base_tick());
    }
}
