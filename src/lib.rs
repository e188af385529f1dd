mod assets;
mod error;
mod fonts;
mod model;
mod pdf;
#[cfg(feature = "server")]
pub mod server;

pub use assets::{AssetConfig, Assets, FONT_ENV, LOGO_ENV, LogoImage};
pub use error::Error;
pub use fonts::BuiltinMetrics;
pub use model::{
    CalorieSummary, DietPlanDocument, DisplayValue, Macros, MealCategory, MealEntry,
    MealSections, Notes, Profile, display_or_dash,
};
pub use pdf::{
    DrawOp, FontId, LayoutCursor, LogoSize, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT, MARGIN_TOP,
    PAGE_HEIGHT, PAGE_WIDTH, Page, Rgb, TextMeasurer, layout_document, wrap_lines,
};

use std::path::Path;
use std::time::Instant;

/// Render an already parsed plan to PDF bytes.
pub fn render_plan(plan: &DietPlanDocument, assets: &Assets) -> Result<Vec<u8>, Error> {
    pdf::render(plan, assets)
}

/// Parse a JSON plan and render it.
pub fn render_plan_json(input: &[u8], assets: &Assets) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let plan = DietPlanDocument::from_json(input)?;
    let t_parse = t0.elapsed();

    let bytes = pdf::render(&plan, assets)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}

pub fn convert_plan_json_to_pdf(
    input: &Path,
    output: &Path,
    config: &AssetConfig,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let json = std::fs::read(input).map_err(Error::Io)?;
    let assets = Assets::load(config);
    let t_load = t0.elapsed();

    let bytes = render_plan_json(&json, &assets)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_render - t_load).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
