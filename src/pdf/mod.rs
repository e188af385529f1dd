mod layout;
mod page;
mod table;

use std::collections::HashSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::assets::{Assets, LogoData, LogoImage};
use crate::error::Error;
use crate::fonts::FontSet;
use crate::model::{DietPlanDocument, MealCategory};

pub use layout::{LogoSize, TextMeasurer, layout_document, wrap_lines};
pub use page::{
    DrawOp, FontId, LayoutCursor, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT, MARGIN_TOP,
    PAGE_HEIGHT, PAGE_WIDTH, Page, Rgb,
};

const LOGO_XOBJECT: &str = "Im1";

fn to_i32(value: impl TryInto<i32>, what: &str) -> Result<i32, Error> {
    value
        .try_into()
        .map_err(|_| Error::Pdf(format!("{what} does not fit a PDF integer")))
}

/// Every character the layout can draw for this plan, so an embedded font
/// subset covers all of it.
fn collect_used_chars(plan: &DietPlanDocument) -> HashSet<char> {
    let mut strings: Vec<String> = vec![
        layout::TITLE.to_string(),
        layout::LOGO_PLACEHOLDER.to_string(),
        layout::NOTES_HEADING.to_string(),
        layout::BULLET.to_string(),
        "Item kcal P C F -".to_string(),
        "0123456789.-+e".to_string(),
    ];
    strings.extend(MealCategory::ALL.iter().map(|c| c.heading().to_string()));
    strings.extend(layout::profile_line(plan));
    if let Some((total, macros)) = layout::calorie_lines(plan) {
        strings.push(total);
        strings.extend(macros);
    }
    for category in MealCategory::ALL {
        for entry in plan.sections.entries(category) {
            strings.push(entry.name_text());
            strings.extend(entry.description_text());
            strings.extend(entry.nutrient_cells());
        }
    }
    strings.extend(plan.note_bullets());

    strings.iter().flat_map(|s| s.chars()).collect()
}

fn embed_logo(
    pdf: &mut Pdf,
    logo: &LogoImage,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Ref, Error> {
    let width = to_i32(logo.pixel_width, "logo width")?;
    let height = to_i32(logo.pixel_height, "logo height")?;
    let xobj_ref = alloc();

    match &logo.data {
        LogoData::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(width);
            xobj.height(height);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        LogoData::Rgb { deflated, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(width);
                mask.height(height);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, deflated);
            xobj.filter(Filter::FlateDecode);
            xobj.width(width);
            xobj.height(height);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Ok(xobj_ref)
}

fn page_content(page: &Page, fonts: &FontSet, logo: Option<&str>) -> Content {
    let mut content = Content::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                color,
            } => {
                let entry = fonts.entry(*font);
                content.set_fill_rgb(color[0], color[1], color[2]);
                content.begin_text();
                content.set_font(Name(entry.pdf_name.as_bytes()), *size);
                content.next_line(*x, *y);
                content.show(Str(&entry.encode(text)));
                content.end_text();
            }
            DrawOp::Line {
                from,
                to,
                thickness,
                color,
            } => {
                content.save_state();
                content.set_stroke_rgb(color[0], color[1], color[2]);
                content.set_line_width(*thickness);
                content.move_to(from.0, from.1);
                content.line_to(to.0, to.1);
                content.stroke();
                content.restore_state();
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                content.save_state();
                content.set_fill_rgb(fill[0], fill[1], fill[2]);
                content.rect(*x, *y, *width, *height).fill_nonzero();
                content.restore_state();
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
            } => {
                // layout only places an image when one was embedded
                if let Some(name) = logo {
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }
        }
    }
    content
}

pub(crate) fn render(plan: &DietPlanDocument, assets: &Assets) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: fonts, subset to what the plan uses
    let used_chars = collect_used_chars(plan);
    let fonts = FontSet::register(&mut pdf, assets.font.as_deref(), &used_chars, &mut alloc);
    let t_fonts = t0.elapsed();

    // Phase 2: logo
    let logo_ref = match &assets.logo {
        Some(logo) => Some(embed_logo(&mut pdf, logo, &mut alloc)?),
        None => None,
    };
    let logo_size = assets
        .logo
        .as_ref()
        .filter(|_| logo_ref.is_some())
        .map(LogoImage::size);
    let t_images = t0.elapsed();

    // Phase 3: layout
    let pages = layout_document(plan, &fonts, logo_size);
    let t_layout = t0.elapsed();

    // Phase 4: serialize
    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let logo_name = logo_ref.map(|_| LOGO_XOBJECT);

    for (page, &content_id) in pages.iter().zip(&content_ids) {
        let raw = page_content(page, &fonts, logo_name).finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(to_i32(n, "page count")?);

    for (i, page_data) in pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_data.width, page_data.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for entry in fonts.entries() {
                font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
            }
        }
        if let Some(xobj_ref) = logo_ref {
            resources
                .x_objects()
                .pair(Name(LOGO_XOBJECT.as_bytes()), xobj_ref);
        }
    }
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: font_embed={:.1}ms, images={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} pages, embedded font: {})",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_images).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
        fonts.is_embedded(),
    );

    Ok(pdf.finish())
}
