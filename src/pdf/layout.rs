use crate::model::{DietPlanDocument, MealCategory, display_or_dash};

use super::page::{BLACK, DrawOp, FontId, LayoutCursor, Page, Rgb};
use super::table::layout_category;

pub(super) const TITLE: &str = "Personalized Diet Plan";
pub(super) const LOGO_PLACEHOLDER: &str = "LOGO";
pub(super) const NOTES_HEADING: &str = "Important Notes:";
pub(super) const BULLET: &str = "\u{2022} ";

const LOGO_MAX_WIDTH: f32 = 120.0;
const LOGO_HEIGHT: f32 = 40.0;
const LOGO_TOP_OFFSET: f32 = 20.0;
const PLACEHOLDER_WIDTH: f32 = 80.0;
const PLACEHOLDER_HEIGHT: f32 = 36.0;
const PLACEHOLDER_TOP_OFFSET: f32 = 24.0;

const BODY_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 13.0;
const LINE_PITCH: f32 = 14.0;
const BULLET_GAP: f32 = 6.0;

const PROFILE_COLOR: Rgb = [0.2, 0.2, 0.2];
const PLACEHOLDER_FILL: Rgb = [0.95, 0.95, 0.95];
const PLACEHOLDER_TEXT: Rgb = [0.3, 0.3, 0.3];

/// Width of `text` set in `font` at `size` points. Must be pure: the same
/// inputs always measure the same.
pub trait TextMeasurer {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32;
}

/// Pixel size of the logo that will be embedded; drives its aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogoSize {
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Greedy word wrap. Words are whitespace-separated; a line grows until the
/// next word would push it past `max_width`. A word wider than `max_width`
/// gets a line of its own and is never split.
pub fn wrap_lines(
    text: &str,
    measurer: &dyn TextMeasurer,
    font: FontId,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measurer.text_width(&candidate, font, size) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Lay out a whole plan: header, profile summary, one table per non-empty
/// meal category, then the notes.
pub fn layout_document(
    plan: &DietPlanDocument,
    measurer: &dyn TextMeasurer,
    logo: Option<LogoSize>,
) -> Vec<Page> {
    let mut cursor = LayoutCursor::new();

    layout_header(&mut cursor, logo);
    layout_summary(&mut cursor, plan);
    for category in MealCategory::ALL {
        layout_category(&mut cursor, category, plan.sections.entries(category), measurer);
    }
    layout_notes(&mut cursor, &plan.note_bullets(), measurer);

    cursor.finish()
}

fn layout_header(cursor: &mut LayoutCursor, logo: Option<LogoSize>) {
    let x = cursor.margin_left();
    let top = cursor.page_height();
    match logo {
        Some(size) => {
            let ratio = if size.pixel_width > 0 && size.pixel_height > 0 {
                size.pixel_width as f32 / size.pixel_height as f32
            } else {
                1.0
            };
            let width = LOGO_MAX_WIDTH.min(LOGO_HEIGHT * ratio);
            cursor.draw(DrawOp::Image {
                x,
                y: top - LOGO_HEIGHT - LOGO_TOP_OFFSET,
                width,
                height: LOGO_HEIGHT,
            });
        }
        None => {
            let y = top - PLACEHOLDER_HEIGHT - PLACEHOLDER_TOP_OFFSET;
            cursor.draw(DrawOp::Rect {
                x,
                y,
                width: PLACEHOLDER_WIDTH,
                height: PLACEHOLDER_HEIGHT,
                fill: PLACEHOLDER_FILL,
            });
            cursor.draw_text(
                x + 10.0,
                y + 10.0,
                LOGO_PLACEHOLDER,
                FontId::Heading,
                12.0,
                PLACEHOLDER_TEXT,
            );
        }
    }

    let title_y = cursor.y() - 8.0;
    cursor.draw_text(x + LOGO_MAX_WIDTH, title_y, TITLE, FontId::Heading, 18.0, BLACK);
    cursor.move_down(38.0);
}

pub(super) fn profile_line(plan: &DietPlanDocument) -> Option<String> {
    let profile = plan.profile.as_ref()?;
    Some(format!(
        "Age: {}   Gender: {}   Region: {}",
        display_or_dash(profile.age.as_ref()),
        display_or_dash(profile.gender.as_ref()),
        display_or_dash(profile.region.as_ref()),
    ))
}

/// Calorie total line and, when present, the macro line.
pub(super) fn calorie_lines(plan: &DietPlanDocument) -> Option<(String, Option<String>)> {
    let summary = plan.calorie_summary()?;
    let total = format!(
        "Estimated daily calories: {}",
        display_or_dash(Some(summary.total_calories))
    );
    let macros = summary.macros.map(|m| {
        format!(
            "Protein: {}g   Carbs: {}g   Fat: {}g",
            display_or_dash(m.protein.as_ref()),
            display_or_dash(m.carbs.as_ref()),
            display_or_dash(m.fat.as_ref()),
        )
    });
    Some((total, macros))
}

fn layout_summary(cursor: &mut LayoutCursor, plan: &DietPlanDocument) {
    let x = cursor.margin_left();
    if let Some(line) = profile_line(plan) {
        cursor.draw_text(x, cursor.y(), &line, FontId::Body, BODY_SIZE, PROFILE_COLOR);
        cursor.move_down(18.0);
    }
    if let Some((total, macros)) = calorie_lines(plan) {
        cursor.draw_text(x, cursor.y(), &total, FontId::Body, BODY_SIZE, BLACK);
        cursor.move_down(16.0);
        if let Some(macros) = macros {
            cursor.draw_text(x, cursor.y(), &macros, FontId::Body, BODY_SIZE, BLACK);
            cursor.move_down(18.0);
        }
    }
}

/// Unlike meal entries, a bullet may continue onto the next page part way
/// through its wrapped lines.
fn layout_notes(cursor: &mut LayoutCursor, bullets: &[String], measurer: &dyn TextMeasurer) {
    if bullets.is_empty() {
        return;
    }

    cursor.ensure_room(16.0);
    let x = cursor.margin_left();
    cursor.draw_text(x, cursor.y(), NOTES_HEADING, FontId::Heading, HEADING_SIZE, BLACK);
    cursor.move_down(16.0);

    for bullet in bullets {
        if cursor.below_bottom() {
            cursor.advance_page();
        }
        let text = format!("{BULLET}{bullet}");
        let lines = wrap_lines(&text, measurer, FontId::Body, BODY_SIZE, cursor.usable_width());
        for (i, line) in lines.iter().enumerate() {
            if i > 0 && cursor.below_bottom() {
                cursor.advance_page();
            }
            cursor.draw_text(x, cursor.y(), line, FontId::Body, BODY_SIZE, BLACK);
            cursor.move_down(LINE_PITCH);
        }
        cursor.move_down(BULLET_GAP);
    }
}
