use crate::model::{MealCategory, MealEntry};

use super::layout::{TextMeasurer, wrap_lines};
use super::page::{BLACK, DrawOp, FontId, LayoutCursor, Rgb};

/// Column starts as percentages of the usable width: item, kcal, P, C, F.
const COLUMN_PERCENT: [f32; 5] = [0.0, 65.0, 78.0, 88.0, 96.0];
const COLUMN_LABELS: [&str; 5] = ["Item", "kcal", "P", "C", "F"];
/// Name and description wrap inside this share of the usable width.
const TEXT_WIDTH_PERCENT: f32 = 62.0;

const HEADING_SIZE: f32 = 13.0;
const NAME_SIZE: f32 = 11.0;
const DESCRIPTION_SIZE: f32 = 9.0;
const NAME_PITCH: f32 = 14.0;
const DESCRIPTION_PITCH: f32 = 12.0;
const DESCRIPTION_INDENT: f32 = 6.0;
const BLOCK_PADDING: f32 = 6.0;
const ENTRY_GAP: f32 = 8.0;
const CATEGORY_GAP: f32 = 8.0;
/// Heading (18) + column labels (12) + rule (6), kept together.
const HEADING_GROUP_HEIGHT: f32 = 36.0;

const RULE_COLOR: Rgb = [0.8, 0.8, 0.8];
const DESCRIPTION_COLOR: Rgb = [0.3, 0.3, 0.3];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Columns {
    pub(super) x: [f32; 5],
    pub(super) text_width: f32,
}

impl Columns {
    /// Offsets are floored to whole units (multiply first: 500 * 0.78f32 is not 390).
    pub(super) fn for_width(margin_left: f32, usable_width: f32) -> Self {
        let share = |percent: f32| (usable_width * percent / 100.0).floor();
        Columns {
            x: COLUMN_PERCENT.map(|p| margin_left + share(p)),
            text_width: share(TEXT_WIDTH_PERCENT),
        }
    }

    fn for_page(cursor: &LayoutCursor) -> Self {
        Self::for_width(cursor.margin_left(), cursor.usable_width())
    }

    fn item(&self) -> f32 {
        self.x[0]
    }
}

/// Height of one entry: wrapped name lines, wrapped description lines and padding.
fn block_height(name_lines: usize, description_lines: usize) -> f32 {
    name_lines as f32 * NAME_PITCH + description_lines as f32 * DESCRIPTION_PITCH + BLOCK_PADDING
}

/// Empty categories draw nothing at all.
pub(super) fn layout_category(
    cursor: &mut LayoutCursor,
    category: MealCategory,
    entries: &[MealEntry],
    measurer: &dyn TextMeasurer,
) {
    if entries.is_empty() {
        return;
    }

    cursor.ensure_room(HEADING_GROUP_HEIGHT);
    let mut columns = Columns::for_page(cursor);
    let left = cursor.margin_left();

    cursor.draw_text(left, cursor.y(), category.heading(), FontId::Heading, HEADING_SIZE, BLACK);
    cursor.move_down(18.0);

    for (x, label) in columns.x.iter().zip(COLUMN_LABELS) {
        cursor.draw_text(*x, cursor.y(), label, FontId::Heading, NAME_SIZE, BLACK);
    }
    cursor.move_down(12.0);
    let rule_y = cursor.y() + 6.0;
    cursor.draw(DrawOp::Line {
        from: (left, rule_y),
        to: (cursor.right_edge(), rule_y),
        thickness: 1.0,
        color: RULE_COLOR,
    });
    cursor.move_down(6.0);

    for entry in entries {
        layout_entry(cursor, &mut columns, entry, measurer);
    }
    cursor.move_down(CATEGORY_GAP);
}

fn layout_entry(
    cursor: &mut LayoutCursor,
    columns: &mut Columns,
    entry: &MealEntry,
    measurer: &dyn TextMeasurer,
) {
    let name_lines = wrap_lines(
        &entry.name_text(),
        measurer,
        FontId::Body,
        NAME_SIZE,
        columns.text_width,
    );
    let description_lines = entry
        .description_text()
        .map(|d| wrap_lines(&d, measurer, FontId::Body, DESCRIPTION_SIZE, columns.text_width))
        .unwrap_or_default();

    let height = block_height(name_lines.len(), description_lines.len());
    if height > cursor.page_capacity() {
        log::warn!(
            "meal entry {:?} is {height:.0} units tall, more than a page holds; it will run past the bottom margin",
            entry.name_text()
        );
    }
    if cursor.ensure_room(height) {
        *columns = Columns::for_page(cursor);
    }

    let top = cursor.y();
    for line in &name_lines {
        cursor.draw_text(columns.item(), cursor.y(), line, FontId::Body, NAME_SIZE, BLACK);
        cursor.move_down(NAME_PITCH);
    }
    for line in &description_lines {
        cursor.draw_text(
            columns.item() + DESCRIPTION_INDENT,
            cursor.y(),
            line,
            FontId::Body,
            DESCRIPTION_SIZE,
            DESCRIPTION_COLOR,
        );
        cursor.move_down(DESCRIPTION_PITCH);
    }

    let numbers_y = top - 2.0;
    for (x, cell) in columns.x[1..].iter().zip(entry.nutrient_cells()) {
        cursor.draw_text(*x, numbers_y, &cell, FontId::Body, NAME_SIZE, BLACK);
    }

    cursor.move_down(ENTRY_GAP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DisplayValue;
    use crate::pdf::layout::tests::HalfEm;
    use crate::pdf::page::{MARGIN_BOTTOM, MARGIN_TOP, PAGE_HEIGHT, Page};

    fn entry(name: &str, description: Option<&str>, calories: Option<f64>) -> MealEntry {
        MealEntry {
            name: Some(DisplayValue::Text(name.to_string())),
            description: description.map(|d| DisplayValue::Text(d.to_string())),
            calories: calories.map(DisplayValue::Number),
            protein: Some(DisplayValue::Number(10.0)),
            carbs: Some(DisplayValue::Number(20.0)),
            fat: Some(DisplayValue::Number(5.5)),
        }
    }

    fn text_at(page: &Page, needle: &str) -> (f32, f32) {
        match page.find_text(needle) {
            Some(DrawOp::Text { x, y, .. }) => (*x, *y),
            _ => panic!("{needle:?} not drawn"),
        }
    }

    #[test]
    fn column_starts_follow_fixed_ratios() {
        let columns = Columns::for_width(50.0, 500.0);
        assert_eq!(columns.x, [50.0, 375.0, 440.0, 490.0, 530.0]);
        assert_eq!(columns.text_width, 310.0);

        let odd = Columns::for_width(0.0, 333.0);
        assert_eq!(odd.x, [0.0, 216.0, 259.0, 293.0, 319.0]);
        assert_eq!(odd.text_width, 206.0);
    }

    #[test]
    fn empty_category_draws_nothing() {
        let mut cursor = LayoutCursor::new();
        let y = cursor.y();
        layout_category(&mut cursor, MealCategory::Lunch, &[], &HalfEm);
        assert_eq!(cursor.y(), y);
        assert!(cursor.finish()[0].ops.is_empty());
    }

    #[test]
    fn missing_calories_render_dash_in_kcal_column() {
        let mut cursor = LayoutCursor::new();
        layout_category(
            &mut cursor,
            MealCategory::Dinner,
            &[entry("Paneer Sabzi", None, None)],
            &HalfEm,
        );
        let pages = cursor.finish();
        let (x, y) = text_at(&pages[0], "-");
        let (name_x, name_y) = text_at(&pages[0], "Paneer Sabzi");
        assert_eq!(x, 375.0);
        assert_eq!(name_x, 50.0);
        assert_eq!(y, name_y - 2.0);
        assert!(pages[0].find_text("5.5").is_some());
    }

    #[test]
    fn table_geometry_for_one_entry() {
        let mut cursor = LayoutCursor::new();
        let start = cursor.y();
        layout_category(
            &mut cursor,
            MealCategory::Breakfast,
            &[entry("Poha", Some("With peanuts"), Some(300.0))],
            &HalfEm,
        );
        let pages = cursor.finish();
        let page = &pages[0];
        assert_eq!(text_at(page, "Breakfast:"), (50.0, start));
        assert_eq!(text_at(page, "kcal"), (375.0, start - 18.0));
        assert_eq!(text_at(page, "F"), (530.0, start - 18.0));
        assert!(page.ops.iter().any(|op| matches!(
            op,
            DrawOp::Line { from, to, .. }
                if *from == (50.0, start - 24.0) && *to == (550.0, start - 24.0)
        )));
        let top = start - 36.0;
        assert_eq!(text_at(page, "Poha"), (50.0, top));
        assert_eq!(text_at(page, "With peanuts"), (56.0, top - 14.0));
        assert_eq!(text_at(page, "300"), (375.0, top - 2.0));
    }

    #[test]
    fn long_names_wrap_inside_text_column() {
        // text column is 310 wide; at 11pt HalfEm fits 56 chars
        let name = "Mixed vegetable curry with paneer cubes and a side of jeera rice";
        let mut cursor = LayoutCursor::new();
        let start = cursor.y();
        layout_category(&mut cursor, MealCategory::Lunch, &[entry(name, None, Some(480.0))], &HalfEm);
        let after = cursor.y();
        let pages = cursor.finish();
        let name_lines: Vec<&str> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, size, .. } if *size == NAME_SIZE && text.contains(' ') => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(name_lines.len(), 2);
        assert_eq!(name_lines.join(" "), name);
        // heading group + two name lines + entry gap + category gap
        assert_eq!(start - after, 36.0 + 28.0 + ENTRY_GAP + CATEGORY_GAP);
    }

    #[test]
    fn entry_block_moves_whole_to_next_page() {
        let mut cursor = LayoutCursor::new();
        // room for the heading group, then 20 units left above the margin
        cursor.move_down(PAGE_HEIGHT - MARGIN_TOP - (MARGIN_BOTTOM + 56.0));
        layout_category(
            &mut cursor,
            MealCategory::Snacks,
            &[entry("Roasted Chana", Some("Protein-rich snack"), Some(190.0))],
            &HalfEm,
        );
        let pages = cursor.finish();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].find_text("Snacks:").is_some());
        assert!(pages[0].find_text("Roasted Chana").is_none());
        let fresh_top = PAGE_HEIGHT - MARGIN_TOP;
        assert_eq!(text_at(&pages[1], "Roasted Chana"), (50.0, fresh_top));
        assert_eq!(text_at(&pages[1], "Protein-rich snack").1, fresh_top - 14.0);
        assert_eq!(text_at(&pages[1], "190"), (375.0, fresh_top - 2.0));
    }

    #[test]
    fn oversize_entry_starts_a_fresh_page_and_draws_every_line() {
        // 1000 words at 13 per wrapped line: 77 description lines, ~944 units
        let description = vec!["oats"; 1000].join(" ");
        let entries = [
            entry("Porridge", Some(description.as_str()), Some(350.0)),
            entry("Banana", None, Some(90.0)),
        ];
        let mut cursor = LayoutCursor::new();
        layout_category(&mut cursor, MealCategory::Breakfast, &entries, &HalfEm);
        let pages = cursor.finish();

        assert_eq!(pages.len(), 3);
        assert!(pages[0].find_text("Breakfast:").is_some());
        let fresh_top = PAGE_HEIGHT - MARGIN_TOP;
        assert_eq!(text_at(&pages[1], "Porridge"), (50.0, fresh_top));
        let description_lines = pages[1]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { size, .. } if *size == DESCRIPTION_SIZE))
            .count();
        assert_eq!(description_lines, 77);
        // the next entry is not squeezed under the overflow
        assert_eq!(text_at(&pages[2], "Banana"), (50.0, fresh_top));
    }

    #[test]
    fn entries_never_cross_the_bottom_margin() {
        let entries: Vec<MealEntry> = (0..60)
            .map(|i| entry(&format!("Meal {i}"), Some("Served warm"), Some(100.0 + i as f64)))
            .collect();
        let mut cursor = LayoutCursor::new();
        layout_category(&mut cursor, MealCategory::Dinner, &entries, &HalfEm);
        let pages = cursor.finish();
        assert!(pages.len() > 1);
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, size, .. } = op {
                    // last description line sits one pitch above the block bottom
                    if *size == DESCRIPTION_SIZE {
                        assert!(y - DESCRIPTION_PITCH - BLOCK_PADDING >= MARGIN_BOTTOM);
                    }
                }
            }
        }
        let drawn = pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| t.starts_with("Meal "))
            .count();
        assert_eq!(drawn, 60);
    }
}
