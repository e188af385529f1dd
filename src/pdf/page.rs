//! Page geometry, draw primitives and the layout cursor that owns them while a
//! document is being built.

pub const PAGE_WIDTH: f32 = 595.0; // A4 at 72 dpi
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN_LEFT: f32 = 50.0;
pub const MARGIN_RIGHT: f32 = 45.0;
pub const MARGIN_TOP: f32 = 50.0;
/// Nothing block-level is written below this line without a page break first.
pub const MARGIN_BOTTOM: f32 = 80.0;

pub type Rgb = [f32; 3];

pub const BLACK: Rgb = [0.0, 0.0, 0.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontId {
    Body,
    Heading,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32, // baseline
        text: String,
        font: FontId,
        size: f32,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    /// The configured logo, scaled into this box.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl Page {
    fn new(width: f32, height: f32) -> Self {
        Page {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Text runs on this page in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn find_text(&self, needle: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
    }
}

/// Write position plus the page being written. Finished pages are moved into
/// `done` and never touched again; everything is drawn through the cursor so
/// no caller can hold on to a page across a break.
pub struct LayoutCursor {
    done: Vec<Page>,
    current: Page,
    y: f32,
    margin_left: f32,
    margin_right: f32,
}

impl Default for LayoutCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCursor {
    pub fn new() -> Self {
        LayoutCursor {
            done: Vec::new(),
            current: Page::new(PAGE_WIDTH, PAGE_HEIGHT),
            y: PAGE_HEIGHT - MARGIN_TOP,
            margin_left: MARGIN_LEFT,
            margin_right: MARGIN_RIGHT,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.done.len() + 1
    }

    pub fn page_width(&self) -> f32 {
        self.current.width
    }

    pub fn page_height(&self) -> f32 {
        self.current.height
    }

    pub fn margin_left(&self) -> f32 {
        self.margin_left
    }

    /// x coordinate where the right margin starts.
    pub fn right_edge(&self) -> f32 {
        self.current.width - self.margin_right
    }

    pub fn usable_width(&self) -> f32 {
        self.current.width - self.margin_left - self.margin_right
    }

    pub fn move_down(&mut self, dy: f32) {
        self.y -= dy;
    }

    pub fn below_bottom(&self) -> bool {
        self.y < MARGIN_BOTTOM
    }

    /// Vertical space between the margins of a fresh page.
    pub fn page_capacity(&self) -> f32 {
        self.current.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.current.height - MARGIN_TOP
    }

    /// Break before a block of `height` that would cross the bottom margin.
    /// Returns true when a new page was started. A block taller than
    /// `page_capacity` never breaks from the top of a page.
    pub fn ensure_room(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN_BOTTOM && !self.at_page_top() {
            self.advance_page();
            true
        } else {
            false
        }
    }

    pub fn advance_page(&mut self) {
        let (width, height) = (self.current.width, self.current.height);
        let finished = std::mem::replace(&mut self.current, Page::new(width, height));
        self.done.push(finished);
        self.y = height - MARGIN_TOP;
        log::debug!("layout: started page {}", self.page_count());
    }

    pub fn draw(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, font: FontId, size: f32, color: Rgb) {
        self.draw(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            font,
            size,
            color,
        });
    }

    pub fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_one_page_below_top_margin() {
        let cursor = LayoutCursor::new();
        assert_eq!(cursor.page_count(), 1);
        assert_eq!(cursor.y(), PAGE_HEIGHT - MARGIN_TOP);
        assert_eq!(cursor.usable_width(), 500.0);
    }

    #[test]
    fn block_that_fits_does_not_break() {
        let mut cursor = LayoutCursor::new();
        cursor.move_down(600.0); // y = 192
        assert!(!cursor.ensure_room(112.0)); // lands exactly on the margin
        assert_eq!(cursor.page_count(), 1);
        assert_eq!(cursor.y(), 192.0);
    }

    #[test]
    fn block_that_overflows_breaks_exactly_once() {
        let mut cursor = LayoutCursor::new();
        cursor.move_down(600.0);
        cursor.draw_text(50.0, cursor.y(), "before", FontId::Body, 11.0, BLACK);
        assert!(cursor.ensure_room(113.0));
        assert_eq!(cursor.page_count(), 2);
        assert_eq!(cursor.y(), PAGE_HEIGHT - MARGIN_TOP);
        cursor.draw_text(50.0, cursor.y(), "after", FontId::Body, 11.0, BLACK);
        // a second check for the same block on the fresh page is a no-op
        assert!(!cursor.ensure_room(113.0));

        let pages = cursor.finish();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].texts().collect::<Vec<_>>(), ["before"]);
        assert_eq!(pages[1].texts().collect::<Vec<_>>(), ["after"]);
    }

    #[test]
    fn new_pages_keep_fixed_geometry() {
        let mut cursor = LayoutCursor::new();
        cursor.advance_page();
        cursor.advance_page();
        assert_eq!(cursor.page_width(), PAGE_WIDTH);
        assert_eq!(cursor.page_height(), PAGE_HEIGHT);
        assert_eq!(cursor.right_edge(), PAGE_WIDTH - MARGIN_RIGHT);
        let pages = cursor.finish();
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.width == PAGE_WIDTH && p.height == PAGE_HEIGHT));
    }

    #[test]
    fn oversize_block_does_not_leave_a_blank_page() {
        let mut cursor = LayoutCursor::new();
        assert_eq!(cursor.page_capacity(), 712.0);
        // already at the top: another page would not fit it either
        assert!(!cursor.ensure_room(900.0));
        assert_eq!(cursor.page_count(), 1);

        cursor.move_down(20.0);
        assert!(cursor.ensure_room(900.0));
        assert_eq!(cursor.page_count(), 2);
        assert!(!cursor.ensure_room(900.0));
        assert_eq!(cursor.page_count(), 2);
    }
}
