use std::collections::{HashMap, HashSet};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::pdf::{FontId, TextMeasurer};

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
    pub(crate) char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// Width of a single character in 1000-units. Uses the per-char cache (covers
    /// all chars seen in the plan), falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Bytes for a `Tj` operand: glyph ids for embedded fonts, WinAnsi otherwise.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    fn base_font(self) -> &'static [u8] {
        match self {
            BuiltinFont::Helvetica => b"Helvetica",
            BuiltinFont::HelveticaBold => b"Helvetica-Bold",
        }
    }

    fn widths(self) -> Vec<f32> {
        helvetica_widths(self == BuiltinFont::HelveticaBold)
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes; unmappable chars are dropped
/// (they also measure as zero width).
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Helvetica advance widths (AFM) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_ASCII: [f32; 95] = [
    278., 278., 355., 556., 556., 889., 667., 191., 333., 333., 389., 584., 278., 333., 278., 278.,
    556., 556., 556., 556., 556., 556., 556., 556., 556., 556.,
    278., 278., 584., 584., 584., 556., 1015.,
    667., 667., 722., 722., 667., 611., 778., 722., 278., 500., 667., 556., 833.,
    722., 778., 667., 778., 722., 667., 611., 722., 667., 944., 667., 667., 611.,
    278., 278., 278., 469., 556., 333.,
    556., 556., 500., 556., 556., 278., 556., 556., 222., 222., 500., 222., 833.,
    556., 556., 556., 556., 333., 500., 278., 556., 500., 722., 500., 500., 500.,
    334., 260., 334., 584.,
];

/// Helvetica-Bold advance widths (AFM) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [f32; 95] = [
    278., 333., 474., 556., 556., 889., 722., 238., 333., 333., 389., 584., 278., 333., 278., 278.,
    556., 556., 556., 556., 556., 556., 556., 556., 556., 556.,
    333., 333., 584., 584., 584., 611., 975.,
    722., 722., 722., 722., 667., 611., 778., 722., 278., 556., 722., 611., 833.,
    722., 778., 667., 778., 722., 667., 611., 722., 667., 944., 667., 667., 611.,
    333., 278., 333., 584., 556., 333.,
    556., 611., 556., 611., 556., 333., 611., 611., 278., 278., 556., 278., 889.,
    611., 611., 611., 611., 389., 556., 333., 611., 556., 778., 556., 556., 500.,
    389., 280., 389., 584.,
];

/// Widths at 1000 units/em for WinAnsi bytes 32..=255. ASCII is exact; the
/// upper half is exact for the punctuation plans actually use and 556 otherwise.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let ascii = if bold {
        &HELVETICA_BOLD_ASCII
    } else {
        &HELVETICA_ASCII
    };
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize],
            0x85 | 0x97 => 1000.0,               // ellipsis, em dash
            0x95 => 350.0,                       // bullet
            0x91 | 0x92 if bold => 278.0,        // single quotes
            0x91 | 0x92 => 222.0,
            0x93 | 0x94 if bold => 500.0,        // double quotes
            0x93 | 0x94 => 333.0,
            0xA0 => 278.0,                       // no-break space
            0xB0 => 400.0,                       // degree
            0xBD => 834.0,                       // one half
            _ => 556.0,
        })
        .collect()
}

fn winansi_width(widths: &[f32], text: &str, size: f32) -> f32 {
    text.chars()
        .map(|ch| {
            let byte = char_to_winansi(ch);
            if byte >= 32 {
                widths[(byte - 32) as usize]
            } else {
                0.0
            }
        })
        .sum::<f32>()
        * size
        / 1000.0
}

/// Metrics of the built-in Helvetica pair used when no custom font is
/// configured; body text is Helvetica, headings Helvetica-Bold.
pub struct BuiltinMetrics {
    regular: Vec<f32>,
    bold: Vec<f32>,
}

impl Default for BuiltinMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinMetrics {
    pub fn new() -> Self {
        BuiltinMetrics {
            regular: helvetica_widths(false),
            bold: helvetica_widths(true),
        }
    }
}

impl TextMeasurer for BuiltinMetrics {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32 {
        let widths = match font {
            FontId::Body => &self.regular,
            FontId::Heading => &self.bold,
        };
        winansi_width(widths, text, size)
    }
}

/// Converts font design units to the 1000-unit glyph space PDF widths use.
#[derive(Clone, Copy)]
struct GlyphScale(f32);

impl GlyphScale {
    fn of(face: &Face) -> Self {
        GlyphScale(1000.0 / face.units_per_em() as f32)
    }

    fn apply(self, units: impl Into<f32>) -> f32 {
        units.into() * self.0
    }

    fn advance(self, face: &Face, ch: char) -> Option<(ttf_parser::GlyphId, f32)> {
        let gid = face.glyph_index(ch)?;
        let width = face.glyph_hor_advance(gid).map_or(0.0, |adv| self.apply(adv));
        Some((gid, width))
    }
}

/// Glyphs kept in the subset, renumbered in first-use order.
struct SubsetGlyphs {
    remapper: subsetter::GlyphRemapper,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

impl SubsetGlyphs {
    fn collect(face: &Face, scale: GlyphScale, used_chars: &HashSet<char>) -> Self {
        let mut remapper = subsetter::GlyphRemapper::new();
        let mut char_to_gid = HashMap::new();
        let mut char_widths_1000 = HashMap::new();
        for &ch in used_chars {
            if let Some((gid, width)) = scale.advance(face, ch) {
                char_to_gid.insert(ch, remapper.remap(gid.0));
                char_widths_1000.insert(ch, width);
            }
        }
        SubsetGlyphs {
            remapper,
            char_to_gid,
            char_widths_1000,
        }
    }

    /// `(new gid, width)` sorted by gid, for the CIDFont `W` array.
    fn widths_by_gid(&self) -> Vec<(u16, f32)> {
        let mut widths: Vec<(u16, f32)> = self
            .char_to_gid
            .iter()
            .map(|(ch, &gid)| (gid, self.char_widths_1000[ch]))
            .collect();
        widths.sort_by_key(|&(gid, _)| gid);
        widths
    }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

fn write_descriptor(
    pdf: &mut Pdf,
    descriptor_ref: Ref,
    file_ref: Ref,
    ps_name: &str,
    face: &Face,
    scale: GlyphScale,
) {
    let bb = face.global_bounding_box();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            scale.apply(bb.x_min),
            scale.apply(bb.y_min),
            scale.apply(bb.x_max),
            scale.apply(bb.y_max),
        ))
        .italic_angle(0.0)
        .ascent(scale.apply(face.ascender()))
        .descent(scale.apply(face.descender()))
        .cap_height(face.capital_height().map_or(700.0, |h| scale.apply(h)))
        .stem_v(80.0)
        .font_file2(file_ref);
}

/// Embed a TrueType face as a Type0 font (Identity-H, ToUnicode CMap) holding
/// only the glyphs this document draws. `None` when the bytes are not a font.
fn embed_custom_font(
    pdf: &mut Pdf,
    font_data: &[u8],
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<FontEntry> {
    let face = Face::parse(font_data, 0).ok()?;
    let family = font_family_name(&face).unwrap_or_else(|| "CustomFont".to_string());
    let ps_name: String = family.chars().filter(|c| !c.is_whitespace()).collect();
    let scale = GlyphScale::of(&face);
    let glyphs = SubsetGlyphs::collect(&face, scale, used_chars);

    let font_file = subsetter::subset(font_data, 0, &glyphs.remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {family}: {e}, embedding full font");
        font_data.to_vec()
    });
    let file_len = i32::try_from(font_file.len()).ok()?;

    let font_ref = alloc();
    let cid_font_ref = alloc();
    let descriptor_ref = alloc();
    let file_ref = alloc();
    let to_unicode_ref = alloc();

    pdf.stream(file_ref, &font_file)
        .pair(Name(b"Length1"), file_len);
    write_descriptor(pdf, descriptor_ref, file_ref, &ps_name, &face, scale);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2)
            .base_font(Name(ps_name.as_bytes()))
            .system_info(identity_system_info())
            .font_descriptor(descriptor_ref)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        let widths = glyphs.widths_by_gid();
        if !widths.is_empty() {
            let mut w = cid.widths();
            for (gid, width) in widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap =
        pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &gid) in &glyphs.char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(to_unicode_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(to_unicode_ref);

    log::debug!(
        "embedded {family}: {} of {} glyphs, {} bytes",
        glyphs.char_to_gid.len(),
        face.number_of_glyphs(),
        font_file.len()
    );

    // chars missing from the subset still measure against the face
    let widths_1000 = (32u8..=255u8)
        .map(|byte| scale.advance(&face, winansi_to_char(byte)).map_or(0.0, |(_, w)| w))
        .collect();

    Some(FontEntry {
        pdf_name: "F1".to_string(),
        font_ref,
        widths_1000,
        char_to_gid: Some(glyphs.char_to_gid),
        char_widths_1000: Some(glyphs.char_widths_1000),
    })
}

fn register_builtin(
    pdf: &mut Pdf,
    font: BuiltinFont,
    pdf_name: &str,
    alloc: &mut impl FnMut() -> Ref,
) -> FontEntry {
    let font_ref = alloc();
    pdf.type1_font(font_ref)
        .base_font(Name(font.base_font()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    FontEntry {
        pdf_name: pdf_name.to_string(),
        font_ref,
        widths_1000: font.widths(),
        char_to_gid: None,
        char_widths_1000: None,
    }
}

/// The fonts one document is set in. A custom font serves both roles;
/// otherwise body and headings get their own built-in face.
pub(crate) struct FontSet {
    body: FontEntry,
    heading: Option<FontEntry>,
}

impl FontSet {
    pub(crate) fn register(
        pdf: &mut Pdf,
        custom_font: Option<&[u8]>,
        used_chars: &HashSet<char>,
        alloc: &mut impl FnMut() -> Ref,
    ) -> FontSet {
        let t0 = std::time::Instant::now();

        if let Some(data) = custom_font {
            if let Some(body) = embed_custom_font(pdf, data, used_chars, alloc) {
                log::debug!(
                    "register fonts: custom TrueType → {:.1}ms",
                    t0.elapsed().as_secs_f64() * 1000.0
                );
                return FontSet {
                    body,
                    heading: None,
                };
            }
            log::warn!("Custom font could not be parsed, using Helvetica");
        }

        let body = register_builtin(pdf, BuiltinFont::Helvetica, "F1", alloc);
        let heading = register_builtin(pdf, BuiltinFont::HelveticaBold, "F2", alloc);
        FontSet {
            body,
            heading: Some(heading),
        }
    }

    pub(crate) fn entry(&self, font: FontId) -> &FontEntry {
        match font {
            FontId::Body => &self.body,
            FontId::Heading => self.heading.as_ref().unwrap_or(&self.body),
        }
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &FontEntry> {
        std::iter::once(&self.body).chain(self.heading.as_ref())
    }

    pub(crate) fn is_embedded(&self) -> bool {
        self.body.char_to_gid.is_some()
    }
}

impl TextMeasurer for FontSet {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32 {
        self.entry(font).text_width(text, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> impl FnMut() -> Ref {
        let mut next_id = 1i32;
        move || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        }
    }

    #[test]
    fn helvetica_measures_from_afm_widths() {
        let metrics = BuiltinMetrics::new();
        // "Item" = 278 + 278 + 556 + 833
        assert!((metrics.text_width("Item", FontId::Body, 10.0) - 19.45).abs() < 1e-4);
        assert!(
            metrics.text_width("Item", FontId::Heading, 10.0)
                > metrics.text_width("Item", FontId::Body, 10.0)
        );
        assert_eq!(metrics.text_width("", FontId::Body, 11.0), 0.0);
    }

    #[test]
    fn bullet_and_unmappable_chars() {
        assert_eq!(to_winansi_bytes("\u{2022} Tea"), vec![0x95, b' ', b'T', b'e', b'a']);
        assert_eq!(to_winansi_bytes("दाल"), Vec::<u8>::new());
        let metrics = BuiltinMetrics::new();
        assert_eq!(metrics.text_width("दाल", FontId::Body, 11.0), 0.0);
        assert!((metrics.text_width("\u{2022}", FontId::Body, 10.0) - 3.5).abs() < 1e-4);
    }

    #[test]
    fn builtin_font_set_has_two_faces() {
        let mut pdf = Pdf::new();
        let mut alloc = allocator();
        let fonts = FontSet::register(&mut pdf, None, &HashSet::new(), &mut alloc);
        let names: Vec<&str> = fonts.entries().map(|e| e.pdf_name.as_str()).collect();
        assert_eq!(names, ["F1", "F2"]);
        assert!(!fonts.is_embedded());
        assert_eq!(fonts.entry(FontId::Heading).pdf_name, "F2");
        let bytes = pdf.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Helvetica-Bold"));
    }

    #[test]
    fn unparseable_custom_font_falls_back() {
        let mut pdf = Pdf::new();
        let mut alloc = allocator();
        let garbage = b"definitely not a font".to_vec();
        let fonts = FontSet::register(&mut pdf, Some(&garbage), &HashSet::new(), &mut alloc);
        assert!(!fonts.is_embedded());
        let builtin = BuiltinMetrics::new();
        assert_eq!(
            fonts.text_width("Breakfast:", FontId::Heading, 13.0),
            builtin.text_width("Breakfast:", FontId::Heading, 13.0)
        );
    }

    fn dejavu_sans() -> Vec<u8> {
        std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/DejaVuSans.ttf"))
            .expect("read DejaVuSans fixture")
    }

    #[test]
    fn truetype_widths_follow_hmtx_advances() {
        let data = dejavu_sans();
        let face = Face::parse(&data, 0).unwrap();
        let upem = face.units_per_em() as f32;
        let text = "Breakfast: Poha 320";
        let used: HashSet<char> = text.chars().collect();

        let mut pdf = Pdf::new();
        let mut alloc = allocator();
        let fonts = FontSet::register(&mut pdf, Some(&data), &used, &mut alloc);
        assert!(fonts.is_embedded());
        assert_eq!(fonts.entries().count(), 1);

        let expected = |size: f32| -> f32 {
            text.chars()
                .map(|ch| {
                    let gid = face.glyph_index(ch).unwrap();
                    face.glyph_hor_advance(gid).unwrap() as f32 / upem * size
                })
                .sum()
        };
        let body = fonts.text_width(text, FontId::Body, 11.0);
        let heading = fonts.text_width(text, FontId::Heading, 13.0);
        assert!((body - expected(11.0)).abs() < 1e-3, "{body} vs {}", expected(11.0));
        assert!((heading - expected(13.0)).abs() < 1e-3, "{heading} vs {}", expected(13.0));
    }

    #[test]
    fn truetype_text_encodes_two_byte_glyph_ids() {
        let data = dejavu_sans();
        let used: HashSet<char> = "Dal".chars().collect();
        let mut pdf = Pdf::new();
        let mut alloc = allocator();
        let fonts = FontSet::register(&mut pdf, Some(&data), &used, &mut alloc);

        let bytes = fonts.entry(FontId::Body).encode("Dal");
        assert_eq!(bytes.len(), 6);
        // subset ids are dense from 1; .notdef keeps 0
        let gids: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert!(gids.iter().all(|&gid| (1..=3).contains(&gid)), "{gids:?}");
    }
}
