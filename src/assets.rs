//! Logo and font lookup. Every failure here is logged and degrades to the
//! built-in defaults; a missing asset never fails a render.

use std::path::{Path, PathBuf};

use crate::pdf::LogoSize;

const LOGO_CANDIDATES: [&str; 2] = ["logo.png", "logo.jpg"];
const FONT_CANDIDATE: &str = "fonts/Inter-Regular.ttf";

pub const LOGO_ENV: &str = "DIET_PDF_LOGO";
pub const FONT_ENV: &str = "DIET_PDF_FONT";

/// Where to look for the optional logo and custom font.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetConfig {
    pub logo_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
}

impl AssetConfig {
    /// Look in a public assets directory: `logo.png` before `logo.jpg`, and
    /// `fonts/Inter-Regular.ttf`. Only files that exist are recorded.
    pub fn discover(public_dir: &Path) -> Self {
        let logo_path = LOGO_CANDIDATES
            .iter()
            .map(|name| public_dir.join(name))
            .find(|p| p.is_file());
        let font_path = Some(public_dir.join(FONT_CANDIDATE)).filter(|p| p.is_file());
        log::debug!(
            "assets in {}: logo={:?} font={:?}",
            public_dir.display(),
            logo_path,
            font_path
        );
        AssetConfig {
            logo_path,
            font_path,
        }
    }

    /// `DIET_PDF_LOGO` / `DIET_PDF_FONT` replace whatever was discovered.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var_os(LOGO_ENV).map(PathBuf::from),
            std::env::var_os(FONT_ENV).map(PathBuf::from),
        )
    }

    pub fn with_overrides(mut self, logo: Option<PathBuf>, font: Option<PathBuf>) -> Self {
        if logo.is_some() {
            self.logo_path = logo;
        }
        if font.is_some() {
            self.font_path = font;
        }
        self
    }
}

/// Image data ready to become an image XObject.
#[derive(Clone, Debug)]
pub(crate) enum LogoData {
    /// Passed through untouched with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// Zlib-compressed 8-bit RGB plus an optional alpha soft mask.
    Rgb {
        deflated: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Clone, Debug)]
pub struct LogoImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub(crate) data: LogoData,
}

impl LogoImage {
    pub fn size(&self) -> LogoSize {
        LogoSize {
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
        }
    }

    /// Decode PNG or JPEG bytes. Anything else, or a corrupt image, is `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => decode_jpeg(bytes),
            Ok(image::ImageFormat::Png) => decode_png(bytes),
            Ok(other) => {
                log::warn!("Unsupported logo format {other:?}");
                None
            }
            Err(e) => {
                log::warn!("Unrecognized logo data: {e}");
                None
            }
        }
    }
}

fn decode_jpeg(bytes: &[u8]) -> Option<LogoImage> {
    use image::ImageDecoder;

    let decoder = match image::codecs::jpeg::JpegDecoder::new(std::io::Cursor::new(bytes)) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Failed to read JPEG logo: {e}");
            return None;
        }
    };
    let (pixel_width, pixel_height) = decoder.dimensions();
    let gray = match decoder.color_type() {
        image::ColorType::L8 => true,
        image::ColorType::Rgb8 => false,
        other => {
            log::warn!("Unsupported JPEG logo color type {other:?}");
            return None;
        }
    };
    Some(LogoImage {
        pixel_width,
        pixel_height,
        data: LogoData::Jpeg {
            data: bytes.to_vec(),
            gray,
        },
    })
}

fn decode_png(bytes: &[u8]) -> Option<LogoImage> {
    let reader = image::ImageReader::with_format(
        std::io::Cursor::new(bytes),
        image::ImageFormat::Png,
    );
    let decoded = match reader.decode() {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Failed to decode PNG logo: {e}");
            return None;
        }
    };
    let rgba: image::RgbaImage = decoded.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let alpha = has_alpha.then(|| {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
    });

    Some(LogoImage {
        pixel_width: w,
        pixel_height: h,
        data: LogoData::Rgb {
            deflated: miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6),
            alpha,
        },
    })
}

/// Assets loaded once and shared by every render.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    pub logo: Option<LogoImage>,
    pub font: Option<Vec<u8>>,
}

impl Assets {
    /// No logo, built-in Helvetica.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn load(config: &AssetConfig) -> Self {
        let t0 = std::time::Instant::now();
        let logo = config.logo_path.as_deref().and_then(load_logo);
        let font = config.font_path.as_deref().and_then(load_font);
        log::info!(
            "Assets loaded in {:.1}ms: logo={}, custom font={}",
            t0.elapsed().as_secs_f64() * 1000.0,
            logo.is_some(),
            font.is_some(),
        );
        Assets { logo, font }
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    pub fn has_custom_font(&self) -> bool {
        self.font.is_some()
    }
}

fn read_asset(path: &Path, what: &str) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Cannot read {what} {}: {e}", path.display());
            None
        }
    }
}

fn load_logo(path: &Path) -> Option<LogoImage> {
    let bytes = read_asset(path, "logo")?;
    let logo = LogoImage::from_bytes(&bytes)?;
    log::debug!(
        "logo {}: {}x{}",
        path.display(),
        logo.pixel_width,
        logo.pixel_height
    );
    Some(logo)
}

fn load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = read_asset(path, "font")?;
    if let Err(e) = ttf_parser::Face::parse(&bytes, 0) {
        log::warn!("Ignoring font {}: {e}", path.display());
        return None;
    }
    Some(bytes)
}
