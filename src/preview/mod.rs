//! Preview rendering, gated on validation.
//!
//! Markup that failed validation is never handed to the rasterizer. Valid
//! markup is parsed by `usvg` and rasterized by `resvg` onto a white canvas,
//! fitted inside the preview pane while keeping its aspect ratio.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use image::DynamicImage;
use quick_xml::Reader;
use quick_xml::events::Event;
use resvg::usvg::fontdb;
use thiserror::Error;

use crate::validate::ValidationResult;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// What the preview pane should show for one document revision.
#[derive(Debug, Clone)]
pub enum PreviewState {
    /// The markup is not well-formed; nothing is drawn.
    Suppressed,
    /// Well-formed but empty; nothing to draw.
    Blank,
    /// Well-formed, but not an SVG the rasterizer can draw.
    Unrenderable(String),
    Rendered(DynamicImage),
}

impl PreviewState {
    pub const fn image(&self) -> Option<&DynamicImage> {
        match self {
            Self::Rendered(image) => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("{0}")]
    Svg(#[from] resvg::usvg::Error),
    #[error("preview area is empty")]
    NoSpace,
    #[error("failed to create pixmap {width}x{height}")]
    Pixmap { width: u32, height: u32 },
}

/// Decide and produce the preview for `text`.
///
/// `max_width_px` x `max_height_px` is the pixel box the image must fit in.
pub fn render(
    text: &str,
    validation: &ValidationResult,
    max_width_px: u32,
    max_height_px: u32,
) -> PreviewState {
    if !validation.is_valid() {
        return PreviewState::Suppressed;
    }
    if crate::export::is_blank(text) {
        return PreviewState::Blank;
    }
    match rasterize(&with_svg_namespace(text), max_width_px, max_height_px) {
        Ok(image) => PreviewState::Rendered(image),
        Err(err) => {
            tracing::debug!(%err, "preview not renderable");
            PreviewState::Unrenderable(err.to_string())
        }
    }
}

/// Rasterize an SVG string to fit inside `max_width_px` x `max_height_px`.
///
/// # Errors
///
/// Returns an error if `usvg` cannot build a tree from the markup, the box is
/// empty, or the pixmap cannot be allocated.
pub fn rasterize(
    svg: &str,
    max_width_px: u32,
    max_height_px: u32,
) -> Result<DynamicImage, PreviewError> {
    if max_width_px == 0 || max_height_px == 0 {
        return Err(PreviewError::NoSpace);
    }
    let _scope = crate::perf::scope("preview.rasterize");

    let opts = resvg::usvg::Options {
        fontdb: Arc::clone(font_db()),
        ..Default::default()
    };
    let tree = resvg::usvg::Tree::from_str(svg, &opts)?;
    let size = tree.size();

    #[allow(clippy::cast_precision_loss)]
    let scale = (max_width_px as f32 / size.width()).min(max_height_px as f32 / size.height());

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = ((size.width() * scale).ceil() as u32).clamp(1, max_width_px);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = ((size.height() * scale).ceil() as u32).clamp(1, max_height_px);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(PreviewError::Pixmap { width, height })?;
    // Opaque canvas, so premultiplied and straight RGBA coincide below.
    pixmap.fill(resvg::tiny_skia::Color::WHITE);

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let img_buf = image::RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or(PreviewError::Pixmap { width, height })?;
    crate::perf::log_event("preview.rasterize", format!("size={width}x{height}"));
    Ok(DynamicImage::ImageRgba8(img_buf))
}

/// Give a bare `<svg>` root the SVG namespace, as HTML parsers do for inline SVG.
///
/// Only the rasterizer sees the result; exports keep the original bytes.
fn with_svg_namespace(text: &str) -> Cow<'_, str> {
    let mut reader = Reader::from_str(text);
    loop {
        let start = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        match reader.read_event() {
            Ok(Event::Start(root) | Event::Empty(root)) => {
                let bare = root.name().as_ref() == b"svg"
                    && !root
                        .attributes()
                        .flatten()
                        .any(|attr| attr.key.as_ref() == b"xmlns");
                let insert_at = start + "<svg".len();
                if !bare || !text.is_char_boundary(insert_at) {
                    return Cow::Borrowed(text);
                }
                let mut patched = String::with_capacity(text.len() + SVG_NAMESPACE.len() + 9);
                patched.push_str(&text[..insert_at]);
                patched.push_str(&format!(" xmlns=\"{SVG_NAMESPACE}\""));
                patched.push_str(&text[insert_at..]);
                return Cow::Owned(patched);
            }
            Ok(Event::Eof) | Err(_) => return Cow::Borrowed(text),
            Ok(_) => {}
        }
    }
}

fn font_db() -> &'static Arc<fontdb::Database> {
    static FONT_DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONT_DB.get_or_init(|| {
        let _scope = crate::perf::scope("preview.fontdb.load_system_fonts");
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use image::GenericImageView;

    const CIRCLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
  <circle cx="50" cy="50" r="40" stroke="black" stroke-width="3" fill="deepskyblue" />
</svg>"#;

    #[test]
    fn test_rasterize_fits_inside_box_keeping_aspect() {
        let img = rasterize(CIRCLE, 300, 150).unwrap();
        assert_eq!(img.dimensions(), (150, 150));
    }

    #[test]
    fn test_rasterize_draws_on_white_canvas() {
        let img = rasterize(CIRCLE, 100, 100).unwrap();
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255, 255]);
        let center = img.get_pixel(50, 50).0;
        assert_eq!(center[3], 255);
        assert!(center[2] > center[0], "center should be sky blue: {center:?}");
    }

    #[test]
    fn test_rasterize_rejects_empty_box() {
        assert!(matches!(rasterize(CIRCLE, 0, 10), Err(PreviewError::NoSpace)));
    }

    #[test]
    fn test_render_suppresses_invalid_markup() {
        let text = r#"<svg><circle r="40"></svg>"#;
        let state = render(text, &validate(text), 100, 100);
        assert!(matches!(state, PreviewState::Suppressed));
        assert!(state.image().is_none());
    }

    #[test]
    fn test_render_blank_for_whitespace() {
        let state = render("  \n", &ValidationResult::Valid, 100, 100);
        assert!(matches!(state, PreviewState::Blank));
    }

    #[test]
    fn test_render_blank_for_byte_order_mark() {
        let state = render("\u{FEFF}\n", &ValidationResult::Valid, 100, 100);
        assert!(matches!(state, PreviewState::Blank));
    }

    #[test]
    fn test_render_valid_svg_produces_image() {
        let state = render(CIRCLE, &validate(CIRCLE), 64, 64);
        let image = state.image().expect("rendered preview");
        assert_eq!(image.dimensions(), (64, 64));
    }

    #[test]
    fn test_render_zero_sized_svg_is_unrenderable() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="10"/>"#;
        let state = render(text, &validate(text), 64, 64);
        assert!(matches!(state, PreviewState::Unrenderable(_)));
    }

    #[test]
    fn test_bare_svg_root_gets_namespace() {
        let text = r#"<svg><circle r="40"/></svg>"#;
        assert_eq!(
            with_svg_namespace(text),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="40"/></svg>"#
        );
        let state = render(text, &validate(text), 64, 64);
        assert!(matches!(state, PreviewState::Rendered(_)));
    }

    #[test]
    fn test_namespace_left_alone_when_present_or_not_svg() {
        assert!(matches!(with_svg_namespace(CIRCLE), Cow::Borrowed(_)));
        assert!(matches!(with_svg_namespace("<note/>"), Cow::Borrowed(_)));

        let prolog = "<?xml version=\"1.0\"?>\n<!-- hi -->\n<svg/>";
        assert_eq!(
            with_svg_namespace(prolog),
            "<?xml version=\"1.0\"?>\n<!-- hi -->\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>"
        );
    }
}
