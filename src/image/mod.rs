//! Terminal graphics for the preview pane.
//!
//! The picker queries the terminal for Kitty, Sixel or iTerm2 support and
//! falls back to Unicode half-blocks. Half-block output on terminals without
//! truecolor is quantized to the xterm-256 palette.

use std::time::Duration;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;

const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        crate::perf::log_event(
            "image.create_picker",
            "force_half_cell=true protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    // The stdio capability query can leave a reader thread parked on the
    // Windows console input buffer.
    #[cfg(not(unix))]
    {
        crate::perf::log_event(
            "image.create_picker",
            "windows fallback protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = Picker::from_query_stdio_with_options(query_options()).ok()?;
        crate::perf::log_event(
            "image.create_picker",
            format!(
                "term_program={} term={} colorterm={} protocol={:?}",
                std::env::var("TERM_PROGRAM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("TERM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("COLORTERM").unwrap_or_else(|_| "<unset>".to_string()),
                picker.protocol_type()
            ),
        );
        Some(picker)
    }
}

/// Build the stateful protocol that draws a rendered preview.
///
/// Half-block pictures are quantized first when the terminal lacks truecolor.
pub fn preview_protocol(picker: &Picker, image: DynamicImage) -> StatefulProtocol {
    let halfblocks = matches!(picker.protocol_type(), ProtocolType::Halfblocks);
    let ansi256 = halfblocks && !supports_truecolor_terminal();
    let (width, height) = image.dimensions();
    let image = if ansi256 {
        quantize_to_ansi256(&image)
    } else {
        image
    };
    crate::perf::log_event(
        "image.preview_protocol",
        format!("size={width}x{height} halfblocks={halfblocks} ansi256={ansi256}"),
    );
    picker.new_resize_protocol(image)
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if let Ok(force) = std::env::var("SVGPAD_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

/// Quantize image RGB channels to the ANSI-256 palette while preserving alpha.
pub fn quantize_to_ansi256(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let mut out = RgbaImage::new(width, height);
    let src = image.to_rgba8();

    for (x, y, px) in src.enumerate_pixels() {
        let idx = rgb_to_xterm_256(px[0], px[1], px[2]);
        let (r, g, b) = xterm_cube_to_rgb(idx);
        out.put_pixel(x, y, Rgba([r, g, b, px[3]]));
    }

    DynamicImage::ImageRgba8(out)
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let mentions = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|needle| lower.contains(needle))
        })
    };
    mentions(colorterm, &["truecolor", "24bit"]) || mentions(term, &["direct", "truecolor"])
}

/// Channel levels of the xterm 6x6x6 colour cube (indices 16..=231).
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn nearest_cube_level(v: u8) -> u8 {
    (0u8..)
        .zip(CUBE_LEVELS)
        .min_by_key(|(_, level)| level.abs_diff(v))
        .map_or(0, |(idx, _)| idx)
}

/// Nearest colour-cube entry of the xterm-256 palette.
pub(crate) fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    16 + 36 * nearest_cube_level(r) + 6 * nearest_cube_level(g) + nearest_cube_level(b)
}

fn xterm_cube_to_rgb(idx: u8) -> (u8, u8, u8) {
    let i = usize::from(idx.saturating_sub(16));
    (
        CUBE_LEVELS[(i / 36) % 6],
        CUBE_LEVELS[(i / 6) % 6],
        CUBE_LEVELS[i % 6],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_query_timeout_is_fast() {
        let options = query_options();
        assert_eq!(options.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_supports_truecolor_from_env_detects_24bit() {
        assert!(supports_truecolor_from_env(
            Some("truecolor"),
            Some("xterm-256color")
        ));
        assert!(supports_truecolor_from_env(Some("24BIT"), Some("screen")));
    }

    #[test]
    fn test_supports_truecolor_from_env_detects_non_truecolor() {
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_rgb_to_xterm_256_maps_cube_corners() {
        assert_eq!(rgb_to_xterm_256(0, 0, 0), 16);
        assert_eq!(rgb_to_xterm_256(255, 255, 255), 231);
        assert_eq!(xterm_cube_to_rgb(rgb_to_xterm_256(255, 0, 0)), (255, 0, 0));
        // deepskyblue lands on the nearest cube entry, not a truncated one.
        assert_eq!(xterm_cube_to_rgb(rgb_to_xterm_256(0, 191, 255)), (0, 175, 255));
    }

    #[test]
    fn test_preview_protocol_keeps_halfblock_picker() {
        let picker = Picker::halfblocks();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 191, 255, 255])));
        let protocol = preview_protocol(&picker, image);
        assert!(matches!(
            protocol.protocol_type(),
            ratatui_image::protocol::StatefulProtocolType::Halfblocks(_)
        ));
    }

    #[test]
    fn test_quantize_to_ansi256_preserves_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([12, 34, 56, 77])));
        let quantized = quantize_to_ansi256(&image).to_rgba8();
        assert_eq!(quantized.get_pixel(0, 0)[3], 77);
    }
}
