use ratatui::prelude::*;
use ratatui_image::protocol::{StatefulProtocol, StatefulProtocolType};
use ratatui_image::{Resize, StatefulImage};

use crate::app::Model;

/// Draw the rasterized preview centered in `area`.
pub fn render_preview_image(model: &mut Model, frame: &mut Frame, area: Rect) {
    let Some(protocol) = model.preview_protocol.as_mut() else {
        return;
    };
    if area.width == 0 || area.height == 0 {
        return;
    }

    let size = protocol.size_for(preview_resize(protocol), area);
    let target = Rect::new(
        area.x + area.width.saturating_sub(size.width) / 2,
        area.y + area.height.saturating_sub(size.height) / 2,
        size.width.min(area.width),
        size.height.min(area.height),
    );
    let halfblocks = matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_));
    let image_widget = StatefulImage::default().resize(preview_resize(protocol));
    frame.render_stateful_widget(image_widget, target, protocol);

    // Terminal.app and other non-truecolor terminals behave better with indexed colors
    // than repeated truecolor updates in halfblock mode.
    if halfblocks && !crate::image::supports_truecolor_terminal() {
        let buf = frame.buffer_mut();
        for row in target.top()..target.bottom() {
            for col in target.left()..target.right() {
                let cell = &mut buf[(col, row)];
                if let Color::Rgb(r, g, b) = cell.fg {
                    cell.fg = Color::Indexed(crate::image::rgb_to_xterm_256(r, g, b));
                }
                if let Color::Rgb(r, g, b) = cell.bg {
                    cell.bg = Color::Indexed(crate::image::rgb_to_xterm_256(r, g, b));
                }
            }
        }
    }
    crate::perf::log_event(
        "render.preview.image",
        format!(
            "area={}x{} target={}x{}+{}+{} halfblocks={halfblocks}",
            area.width, area.height, target.width, target.height, target.x, target.y
        ),
    );
}

fn preview_resize(protocol: &StatefulProtocol) -> Resize {
    if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
        // Nearest-neighbor causes strong color aliasing artifacts in half-cell mode.
        Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    }
}
