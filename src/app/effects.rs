use crate::app::model::hash_bytes;
use crate::app::{App, Message, Model, ToastLevel};
use crate::export::ExportError;

impl App {
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        if matches!(msg, Message::Export) {
            Self::export(model);
        }
    }

    fn export(model: &mut Model) {
        let _scope = crate::perf::scope("app.export");
        model.sync_validation();
        let text = model.buffer.text();
        let result = model
            .exporter
            .export_document(&text, &model.validation, &mut model.saver);
        match result {
            Ok(()) => {
                model.baseline_hash = hash_bytes(text.as_bytes());
                let destination = model.saver.destination();
                crate::perf::log_event(
                    "export.ok",
                    format!("path={} bytes={}", destination.display(), text.len()),
                );
                model.show_toast(
                    ToastLevel::Info,
                    format!("Downloaded {}", destination.display()),
                );
            }
            Err(err @ ExportError::NotExportable) => {
                crate::perf::log_event(
                    "export.refused",
                    format!("state={:?}", model.export_state()),
                );
                model.alert = Some(err.to_string());
            }
            Err(err) => {
                crate::perf::log_event("export.error", err.to_string());
                model.show_toast(ToastLevel::Error, format!("Download failed: {err}"));
            }
        }
    }
}
