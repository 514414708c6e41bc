use super::super::{Model, Msg};
use super::utils::first_image_file;
use crate::api;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::PredictionResponse;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

pub fn handle_file_chosen(model: &mut Model, file: GlooFile) -> bool {
    model.preview_url = Some(ObjectUrl::from(file.clone()));
    model.file = Some(file);
    model.result = None;
    model.error = None;
    true
}

pub fn handle_reset(model: &mut Model) -> bool {
    model.file = None;
    model.preview_url = None;
    model.result = None;
    model.error = None;
    model.loading = false;
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(file) = model.file.clone() else {
        ctx.link()
            .send_message(Msg::SetError(Some("Choose a leaf image first.".into())));
        return false;
    };
    if model.loading {
        return false;
    }

    model.loading = true;
    model.error = None;
    send_prediction_request(ctx, file);
    true
}

pub fn handle_prediction(model: &mut Model, response: PredictionResponse) -> bool {
    log::info!(
        "Prediction: {} ({:.3}, {})",
        response.class_name,
        response.confidence,
        response.source
    );
    model.result = Some(response);
    model.loading = false;
    true
}

pub fn handle_toggle_theme(model: &mut Model) -> bool {
    model.theme = model.theme.toggled();
    model.theme.apply();
    model.theme.store();
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
        process_file_list(ctx, file_list);
    }

    true
}

pub fn handle_paste(model: &mut Model, ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if model.loading {
        return false;
    }
    if let Some(file_list) = event.clipboard_data().and_then(|dt| dt.files()) {
        if file_list.length() > 0 {
            event.prevent_default();
            process_file_list(ctx, file_list);
            return true;
        }
    }
    false
}

/// Only the first image in the list is kept.
pub fn process_file_list(ctx: &Context<Model>, file_list: FileList) {
    match first_image_file(&file_list) {
        Some(file) => ctx.link().send_message(Msg::FileChosen(file)),
        None => {
            log::warn!("Dropped or pasted data contained no image");
            ctx.link()
                .send_message(Msg::SetError(Some("Please choose an image file.".into())));
        }
    }
}

pub fn send_prediction_request(ctx: &Context<Model>, file: GlooFile) {
    let link = ctx.link().clone();
    spawn_local(async move {
        match api::predict(&file).await {
            Ok(response) => link.send_message(Msg::PredictionReady(response)),
            Err(message) => link.send_message(Msg::SetError(Some(message))),
        }
    });
}

pub fn fetch_model_status(ctx: &Context<Model>) {
    let link = ctx.link().clone();
    spawn_local(async move {
        match api::model_status().await {
            Ok(status) => link.send_message(Msg::StatusLoaded(status)),
            Err(message) => log::warn!("Could not load model status: {}", message),
        }
    });
}
