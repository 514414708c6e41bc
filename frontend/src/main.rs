mod api;
mod components;

use components::handlers;
use components::header::render_header;
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::theme_toggle::render_theme_toggle;
use components::upload_section::render_upload_section;
use components::utils::{Theme, render_demo_notice, render_error_message};
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{ModelStatus, PredictionResponse};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

pub enum Msg {
    // File operations
    FileChosen(GlooFile),
    Reset,

    // Analysis operations
    Analyze,
    PredictionReady(PredictionResponse),
    StatusLoaded(ModelStatus),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),
    ToggleTheme,

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

pub struct Model {
    file: Option<GlooFile>,
    preview_url: Option<ObjectUrl>,
    result: Option<PredictionResponse>,
    status: Option<ModelStatus>,
    loading: bool,
    error: Option<String>,
    is_dragging: bool,
    theme: Theme,
    _paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let theme = Theme::load();
        theme.apply();

        let paste_listener = web_sys::window().map(|window| {
            let link = ctx.link().clone();
            EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            })
        });

        handlers::fetch_model_status(ctx);

        Self {
            file: None,
            preview_url: None,
            result: None,
            status: None,
            loading: false,
            error: None,
            is_dragging: false,
            theme,
            _paste_listener: paste_listener,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileChosen(file) => handlers::handle_file_chosen(self, file),
            Msg::Reset => handlers::handle_reset(self),

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::PredictionReady(response) => handlers::handle_prediction(self, response),
            Msg::StatusLoaded(status) => {
                self.status = Some(status);
                true
            }

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
            Msg::ToggleTheme => handlers::handle_toggle_theme(self),

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(self, ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                <div class="top-right">
                    { render_theme_toggle(self.theme, ctx.link()) }
                </div>

                <main class="main-content">
                    { render_demo_notice(self) }
                    <div class="upload-card">
                        { render_upload_section(self, ctx) }
                        { render_preview_area(self, ctx) }
                        { render_error_message(self) }
                        { render_results(self) }
                    </div>
                </main>

                <footer class="app-footer">
                    <p>{"Plant Guard | Leaf disease detection in Rust"}</p>
                </footer>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Plant Guard starting...");
    yew::Renderer::<Model>::new().render();
}
