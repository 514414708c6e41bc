use super::super::{Model, Msg};
use super::utils::{debounce, truncate_name};
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(file) = &model.file else {
        return html! {};
    };

    let link = ctx.link().clone();
    let finished = model.result.is_some() || model.error.is_some();

    html! {
        <div id="preview-container">
            {
                if let Some(url) = &model.preview_url {
                    html! {
                        <img id="actual-image-preview"
                            class="image-preview"
                            src={url.to_string()}
                            alt={file.name()} />
                    }
                } else {
                    html! {
                        <div class="unavailable-preview">
                            <p>{"Preview unavailable"}</p>
                        </div>
                    }
                }
            }
            <p class="analyzed-filename-display">{ truncate_name(&file.name(), 32) }</p>

            <div class="button-container">
                {
                    if model.result.is_none() && model.error.is_none() && !model.loading {
                        html! {
                            <button
                                class="analyze-btn"
                                onclick={debounce(300, {
                                    let link = link.clone();
                                    move || link.send_message(Msg::Analyze)
                                })}
                            >
                                <i class="fa-solid fa-shield-halved"></i>{" Analyze Health"}
                            </button>
                        }
                    } else {
                        html! {}
                    }
                }
                {
                    if finished && !model.loading {
                        html! {
                            <button
                                id="try-another-btn"
                                class="analyze-btn secondary"
                                onclick={link.callback(|_| Msg::Reset)}
                            >
                                <i class="fa-solid fa-rotate"></i>{" Try Another"}
                            </button>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>

            {
                if model.loading {
                    html! {
                        <div class="loading-preview">
                            <i class="fa-solid fa-spinner fa-spin fa-2x"></i>
                            <p>{"Analyzing leaf patterns..."}</p>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
