use super::super::Model;
use super::utils::{advice, confidence_percent, display_label};
use shared::PredictionSource;
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    let Some(result) = &model.result else {
        return html! {};
    };

    let percent = confidence_percent(result.confidence);

    html! {
        <div class={classes!("results-container", if result.is_healthy { "healthy" } else { "diseased" })}>
            <div class="result-header">
                <div>
                    <span class={classes!("status-badge", if result.is_healthy { "status-healthy" } else { "status-unhealthy" })}>
                        {
                            if result.is_healthy {
                                html! { <><i class="fa-solid fa-circle-check"></i>{" Healthy Leaf"}</> }
                            } else {
                                html! { <><i class="fa-solid fa-triangle-exclamation"></i>{" Disease Detected"}</> }
                            }
                        }
                    </span>
                    <h2>{ display_label(&result.class_name) }</h2>
                </div>
                <div class="confidence-meter">
                    <div class="meter-label">{"Confidence"}</div>
                    <div class="meter-value">{ &percent }</div>
                </div>
            </div>
            <div class="meter">
                <div class="meter-fill" style={format!("width: {}", percent)}></div>
            </div>
            <div class="advice">
                <p>{ advice(result.is_healthy) }</p>
            </div>
            {
                if result.source == PredictionSource::Demo {
                    html! { <p class="source-note">{"Generated in demo mode"}</p> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
