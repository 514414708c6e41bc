use super::super::Model;
use gloo_file::File as GlooFile;
use gloo_storage::{LocalStorage, Storage};
use gloo_timers::callback::Timeout;
use serde::{Deserialize, Serialize};
use shared::PredictionSource;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::FileList;
use yew::prelude::*;

const THEME_KEY: &str = "plantguard.theme";
const DARK_CLASS: &str = "dark-mode";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn load() -> Self {
        LocalStorage::get(THEME_KEY).unwrap_or_default()
    }

    pub fn store(self) {
        if let Err(e) = LocalStorage::set(THEME_KEY, self) {
            log::warn!("Could not persist theme: {}", e);
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn apply(self) {
        let Some(body) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.body())
        else {
            return;
        };
        let classes = body.class_list();
        let applied = match self {
            Theme::Dark => classes.add_1(DARK_CLASS),
            Theme::Light => classes.remove_1(DARK_CLASS),
        };
        if applied.is_err() {
            log::warn!("Could not switch theme class");
        }
    }
}

// Debounce function to limit button events
pub fn debounce<F>(duration: u32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));

    Callback::from(move |_| {
        let mut timeout_ref = timeout.borrow_mut();

        if let Some(old_timeout) = timeout_ref.take() {
            old_timeout.cancel();
        }

        let inner_callback = callback.clone();
        *timeout_ref = Some(Timeout::new(duration, move || inner_callback()));
    })
}

pub fn first_image_file(file_list: &FileList) -> Option<GlooFile> {
    (0..file_list.length())
        .filter_map(|i| file_list.item(i))
        .find(|file| is_image_type(&file.type_()))
        .map(GlooFile::from)
}

pub fn is_image_type(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// `Tomato___Late_blight` → `Tomato Late_blight`
pub fn display_label(label: &str) -> String {
    label.replace("___", " ")
}

pub fn confidence_percent(confidence: f32) -> String {
    format!("{:.1}%", confidence.clamp(0.0, 1.0) * 100.0)
}

pub fn advice(is_healthy: bool) -> &'static str {
    if is_healthy {
        "Your plant looks healthy! Keep up the good work with regular watering and monitoring."
    } else {
        "We've detected signs of disease. We recommend isolating this plant and applying appropriate treatment as soon as possible."
    }
}

pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let kept: String = name.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        name.to_string()
    }
}

pub fn render_error_message(model: &Model) -> Html {
    if let Some(error_msg) = &model.error {
        html! {
            <div class="error-message">
                <i class="fa-solid fa-circle-exclamation"></i>
                <p>{ error_msg }</p>
            </div>
        }
    } else {
        html! {}
    }
}

pub fn render_demo_notice(model: &Model) -> Html {
    let demo = model
        .result
        .as_ref()
        .map(|r| r.source == PredictionSource::Demo)
        .or_else(|| model.status.as_ref().map(|s| s.mode == PredictionSource::Demo))
        .unwrap_or(false);

    if demo {
        html! {
            <div class="demo-notice">
                <i class="fa-solid fa-flask"></i>
                <p>{"Demo mode: no trained model is loaded, so results are random."}</p>
            </div>
        }
    } else {
        html! {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_drop_the_triple_underscore() {
        assert_eq!(display_label("Tomato___Late_blight"), "Tomato Late_blight");
        assert_eq!(display_label("Apple___healthy"), "Apple healthy");
        assert_eq!(display_label("plain"), "plain");
    }

    #[test]
    fn confidence_is_shown_with_one_decimal() {
        assert_eq!(confidence_percent(0.9234), "92.3%");
        assert_eq!(confidence_percent(1.0), "100.0%");
        assert_eq!(confidence_percent(1.7), "100.0%");
    }

    #[test]
    fn advice_follows_health() {
        assert!(advice(true).contains("healthy"));
        assert!(advice(false).contains("disease"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate_name("leaf.png", 20), "leaf.png");
        assert_eq!(truncate_name("a_really_long_leaf_photo.jpeg", 12), "a_really_...");
    }

    #[test]
    fn theme_round_trips_through_toggle() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
        assert!(is_image_type("image/webp"));
        assert!(!is_image_type("text/plain"));
    }
}
