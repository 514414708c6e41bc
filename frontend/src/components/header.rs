use yew::prelude::*;

pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-leaf"></i> {" Plant Guard"}</h1>
            <p class="subtitle">
                {"Instant plant disease detection. Keep your crops healthy and maximize your yield."}
            </p>
        </header>
    }
}
