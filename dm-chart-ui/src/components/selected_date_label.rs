//! Label for the date selected on the chart.

use crate::state::AppState;
use dioxus::prelude::*;

#[component]
pub fn SelectedDateLabel() -> Element {
    let state = use_context::<AppState>();
    let label = (state.frame)().and_then(|f| f.label);

    rsx! {
        p {
            style: "margin: 8px 0; font-size: 14px;",
            if let Some(label) = label {
                strong { "{label.text()}" }
            } else {
                span { style: "color: #888;", "Click the chart to show that week on the map." }
            }
        }
    }
}
