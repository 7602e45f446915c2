//! Drought category legend.

use dioxus::prelude::*;
use dm_chart::scale::ColorScale;

/// Swatches for every stacked category, in stacking order.
#[component]
pub fn Legend() -> Element {
    let entries = ColorScale.legend();

    rsx! {
        div {
            style: "margin-top: 12px; padding: 8px 12px; background: #FAFAFA; border-radius: 4px; border: 1px solid #E0E0E0; font-size: 12px; display: flex; gap: 16px; flex-wrap: wrap;",
            for (category, color) in entries {
                div {
                    style: "display: flex; align-items: center; gap: 4px;",
                    span {
                        style: "display: inline-block; width: 12px; height: 12px; background: {color};",
                    }
                    "{category.label()}"
                }
            }
        }
    }
}
