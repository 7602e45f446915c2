//! County/state selector.

use crate::state::AppState;
use dioxus::prelude::*;
use dm_core::admin::AdminLevel;

#[derive(Props, Clone, PartialEq)]
pub struct AdminSelectorProps {
    pub on_change: EventHandler<AdminLevel>,
}

/// Dropdown choosing whether clicks resolve to counties or states.
#[component]
pub fn AdminSelector(props: AdminSelectorProps) -> Element {
    let state = use_context::<AppState>();
    let current = (state.admin)();
    let on_select = props.on_change;

    let on_change = move |evt: Event<FormData>| match evt.value().parse::<AdminLevel>() {
        Ok(admin) => on_select.call(admin),
        Err(e) => log::warn!("{}", e),
    };

    rsx! {
        div {
            style: "margin: 8px 0;",
            label {
                r#for: "admin-select",
                style: "font-weight: bold; margin-right: 8px;",
                "Statistics by: "
            }
            select {
                id: "admin-select",
                onchange: on_change,
                for admin in [AdminLevel::County, AdminLevel::State] {
                    option {
                        value: "{admin.as_str()}",
                        selected: admin == current,
                        if admin == AdminLevel::County { "County" } else { "State" }
                    }
                }
            }
        }
    }
}
