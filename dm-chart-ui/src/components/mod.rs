//! Dioxus RSX components for the drought chart app.

mod admin_selector;
mod chart_header;
mod drought_chart;
mod error_display;
mod legend;
mod loading_spinner;
mod selected_date_label;

pub use admin_selector::AdminSelector;
pub use chart_header::ChartHeader;
pub use drought_chart::{ChartTooltip, DroughtChart};
pub use error_display::ErrorDisplay;
pub use legend::Legend;
pub use loading_spinner::LoadingSpinner;
pub use selected_date_label::SelectedDateLabel;
