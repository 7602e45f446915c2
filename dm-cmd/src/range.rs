//! Map window lookup for a single date.

use dm_core::date_range::DateRange;
use dm_utils::dates::{format_date, parse_timestamp, to_epoch_millis};

/// One line describing the window: ISO dates, then epoch milliseconds.
pub fn describe_range(range: &DateRange) -> String {
    format!(
        "{} .. {} ({} .. {})",
        format_date(&range.start),
        format_date(&range.end),
        to_epoch_millis(&range.start),
        to_epoch_millis(&range.end)
    )
}

pub fn run_range(date: &str) -> anyhow::Result<()> {
    let date = parse_timestamp(date)?;
    println!("{}", describe_range(&DateRange::ending_at(date)));
    Ok(())
}
