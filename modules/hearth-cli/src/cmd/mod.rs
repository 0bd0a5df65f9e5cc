pub mod filters;
pub mod query;
pub mod show;

use anyhow::Result;
use serde::Serialize;

use hearth_common::Event;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line listing: start, name, id.
pub(crate) fn print_event_line(event: &Event) {
    let when = event
        .starts_at()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "????-??-?? ??:??".to_string());
    println!("{when}  {}  [{}]", event.name, event.id);
}
