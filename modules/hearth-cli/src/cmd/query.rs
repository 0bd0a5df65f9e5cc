//! `hearth query`: build a filter from flags, run it, print one or more pages.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use serde_json::json;

use hearth_directory::{FilterSpec, FilterStateStore};

use super::{print_event_line, print_json};
use crate::App;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Category name, composite subcategory id (e.g. Tech-AI) or event type
    #[arg(short = 'C', long = "category")]
    pub categories: Vec<String>,

    /// Organizer community id
    #[arg(short = 'm', long = "community")]
    pub communities: Vec<String>,

    /// Earliest start day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day an event may end on (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Free-text search; every word must match
    #[arg(short, long)]
    pub search: Option<String>,

    /// Include events that already started before today
    #[arg(long)]
    pub past: bool,

    /// Number of pages to reveal
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Start from the saved filters instead of the defaults
    #[arg(long)]
    pub saved: bool,

    /// Save the resulting filters for later sessions
    #[arg(long)]
    pub save: bool,
}

impl QueryArgs {
    fn edit(&self, spec: &mut FilterSpec) {
        spec.categories.extend(self.categories.iter().cloned());
        spec.communities.extend(self.communities.iter().cloned());
        if self.past {
            spec.include_past = true;
            spec.start_date = None;
        }
        if let Some(from) = self.from {
            spec.start_date = Some(from);
        }
        if let Some(to) = self.to {
            spec.end_date = Some(to);
        }
        if let Some(search) = &self.search {
            spec.search_query = search.clone();
        }
    }
}

pub fn run(app: &App, args: QueryArgs) -> Result<()> {
    let today = Utc::now().date_naive();
    let mut session = FilterStateStore::restore(app.state_store(), today);
    if !args.saved {
        session.stage(|spec| *spec = FilterSpec::initial(today));
    }
    session.stage(|spec| args.edit(spec));

    let spec = if args.save {
        session.apply();
        session.active().clone()
    } else {
        session.staged().clone()
    };

    let reader = app.reader()?;
    let result = reader.query(&spec);
    let mut pages = reader.paginate(result.total);
    for _ in 1..args.page {
        if !pages.request_more() {
            break;
        }
    }
    let visible = pages.visible(&result.items);

    if app.json {
        return print_json(&json!({
            "filters": spec,
            "total": result.total,
            "visible": visible.len(),
            "hasMore": pages.has_more(),
            "items": visible,
        }));
    }

    for event in visible {
        print_event_line(event);
    }
    println!();
    println!("Showing {} of {} events", visible.len(), result.total);
    if pages.has_more() {
        println!("Use --page {} to see more", args.page + 1);
    }
    Ok(())
}
