//! Read-only views: taxonomy, community options and detail pages.

use anyhow::{bail, Result};
use chrono::Utc;

use super::{print_event_line, print_json};
use crate::App;

pub fn taxonomy(app: &App) -> Result<()> {
    let reader = app.reader()?;
    let taxonomy = reader.taxonomy();
    if app.json {
        return print_json(taxonomy);
    }
    for category in &taxonomy.categories {
        println!("{} ({})", category.name, category.count);
        for sub in &category.subcategories {
            println!("  {} ({})  [{}]", sub.name, sub.count, sub.id);
        }
    }
    Ok(())
}

pub fn communities(app: &App) -> Result<()> {
    let options = app.reader()?.community_options();
    if app.json {
        return print_json(&options);
    }
    for option in &options {
        println!("{:>4}  {}  [{}]", option.count, option.name, option.id);
    }
    Ok(())
}

pub fn event(app: &App, id: &str) -> Result<()> {
    let Some(detail) = app.reader()?.event_detail(id) else {
        bail!("No event with id '{id}'");
    };
    if app.json {
        return print_json(&detail);
    }

    print_event_line(&detail.event);
    if let Some(description) = &detail.event.description {
        println!("  {description}");
    }
    if let Some(community) = &detail.community {
        println!("  Organized by {}", community.name);
    }
    if let Some(venue) = &detail.venue {
        match &venue.address {
            Some(address) => println!("  At {} ({address})", venue.name),
            None => println!("  At {}", venue.name),
        }
    }
    for community in &detail.associated_communities {
        println!("  With {}", community.name);
    }
    if let Some(url) = detail.event.source_url() {
        println!("  {url}");
    }
    Ok(())
}

pub fn location(app: &App, id: &str) -> Result<()> {
    let Some(detail) = app.reader()?.location_detail_at(id, Utc::now()) else {
        bail!("No location with id '{id}'");
    };
    if app.json {
        return print_json(&detail);
    }

    println!("{}  [{}]", detail.location.name, detail.location.id);
    if !detail.location.address.is_empty() {
        println!("  {}", detail.location.address);
    }
    if let Some(main) = &detail.main_community {
        println!("  Home of {}", main.name);
    }
    for guest in &detail.guest_communities {
        println!("  Also hosts {}", guest.name);
    }
    println!();
    for event in &detail.upcoming_events {
        print_event_line(event);
    }
    Ok(())
}

pub fn community(app: &App, id: &str) -> Result<()> {
    let Some(detail) = app.reader()?.community_detail_at(id, Utc::now()) else {
        bail!("No community with id '{id}'");
    };
    if app.json {
        return print_json(&detail);
    }

    println!("{}  [{}]", detail.community.name, detail.community.id);
    if !detail.community.description.is_empty() {
        println!("  {}", detail.community.description);
    }
    for location in &detail.home_locations {
        println!("  Based at {}", location.name);
    }
    for location in &detail.meeting_locations {
        println!("  Meets at {}", location.name);
    }
    for location in &detail.locations {
        println!("  Has held events at {}", location.name);
    }
    println!();
    for event in detail.upcoming_events.iter().chain(&detail.associated_events) {
        print_event_line(event);
    }
    Ok(())
}
