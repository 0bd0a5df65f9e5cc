use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use hearth_directory::FilterStateStore;

use super::print_json;
use crate::App;

#[derive(Subcommand)]
pub enum FiltersCommand {
    /// Print the saved filters
    Show,

    /// Reset the saved filters to the defaults
    Clear,
}

pub fn run(app: &App, cmd: FiltersCommand) -> Result<()> {
    let mut session = FilterStateStore::restore(app.state_store(), Utc::now().date_naive());
    match cmd {
        FiltersCommand::Show => print_json(session.active()),
        FiltersCommand::Clear => {
            session.clear_all();
            println!(
                "Filters reset ({})",
                app.config.state_path.display()
            );
            Ok(())
        }
    }
}
