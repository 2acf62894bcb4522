use clap::Subcommand;
use wakeguard_core::storage::Store;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Streaks and totals
    Show,
    /// Recent completion history
    History {
        /// Newest-first entry count
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let stats = store.load_stats();

    match action {
        StatsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::History { limit } => {
            let newest_first: Vec<_> = stats.history.iter().rev().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&newest_first)?);
        }
    }
    Ok(())
}
