use clap::Subcommand;
use wakeguard_core::assistant::{AssistantClient, FALLBACK_MESSAGE};
use wakeguard_core::storage::{Config, Store};

#[derive(Subcommand)]
pub enum AssistantAction {
    /// Ask the Wake Up Assistant one question
    Ask {
        message: String,
    },
}

pub fn run(action: AssistantAction) -> Result<(), Box<dyn std::error::Error>> {
    let AssistantAction::Ask { message } = action;

    let store = Store::open()?;
    let config = Config::load_or_default();
    let alarms = store.load_alarms();
    let stats = store.load_stats();

    // An unconfigured endpoint degrades like any other failure.
    let Some(client) = AssistantClient::from_config(&config.assistant) else {
        println!("{FALLBACK_MESSAGE}");
        return Ok(());
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let reply = runtime.block_on(client.ask(&alarms, &stats, &message));
    println!("{reply}");
    Ok(())
}
