//! Basic usage example for the Owly library.
//!
//! Searches one subject, prints the rendered cards and opens the detail of
//! the first one.

use owly::config::get_config;
use owly::detail::{DetailPresenter, ModalBody};
use owly::search::{Activation, SearchOrchestrator, SearchStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Defaults, overridable through API_BASE_URL, MAX_RESULTS, ...
    let config = get_config().max_results(5);
    config.validate()?;

    let orchestrator = SearchOrchestrator::from_config(&config)?;
    let presenter = DetailPresenter::new(orchestrator.catalog());

    let outcome = orchestrator.search("science fiction").await;
    println!("Phases: {:?}", outcome.phases);

    if let SearchStatus::Failed(err) = &outcome.status {
        eprintln!("Search failed: {}", err.user_message());
        return Ok(());
    }

    let state = orchestrator.snapshot().await;
    for (i, card) in state.container().cards().iter().enumerate() {
        println!("{}. {} by {}", i + 1, card.title, card.author);
        println!("   Cover: {}", card.cover.url());
    }

    // Open the first card as if it was clicked
    let Some(work) = state
        .container()
        .get(1)
        .and_then(|card| card.activate(Activation::Click))
    else {
        return Ok(());
    };

    match presenter.activate(work).await {
        ModalBody::Details(view) => {
            println!("\n{} ({})", view.title, view.year);
            println!("{}", view.authors);
            println!("\n{}", view.description);
        }
        ModalBody::Error { title, message } => eprintln!("{}: {}", title, message),
        ModalBody::Loading => {}
    }

    Ok(())
}
