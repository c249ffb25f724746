use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use smashpass::catalog::Catalog;
use smashpass::config::{self, GameConfig};
use smashpass::http::{self, AppState};
use smashpass::session::{Emitter, SessionManager};
use smashpass::tally::{CounterStore, MemoryStore};
use smashpass::telemetry;
use smashpass::trivia::TriviaSession;
use smashpass::util::registry::Registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let catalog_path = config::catalog_path();
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("load card catalog from {}", catalog_path.display()))?;
    anyhow::ensure!(!catalog.is_empty(), "card catalog is empty");
    tracing::info!(cards = catalog.len(), path = %catalog_path.display(), "catalog loaded");

    let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
    let emitter = Emitter::spawn(store.clone(), config::emit_timeout());
    let sessions = Arc::new(SessionManager::new());
    let trivia: Arc<Registry<TriviaSession>> = Arc::new(Registry::new());

    // Reap idle sessions in the background.
    let ttl = config::session_ttl();
    {
        let sessions = sessions.clone();
        let trivia = trivia.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                sessions.prune_idle(ttl);
                trivia.prune_idle(ttl);
            }
        });
    }

    let state = AppState {
        catalog: Arc::new(catalog),
        store,
        sessions,
        trivia,
        emitter,
        game: GameConfig::from_env(),
    };
    let app = http::router(state);

    let addr = config::server_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
