use catalog_server::{api, router, AppState, CatalogService, Config};
use catalog_storage::{seed, CatalogStore, InMemoryStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // The store is acquired before the listener binds and lives until shutdown.
    let store = InMemoryStore::new();
    if let Some(path) = &config.seed {
        let docs = seed::read_documents(path)
            .map_err(|e| anyhow::anyhow!("seed {}: {}", path.display(), e))?;
        for d in docs {
            store.insert(d);
        }
        info!("loaded {} items from {}", store.len(), path.display());
    } else {
        info!("no CATALOG_SEED set; serving an empty catalog");
    }
    let store: Arc<dyn CatalogStore> = Arc::new(store);
    let state = AppState {
        catalog: CatalogService::new(store),
    };
    let app = router(state, api::cors_layer(config.cors_origin.as_deref()));

    info!("http listening on {}", config.addr);
    match &config.tls {
        Some(tls) => {
            let rustls =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            axum_server::bind_rustls(config.addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(config.addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
