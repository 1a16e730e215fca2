use logosim::{create_router, init, AppState, Config, Result, ResultExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init()?;

    let config = Config::from_env()?;
    let addr = config.bind_addr()?;
    log::info!(
        "Serving scores from {} and images from {}",
        config.data_dir.display(),
        config.image_root.display()
    );

    // Initialize application state
    let state = AppState::with_config(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
