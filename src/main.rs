use lingua_sprint::api::{app_router, ApiState};
use lingua_sprint::app::App;
use lingua_sprint::config::Config;
use lingua_sprint::content::Catalog;
use lingua_sprint::db::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    let catalog = match &config.content_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::bundled()?,
    };
    let db = Db::connect(&config.database_url).await?;
    let app = App::new(db, catalog).await?;

    let db = app.db.clone();
    let router = app_router(ApiState::new(app));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("lingua-sprint listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    db.close().await;
    log::info!("database closed");

    Ok(())
}
