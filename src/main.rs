use item_registry::{api, config, logging, registry::RegistryService};
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    let config = config::get_config();

    let mut app = api::create_router(Arc::new(RegistryService::new()));
    if config.permissive_cors {
        tracing::warn!(
            "Permissive CORS enabled: any origin, method, and header accepted, with credentials (demonstration policy)"
        );
        app = app.layer(api::permissive_cors_layer());
    }

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    let port = config.server_port.unwrap_or(DEFAULT_PORT);
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .map(|listener| (listener, port))
}
