use snapshot_review::common::utils::init_logger_exe;
use std::net::SocketAddr;
use tokio::net::TcpListener;

mod service;

const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_CANVAS_PIXELS: u64 = 100_000_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_exe();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()?;
    let body_limit = match std::env::var("BODY_LIMIT_BYTES") {
        Ok(limit) => limit.parse()?,
        Err(_) => DEFAULT_BODY_LIMIT,
    };
    let canvas_pixels = match std::env::var("MAX_CANVAS_PIXELS") {
        Ok(limit) => limit.parse()?,
        Err(_) => DEFAULT_MAX_CANVAS_PIXELS,
    };
    let limits = service::Limits {
        body_bytes: body_limit,
        canvas_pixels,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    log::info!("Attempting to bind to port {}", port);
    let listener = TcpListener::bind(addr).await?;
    log::info!("Successfully bound to http://{}", addr);

    axum::serve(listener, service::app(limits)).await?;
    Ok(())
}
