use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let user = std::env::var("BLESTA_API_USER").unwrap_or_else(|_| "demo".to_string());
    let key = std::env::var("BLESTA_API_KEY").unwrap_or_else(|_| "demo-key".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %user, "mock Blesta API listening at http://{addr}/api/");
    mock_server::run(listener, &user, &key).await
}
