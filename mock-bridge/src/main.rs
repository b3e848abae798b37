use mock_bridge::BridgeState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");

    let mut state = BridgeState::seeded();
    if let Ok(key) = std::env::var("HUE_APPLICATION_KEY") {
        state.application_key = key;
    }

    let listener = TcpListener::bind(&addr).await?;
    println!("mock bridge listening on http://{addr}");
    println!("application key: {}", state.application_key);
    println!("v1 username: {}", state.username);
    mock_bridge::run_with(listener, state).await
}
