#[tokio::main]
async fn main() -> std::io::Result<()> {
    snake_server::frameworks::server::run_with_config().await
}
