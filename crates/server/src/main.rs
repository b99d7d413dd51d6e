#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kidcare_server::start().await
}
