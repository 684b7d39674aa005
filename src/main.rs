#[tokio::main]
async fn main() -> anyhow::Result<()> {
    distload::node::run_cli().await
}
