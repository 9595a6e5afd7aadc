#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nihongo_srs_backend::run().await
}
