#[tokio::main]
async fn main() -> anyhow::Result<()> {
    watchlist_lib::run().await?;
    Ok(())
}
