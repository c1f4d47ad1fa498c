#[tokio::main]
async fn main() -> anyhow::Result<()> {
    smokenotes_lib::run().await
}
