use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    lockgraph_lib::main().await
}
