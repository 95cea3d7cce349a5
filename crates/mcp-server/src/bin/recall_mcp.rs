use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    recall_mcp::main_entry().await
}
