#[tokio::main]
async fn main() -> semantic_annotator::Result<()> {
    semantic_annotator::cli::main().await
}
