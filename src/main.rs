#[tokio::main]
async fn main() {
    niftydash::cli::run().await;
}
