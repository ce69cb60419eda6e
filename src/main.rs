#[tokio::main]
async fn main() {
    let code = pagewatch::app::startup::startup().await;
    std::process::exit(code);
}
