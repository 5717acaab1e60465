#[tokio::main]
async fn main() {
    if let Err(e) = consultorio_lib::run().await {
        eprintln!("consultorio: {e}");
        std::process::exit(1);
    }
}
