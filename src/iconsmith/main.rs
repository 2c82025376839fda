mod cli;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            cli::print_error(&e);
            std::process::exit(1);
        }
    }
}
