#[tokio::main]
async fn main() -> roomchat::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("roomchat=info"))
        .init();
    log::info!("Starting roomchat");

    match roomchat::run().await {
        Ok(()) => {
            log::info!("Chat shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Chat encountered an error: {}", e);
            Err(e)
        }
    }
}
