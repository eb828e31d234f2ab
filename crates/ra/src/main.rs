use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ra_core::{
    config::Config, consumer::Consumer, messaging::port::TelegramApi,
    processor::CommandProcessor, translator::UpdateTranslator, Error,
};
use ra_telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ra_core::logging::init("read-adviser")?;

    let cfg = Config::load()?;

    let storage = tokio::time::timeout(cfg.storage_init_timeout, ra_storage::open(&cfg.storage))
        .await
        .map_err(|_| {
            Error::Config(format!(
                "storage did not become ready within {:?}",
                cfg.storage_init_timeout
            ))
        })??;

    let tg: Arc<dyn TelegramApi> = Arc::new(TelegramClient::new(
        cfg.telegram_bot_token.clone(),
        cfg.telegram_api_url.as_deref(),
    )?);

    let mut consumer = Consumer::new(
        UpdateTranslator::new(tg.clone()),
        CommandProcessor::new(tg, storage),
        cfg.batch_size,
    )
    .with_idle_sleep(cfg.idle_sleep);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "can't listen for shutdown signal");
                return;
            }
            info!("shutdown requested");
            cancel.cancel();
        });
    }

    info!(batch_size = cfg.batch_size, "bot service is started");
    consumer.run(cancel).await;
    info!("bot service is stopped");

    Ok(())
}
