use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use telegram_module::TelegramClient;
use tracing::info;

use relay_module::control::{start_control_thread, ControlLoop};
use relay_module::discord_gateway::{start_discord_client, RelayHandlerState};
use relay_module::{ErrorLog, OrderLedger, RelayConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = Arc::new(RelayConfig::from_env()?);
    let ledger = OrderLedger::new(config.orders_file.clone());
    let error_log = ErrorLog::with_secrets(
        config.error_log_file.clone(),
        config.secret_redactions(),
    );

    info!(
        "relay starting: ledger={}, channel={}, chat={}",
        config.orders_file.display(),
        config.discord_channel_id,
        config.telegram_chat_id
    );

    if let Err(err) = ledger.migrate_if_needed() {
        error_log.log_error(&format!("ledger migration failed: {}", err));
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let control = ControlLoop::new(config.clone(), ledger.clone(), error_log.clone());
    let _control_thread = start_control_thread(control, stop_flag);

    let state = RelayHandlerState {
        telegram: TelegramClient::new(config.telegram_token.clone()),
        config,
        ledger,
        error_log,
    };
    start_discord_client(state).await?;

    Ok(())
}
