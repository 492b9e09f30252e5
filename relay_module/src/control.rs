//! Telegram remote-control loop.
//!
//! A dedicated polling thread long-polls `getUpdates` and answers a fixed set
//! of read-only status commands. The update cursor strictly increases and is
//! advanced for every update seen, including ignored ones — a skipped update
//! is never retried. Any cycle failure is logged and followed by a fixed
//! backoff; the loop only stops with the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use telegram_module::{TelegramClient, TelegramError, Update};
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error_log::ErrorLog;
use crate::ledger::OrderLedger;
use crate::order::OrderRecord;
use crate::uptime::{format_uptime, seconds_since};

/// How many error-log lines `/errorlogs` returns.
const ERROR_LOG_TAIL: usize = 20;

/// Small pause between the typing indicator and the reply.
const REPLY_DELAY: Duration = Duration::from_secs(1);

/// The fixed remote command set. Anything else is silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LastOrder,
    AllOrders,
    Uptime,
    VpsUptime,
    ErrorLogs,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/lastorder" => Some(Self::LastOrder),
            "/allorders" => Some(Self::AllOrders),
            "/uptime" => Some(Self::Uptime),
            "/vpsuptime" => Some(Self::VpsUptime),
            "/errorlogs" => Some(Self::ErrorLogs),
            _ => None,
        }
    }
}

/// Extract the command from an update, if it is a text message from the one
/// authorized chat. Unauthorized senders get no reply and no state change.
pub fn authorized_command(update: &Update, authorized_chat_id: i64) -> Option<Command> {
    let message = update.message.as_ref()?;
    if message.chat.id != authorized_chat_id {
        return None;
    }
    Command::parse(message.text.as_deref()?)
}

/// The control loop and the read-only state its replies come from.
pub struct ControlLoop {
    config: Arc<RelayConfig>,
    client: TelegramClient,
    ledger: OrderLedger,
    error_log: ErrorLog,
}

impl ControlLoop {
    pub fn new(config: Arc<RelayConfig>, ledger: OrderLedger, error_log: ErrorLog) -> Self {
        let client = TelegramClient::new(config.telegram_token.clone());
        Self {
            config,
            client,
            ledger,
            error_log,
        }
    }

    #[cfg(test)]
    fn with_client(
        config: Arc<RelayConfig>,
        client: TelegramClient,
        ledger: OrderLedger,
        error_log: ErrorLog,
    ) -> Self {
        Self {
            config,
            client,
            ledger,
            error_log,
        }
    }

    /// Poll once and dispatch whatever arrived. Advances `offset` past every
    /// update seen, handled or not. Returns the number of commands answered.
    pub fn poll_once(&self, offset: &mut Option<i64>) -> Result<usize, TelegramError> {
        let updates = self
            .client
            .get_updates(*offset, self.config.poll_timeout_secs)?;

        let mut handled = 0;
        for update in updates {
            *offset = Some(update.update_id + 1);
            let command = match authorized_command(&update, self.config.telegram_chat_id) {
                Some(command) => command,
                None => continue,
            };
            self.answer(command);
            handled += 1;
        }
        Ok(handled)
    }

    fn answer(&self, command: Command) {
        debug!("control command: {:?}", command);
        if let Err(err) = self
            .client
            .send_chat_action(self.config.telegram_chat_id, "typing")
        {
            debug!("typing action failed: {}", err);
        }
        thread::sleep(REPLY_DELAY);

        let reply = self.build_reply(command);
        if let Err(err) =
            self.client
                .send_message(self.config.telegram_chat_id, &reply, Some("HTML"))
        {
            self.error_log
                .log_error(&format!("telegram send failed: {}", err));
        }
    }

    /// Formatted reply for a command, reading through the ledger and the
    /// error log every time.
    pub fn build_reply(&self, command: Command) -> String {
        match command {
            Command::LastOrder => last_order_reply(&self.ledger.load_unique()),
            Command::AllOrders => {
                format!("📊 Total orders: {}", self.ledger.load_unique().len())
            }
            Command::Uptime => format!(
                "⏱ Bot Uptime: {}",
                format_uptime(seconds_since(self.config.started_at, Utc::now()))
            ),
            Command::VpsUptime => format!(
                "🖥 VPS Uptime: {}",
                format_uptime(seconds_since(self.config.vps_started_at, Utc::now()))
            ),
            Command::ErrorLogs => error_logs_reply(&self.error_log.tail(ERROR_LOG_TAIL)),
        }
    }

    /// Run until the stop flag is raised (in practice, until the process
    /// terminates). Transient failures never end the loop.
    pub fn run_loop(&self, stop_flag: &AtomicBool) {
        info!(
            "control loop polling with {}s long-poll, {:?} backoff",
            self.config.poll_timeout_secs, self.config.poll_backoff
        );

        let mut offset: Option<i64> = None;
        while !stop_flag.load(Ordering::Relaxed) {
            if let Err(err) = self.poll_once(&mut offset) {
                self.error_log
                    .log_error(&format!("telegram polling failed: {}", err));
            }
            thread::sleep(self.config.poll_backoff);
        }

        info!("control loop stopped");
    }
}

/// Spawn the control loop on its own thread.
pub fn start_control_thread(
    control: ControlLoop,
    stop_flag: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || control.run_loop(&stop_flag))
}

fn last_order_reply(orders: &[OrderRecord]) -> String {
    match orders.last() {
        None => "⚠️ Belum ada order.".to_string(),
        Some(last) => format!(
            "📦 <b>LAST ORDER</b>\n\
             🆔 <code>{}</code>\n\
             🙍 {}\n\
             🎮 {}\n\
             📦 {}\n\
             ⏰ {} WIB\n\
             🔗 <a href='{}'>Link</a>",
            last.id, last.buyer, last.game, last.product, last.time, last.link
        ),
    }
}

fn error_logs_reply(lines: &[String]) -> String {
    if lines.is_empty() {
        "📂 Tidak ada error logs".to_string()
    } else {
        format!(
            "📂 <b>ERROR LOGS (last {})</b>\n<pre>{}</pre>",
            ERROR_LOG_TAIL,
            lines.join("\n")
        )
    }
}
