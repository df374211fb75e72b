//! # Gratibot Channels
//! Chat transport implementations. Telegram is the only channel: the bot
//! talks to the Bot API directly over HTTPS with long polling, no webhook
//! server and no bot framework.

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramConfig};
