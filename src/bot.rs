use std::fmt::Debug;
use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::update_listeners::UpdateListener;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::config::Config;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Deep-link payloads (`/start <payload>`) are accepted and ignored.
    Start(String),
}

/// A reply waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
}

pub fn start_reply(chat_id: ChatId, target_username: &str) -> OutboundMessage {
    OutboundMessage {
        chat_id,
        text: target_username.to_string(),
    }
}

pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}

/// Dispatch updates from `listener` until it stops.
pub async fn dispatch<L>(bot: Bot, config: Arc<Config>, listener: L)
where
    L: UpdateListener + Send,
    L::Err: Debug + Send,
{
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![config])
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("webhook listener"),
        )
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    config: Arc<Config>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start(_) => {
            let reply = start_reply(msg.chat.id, &config.target_username);
            info!("/start from chat {}", reply.chat_id);
            bot.send_message(reply.chat_id, reply.text).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_NAME: &str = "indiandalla1bot";

    #[test]
    fn test_parse_start() {
        let cmd = Command::parse("/start", BOT_NAME).unwrap();
        assert_eq!(cmd, Command::Start(String::new()));
    }

    #[test]
    fn test_parse_start_with_payload() {
        let cmd = Command::parse("/start ref-42", BOT_NAME).unwrap();
        assert_eq!(cmd, Command::Start("ref-42".to_string()));
    }

    #[test]
    fn test_parse_start_addressed_to_bot() {
        let cmd = Command::parse("/start@indiandalla1bot", BOT_NAME).unwrap();
        assert_eq!(cmd, Command::Start(String::new()));
    }

    #[test]
    fn test_other_commands_not_recognized() {
        assert!(Command::parse("/help", BOT_NAME).is_err());
        assert!(Command::parse("/clear", BOT_NAME).is_err());
        assert!(Command::parse("start", BOT_NAME).is_err());
        assert!(Command::parse("/start@some_other_bot", BOT_NAME).is_err());
    }

    #[test]
    fn test_start_reply_goes_to_originating_chat() {
        let reply = start_reply(ChatId(-100123), "@indiandalla1bot");
        assert_eq!(reply.chat_id, ChatId(-100123));
        assert_eq!(reply.text, "@indiandalla1bot");
    }

    #[test]
    fn test_start_reply_text_is_exactly_the_username() {
        for chat in [1_i64, 42, 987_654_321] {
            let reply = start_reply(ChatId(chat), "@target");
            assert_eq!(
                reply,
                OutboundMessage {
                    chat_id: ChatId(chat),
                    text: "@target".to_string(),
                }
            );
        }
    }
}
