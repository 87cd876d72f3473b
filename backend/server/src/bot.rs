//! # Telegram Bot
//!
//! Optional long-polling loop, enabled with `TELEGRAM_POLLING=true`.
//!
//! - `/start`, `/ayuda` and `/id` answer with fixed text
//! - Plain `suscribir` and `desuscribir` add or remove the chat from the alert subscribers
//! - Any other plain text gets a hint pointing at `/ayuda`
use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    state::State,
    telegram::{ChatId, IncomingMessage, MessageOptions},
};

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

const WELCOME: &str = "¡Hola! Soy un bot de bautismos. Puedo ayudarte con información sobre bautismos y registros. Usa /ayuda para ver los comandos disponibles.";

const HELP: &str = "Comandos disponibles:\n\n\
/start - Iniciar el bot\n\
/ayuda - Mostrar esta ayuda\n\
/id - Obtener tu ID de chat\n\n\
Otras funciones:\n\
- Envía \"suscribir\" para recibir notificaciones de personas perdidas\n\
- Envía \"desuscribir\" para dejar de recibir notificaciones";

const UNKNOWN: &str = "Lo siento, no entiendo ese mensaje. Usa /ayuda para ver los comandos disponibles o envía \"suscribir\" para recibir notificaciones de personas perdidas.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    ChatId,
    Subscribe,
    Unsubscribe,
    Unknown,
}

impl Command {
    /// Unrecognized slash commands are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(command) = text.strip_prefix('/') {
            // "/id@SomeBot" addresses a specific bot in group chats
            let name = command.split_whitespace().next().unwrap_or_default();
            let name = name.split('@').next().unwrap_or_default();

            return match name {
                "start" => Some(Command::Start),
                "ayuda" => Some(Command::Help),
                "id" => Some(Command::ChatId),
                _ => None,
            };
        }

        match text.to_lowercase().as_str() {
            "suscribir" => Some(Command::Subscribe),
            "desuscribir" => Some(Command::Unsubscribe),
            _ => Some(Command::Unknown),
        }
    }
}

async fn reply(state: &State, command: Command, chat_id: &ChatId, sender: &str) -> String {
    match command {
        Command::Start => WELCOME.to_string(),
        Command::Help => HELP.to_string(),
        Command::ChatId => format!(
            "Tu ID de chat es: {chat_id}\n\nGuarda este número para configurar el bot correctamente."
        ),
        Command::Subscribe => match state.subscribers.subscribe(chat_id, sender).await {
            Ok(true) => "✅ ¡Te has suscrito correctamente! Recibirás notificaciones cuando haya personas perdidas que necesiten ayuda.".to_string(),
            Ok(false) => "📝 Ya estás suscrito para recibir notificaciones de personas perdidas.".to_string(),
            Err(e) => {
                warn!("Failed to subscribe chat {chat_id}: {e}");
                "No se pudo completar la suscripción, inténtalo de nuevo más tarde.".to_string()
            }
        },
        Command::Unsubscribe => match state.subscribers.unsubscribe(chat_id).await {
            Ok(true) => "❌ Te has desuscrito correctamente. Ya no recibirás notificaciones de personas perdidas.".to_string(),
            Ok(false) => "📝 No estabas suscrito a las notificaciones de personas perdidas.".to_string(),
            Err(e) => {
                warn!("Failed to unsubscribe chat {chat_id}: {e}");
                "No se pudo cancelar la suscripción, inténtalo de nuevo más tarde.".to_string()
            }
        },
        Command::Unknown => UNKNOWN.to_string(),
    }
}

pub async fn handle_message(state: &State, message: &IncomingMessage) {
    let Some(command) = message.text.as_deref().and_then(Command::parse) else {
        return;
    };

    let chat_id = ChatId::new(message.chat.id.to_string());
    let sender = message
        .from
        .as_ref()
        .map(|user| user.full_name())
        .unwrap_or_default();

    debug!("Message from {sender} in chat {chat_id}: {command:?}");

    let text = reply(state, command, &chat_id, &sender).await;

    if let Err(e) = state
        .telegram
        .send_message(&chat_id, &text, &MessageOptions::default())
        .await
    {
        warn!("Failed to reply to chat {chat_id}: {e}");
    }
}

/// Polls Telegram for messages until the server shuts down.
pub async fn run_polling(state: Arc<State>) {
    let mut shutdown = state.on_shutdown();
    let mut offset = 0;

    info!("Telegram polling started");

    loop {
        let updates = tokio::select! {
            updates = state.telegram.get_updates(offset, POLL_TIMEOUT_SECS) => updates,
            _ = shutdown.changed() => break,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);

                    if let Some(message) = &update.message {
                        handle_message(&state, message).await;
                    }
                }
            }
            Err(e) => {
                warn!("Telegram polling failed: {e}");

                tokio::select! {
                    _ = sleep(RETRY_DELAY) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
    }

    info!("Telegram polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/ayuda"), Some(Command::Help));
        assert_eq!(Command::parse("/id@BautismosBot"), Some(Command::ChatId));
        assert_eq!(Command::parse("/info"), None);
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Command::parse("  Suscribir "), Some(Command::Subscribe));
        assert_eq!(Command::parse("DESUSCRIBIR"), Some(Command::Unsubscribe));
        assert_eq!(Command::parse("hola"), Some(Command::Unknown));
    }
}
