/// Chat commands the bot understands. Registration itself is persisted
/// through the store so it survives worker restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    pub fn reply(self) -> &'static str {
        match self {
            Command::Start => "Subscribed to energy alerts.",
            Command::Stop => "Unsubscribed from energy alerts.",
        }
    }
}

pub fn parse_command(text: &str) -> Option<Command> {
    match text.trim() {
        "/start" => Some(Command::Start),
        "/stop" => Some(Command::Stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_stop_are_recognized() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command(" /stop "), Some(Command::Stop));
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/starter"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn commands_have_confirmation_replies() {
        assert_eq!(Command::Start.reply(), "Subscribed to energy alerts.");
        assert_eq!(Command::Stop.reply(), "Unsubscribed from energy alerts.");
    }
}
