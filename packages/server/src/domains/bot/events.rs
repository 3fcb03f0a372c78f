//! Inbound event shapes the router dispatches on.

use std::str::FromStr;

use telegram::Update;

/// A text command, e.g. `/start 42` or the admin surface `broadcast <text>`.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub caller_id: i64,
    pub caller_name: String,
    pub command: String,
    pub args_text: String,
}

/// A button press.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub caller_id: i64,
    pub caller_name: String,
    pub action: String,
    pub args_text: String,
}

#[derive(Debug, Clone)]
pub enum InboundEvent {
    Command(CommandEvent),
    Callback(CallbackEvent),
}

/// The fixed set of button actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    DailyReward,
    MyAccount,
    WithdrawRequest,
    CheckJoin,
    StartMenu,
}

impl CallbackAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DailyReward => "daily_reward",
            Self::MyAccount => "my_account",
            Self::WithdrawRequest => "withdraw_request",
            Self::CheckJoin => "check_join",
            Self::StartMenu => "start_menu_btn",
        }
    }
}

impl FromStr for CallbackAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "daily_reward" => Ok(Self::DailyReward),
            "my_account" => Ok(Self::MyAccount),
            "withdraw_request" => Ok(Self::WithdrawRequest),
            "check_join" => Ok(Self::CheckJoin),
            "start_menu_btn" => Ok(Self::StartMenu),
            _ => Err(()),
        }
    }
}

impl InboundEvent {
    /// Convert a transport update into an event, if it carries one.
    pub fn from_update(update: &Update) -> Option<Self> {
        if let Some(message) = &update.message {
            let from = message.from.as_ref()?;
            let text = message.text.as_deref()?.trim();
            if text.is_empty() {
                return None;
            }
            let (command, args_text) = match text.split_once(char::is_whitespace) {
                Some((head, rest)) => (head.to_string(), rest.trim().to_string()),
                None => (text.to_string(), String::new()),
            };
            return Some(Self::Command(CommandEvent {
                caller_id: from.id,
                caller_name: from.first_name.clone(),
                command,
                args_text,
            }));
        }

        if let Some(callback) = &update.callback_query {
            let data = callback.data.as_deref().unwrap_or_default();
            let (action, args_text) = match data.split_once(':') {
                Some((action, args)) => (action.to_string(), args.to_string()),
                None => (data.to_string(), String::new()),
            };
            return Some(Self::Callback(CallbackEvent {
                caller_id: callback.from.id,
                caller_name: callback.from.first_name.clone(),
                action,
                args_text,
            }));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_splits_head_and_args() {
        let raw = r#"{
            "update_id": 1,
            "message": {
                "message_id": 2,
                "from": {"id": 9, "first_name": "A"},
                "chat": {"id": 9},
                "text": "broadcast hello   world"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let Some(InboundEvent::Command(event)) = InboundEvent::from_update(&update) else {
            panic!("expected command event");
        };
        assert_eq!(event.command, "broadcast");
        assert_eq!(event.args_text, "hello   world");
    }

    #[test]
    fn callback_actions_round_trip() {
        for action in [
            CallbackAction::DailyReward,
            CallbackAction::MyAccount,
            CallbackAction::WithdrawRequest,
            CallbackAction::CheckJoin,
            CallbackAction::StartMenu,
        ] {
            assert_eq!(action.as_str().parse::<CallbackAction>(), Ok(action));
        }
        assert!("launch_missiles".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn update_without_payload_yields_no_event() {
        let raw = r#"{"update_id": 3}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert!(InboundEvent::from_update(&update).is_none());
    }
}
