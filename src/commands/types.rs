//! Command types and definitions.

use std::fmt;

use crate::telegram::UserId;

/// Moderation commands that act on a single target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Mute,
    Unmute,
    Ban,
    Unban,
    Kick,
    Promote,
    Demote,
}

impl ModerationAction {
    /// Command name, also the verb used in user-facing messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Kick => "kick",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "mute" => Some(Self::Mute),
            "unmute" => Some(Self::Unmute),
            "ban" => Some(Self::Ban),
            "unban" => Some(Self::Unban),
            "kick" => Some(Self::Kick),
            "promote" => Some(Self::Promote),
            "demote" => Some(Self::Demote),
            _ => None,
        }
    }
}

/// Sub-commands of `release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseAction {
    /// Bare `release`: show the menu.
    Menu,
    On,
    Off,
    /// Name as typed; may be empty, which is a usage error.
    Add(String),
    Remove(String),
    List,
}

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// A moderation command with an optional explicit target id.
    Moderate(ModerationAction, Option<UserId>),

    /// Delete messages, up to the replied message or the last `count` own ones.
    Purge(Option<u32>),

    /// Send `text` `count` times.
    Spam { count: u32, text: String },

    /// Send `text` `count` times, `delay_secs` apart.
    DelaySpam {
        count: u32,
        delay_secs: u64,
        text: String,
    },

    /// Cancel all spam in the chat.
    StopSpam,

    /// Bare `spam`: show the spam menu.
    SpamMenu,

    /// Release automation control.
    Release(ReleaseAction),

    /// Show bot and host status.
    Alive,

    /// Measure round-trip latency.
    Ping,

    /// Show the main help menu.
    Help,

    /// Show the Pokémon commands menu.
    PokemonMenu,

    /// Show the admin commands menu.
    AdminMenu,

    /// List the Pokémon of a ball category.
    List(Option<String>),
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the message is not a valid command. Matching is
    /// case-sensitive and the command name must follow the prefix directly.
    #[must_use]
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(prefix)?;

        let (cmd, args) = match body.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, Some(args.trim())),
            None => (body, None),
        };
        let args = args.filter(|a| !a.is_empty());

        if let Some(action) = ModerationAction::from_name(cmd) {
            return match args {
                None => Some(Self::Moderate(action, None)),
                Some(a) => parse_digits(a).map(|id| Self::Moderate(action, Some(UserId(id)))),
            };
        }

        match cmd {
            "purge" => match args {
                None => Some(Self::Purge(None)),
                Some(a) => parse_digits(a).map(|count| Self::Purge(Some(count))),
            },
            "spam" => match args {
                None => Some(Self::SpamMenu),
                Some(a) => Self::parse_spam(a),
            },
            "delayspam" => Self::parse_delayspam(args?),
            "stopspam" => no_args(args, Self::StopSpam),
            "release" => Self::parse_release(args).map(Self::Release),
            "alive" => no_args(args, Self::Alive),
            "ping" => no_args(args, Self::Ping),
            "help" => no_args(args, Self::Help),
            "pokemon" => no_args(args, Self::PokemonMenu),
            "admin" => no_args(args, Self::AdminMenu),
            "list" => Some(Self::List(args.map(str::to_owned))),
            _ => None,
        }
    }

    /// Parses spam arguments: `<count> <text>`
    fn parse_spam(args: &str) -> Option<Self> {
        let (count, text) = args.split_once(char::is_whitespace)?;
        let count = parse_digits(count)?;
        let text = text.trim();

        if text.is_empty() {
            return None;
        }

        Some(Self::Spam {
            count,
            text: text.to_owned(),
        })
    }

    /// Parses delayspam arguments: `<count> <delay_secs> <text>`
    fn parse_delayspam(args: &str) -> Option<Self> {
        let mut parts = args.splitn(3, char::is_whitespace);
        let count = parse_digits(parts.next()?)?;
        let delay_secs = parse_digits(parts.next()?)?;
        let text = parts.next()?.trim();

        if text.is_empty() {
            return None;
        }

        Some(Self::DelaySpam {
            count,
            delay_secs,
            text: text.to_owned(),
        })
    }

    /// Parses release sub-commands: `on|off|list|add <name>|remove <name>`
    fn parse_release(args: Option<&str>) -> Option<ReleaseAction> {
        let Some(args) = args else {
            return Some(ReleaseAction::Menu);
        };

        let (sub, rest) = match args.split_once(char::is_whitespace) {
            Some((sub, rest)) => (sub, rest.trim()),
            None => (args, ""),
        };

        match sub {
            "on" if rest.is_empty() => Some(ReleaseAction::On),
            "off" if rest.is_empty() => Some(ReleaseAction::Off),
            "list" if rest.is_empty() => Some(ReleaseAction::List),
            "add" => Some(ReleaseAction::Add(rest.to_owned())),
            "remove" => Some(ReleaseAction::Remove(rest.to_owned())),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Moderate(action, _) => action.verb(),
            Self::Purge(_) => "purge",
            Self::Spam { .. } | Self::SpamMenu => "spam",
            Self::DelaySpam { .. } => "delayspam",
            Self::StopSpam => "stopspam",
            Self::Release(_) => "release",
            Self::Alive => "alive",
            Self::Ping => "ping",
            Self::Help => "help",
            Self::PokemonMenu => "pokemon",
            Self::AdminMenu => "admin",
            Self::List(_) => "list",
        }
    }

    /// Returns all available commands as `(usage, description)` pairs, grouped by menu.
    #[must_use]
    pub fn all_commands() -> Vec<(MenuSection, &'static str, &'static str)> {
        vec![
            (MenuSection::Utility, "ping", "Pong"),
            (MenuSection::Utility, "alive", "Bot status"),
            (MenuSection::Utility, "help", "Help menu"),
            (MenuSection::Pokemon, "list <category>", "List Pokémon by ball category"),
            (MenuSection::Pokemon, "release", "Pokémon release menu"),
            (MenuSection::Admin, "mute", "Mute a user"),
            (MenuSection::Admin, "unmute", "Unmute a user"),
            (MenuSection::Admin, "ban", "Ban a user"),
            (MenuSection::Admin, "unban", "Unban a user"),
            (MenuSection::Admin, "promote", "Promote a user to admin"),
            (MenuSection::Admin, "demote", "Demote an admin"),
            (MenuSection::Admin, "kick", "Kick a user"),
            (MenuSection::Purge, "purge", "Reply to a message to delete everything after it"),
            (MenuSection::Purge, "purge <count>", "Delete your last <count> messages"),
            (MenuSection::Spam, "spam <count> <message>", "Spam a message multiple times"),
            (
                MenuSection::Spam,
                "delayspam <count> <delay> <message>",
                "Spam a message with a delay (seconds) between each message",
            ),
            (MenuSection::Spam, "stopspam", "Stop all ongoing spam in the current chat"),
            (MenuSection::Release, "release on", "Start auto-releasing Pokémon"),
            (MenuSection::Release, "release off", "Stop auto-releasing Pokémon"),
            (MenuSection::Release, "release add <name>", "Add a Pokémon to the release list"),
            (
                MenuSection::Release,
                "release remove <name>",
                "Remove a Pokémon from the release list",
            ),
            (MenuSection::Release, "release list", "Show the Pokémon in the release list"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moderate(action, Some(id)) => write!(f, "{} {id}", action.verb()),
            Self::Purge(Some(count)) => write!(f, "purge {count}"),
            Self::Spam { count, .. } => write!(f, "spam {count} <text>"),
            Self::DelaySpam {
                count, delay_secs, ..
            } => write!(f, "delayspam {count} {delay_secs} <text>"),
            Self::Release(ReleaseAction::On) => write!(f, "release on"),
            Self::Release(ReleaseAction::Off) => write!(f, "release off"),
            Self::Release(ReleaseAction::List) => write!(f, "release list"),
            Self::Release(ReleaseAction::Add(name)) => write!(f, "release add {name}"),
            Self::Release(ReleaseAction::Remove(name)) => write!(f, "release remove {name}"),
            Self::List(Some(category)) => write!(f, "list {category}"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Help menus a command is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    Utility,
    Pokemon,
    Admin,
    Purge,
    Spam,
    Release,
}

/// How the reply of a command reaches the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Replace the text of the command message.
    Edit,

    /// Send a new message replying to the command.
    Reply,

    /// Send a new plain message in the chat.
    Respond,

    /// Nothing to send.
    Silent,
}

/// Result of command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Where the response goes.
    pub delivery: Delivery,
}

impl CommandResult {
    /// Creates a successful result shown by editing the command.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            delivery: Delivery::Edit,
        }
    }

    /// Creates an error result shown by editing the command.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            delivery: Delivery::Edit,
        }
    }

    /// Creates a successful result with nothing to show.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            success: true,
            message: String::new(),
            delivery: Delivery::Silent,
        }
    }

    /// Delivers the result as a reply to the command instead.
    #[must_use]
    pub fn replying(mut self) -> Self {
        self.delivery = Delivery::Reply;
        self
    }

    /// Delivers the result as a new message instead.
    #[must_use]
    pub fn responding(mut self) -> Self {
        self.delivery = Delivery::Respond;
        self
    }
}

/// Parses a run of ASCII digits; anything else (including signs) is rejected.
fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn no_args(args: Option<&str>, command: BotCommand) -> Option<BotCommand> {
    args.is_none().then_some(command)
}
