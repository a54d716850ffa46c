//! Help menus, rendered from the command table with the active prefix.

use super::types::{BotCommand, MenuSection};

/// Renders the main help menu.
pub fn help_menu(prefix: &str) -> String {
    let mut text = String::from("**Help Menu**\n");

    for (title, section) in [
        ("Pokémon Commands", MenuSection::Pokemon),
        ("Utility Commands", MenuSection::Utility),
        ("Admin Commands", MenuSection::Admin),
        ("Purge Commands", MenuSection::Purge),
    ] {
        text.push_str(&format!("\n**{title}**\n"));
        if section == MenuSection::Pokemon {
            text.push_str(&format!("• `{prefix}pokemon` - Show Pokémon-related commands\n"));
        }
        text.push_str(&section_lines(prefix, section));
    }

    text.push_str("\n**Spam Commands**\n");
    text.push_str(&format!("• `{prefix}spam` - Spam commands menu\n"));
    text
}

/// Renders the menu of a single section.
pub fn section_menu(prefix: &str, section: MenuSection) -> String {
    let title = match section {
        MenuSection::Utility => "Utility Commands",
        MenuSection::Pokemon => "Pokémon Commands",
        MenuSection::Admin => "Admin Commands",
        MenuSection::Purge => "Purge Commands",
        MenuSection::Spam => "Spam Commands",
        MenuSection::Release => "Release Commands",
    };

    format!("**{title}**\n\n{}", section_lines(prefix, section))
}

fn section_lines(prefix: &str, section: MenuSection) -> String {
    BotCommand::all_commands()
        .into_iter()
        .filter(|(s, _, _)| *s == section)
        .map(|(_, usage, desc)| format!("• `{prefix}{usage}` - {desc}\n"))
        .collect()
}
