//! Textual control commands (serial console / simulator).

use crate::loader::ConfigName;
use crate::page::MENU_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `menu1`..`menu5`
    ShowMenu(u8),
    /// `reset <name>`: restore a config file to factory defaults and reload it.
    Reset(ConfigName),
    Restart,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        match (word, arg) {
            ("restart", "") => Command::Restart,
            ("reset", name) => ConfigName::parse(name).map_or(Command::Unknown, Command::Reset),
            (word, "") => word
                .strip_prefix("menu")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=MENU_COUNT).contains(n))
                .map_or(Command::Unknown, Command::ShowMenu),
            _ => Command::Unknown,
        }
    }
}
