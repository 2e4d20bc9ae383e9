//! Chat color tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sixteen chat colors a text channel understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl ChatColor {
    pub const ALL: [ChatColor; 16] = [
        ChatColor::Black,
        ChatColor::DarkBlue,
        ChatColor::DarkGreen,
        ChatColor::DarkAqua,
        ChatColor::DarkRed,
        ChatColor::DarkPurple,
        ChatColor::Gold,
        ChatColor::Gray,
        ChatColor::DarkGray,
        ChatColor::Blue,
        ChatColor::Green,
        ChatColor::Aqua,
        ChatColor::Red,
        ChatColor::LightPurple,
        ChatColor::Yellow,
        ChatColor::White,
    ];

    /// Upper-case token, as written in configuration
    pub fn name(&self) -> &'static str {
        match self {
            ChatColor::Black => "BLACK",
            ChatColor::DarkBlue => "DARK_BLUE",
            ChatColor::DarkGreen => "DARK_GREEN",
            ChatColor::DarkAqua => "DARK_AQUA",
            ChatColor::DarkRed => "DARK_RED",
            ChatColor::DarkPurple => "DARK_PURPLE",
            ChatColor::Gold => "GOLD",
            ChatColor::Gray => "GRAY",
            ChatColor::DarkGray => "DARK_GRAY",
            ChatColor::Blue => "BLUE",
            ChatColor::Green => "GREEN",
            ChatColor::Aqua => "AQUA",
            ChatColor::Red => "RED",
            ChatColor::LightPurple => "LIGHT_PURPLE",
            ChatColor::Yellow => "YELLOW",
            ChatColor::White => "WHITE",
        }
    }

    /// Case-insensitive lookup by token
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|color| color.name().eq_ignore_ascii_case(name))
    }

    /// ANSI SGR foreground code for terminal output
    pub fn ansi_code(&self) -> u8 {
        match self {
            ChatColor::Black => 30,
            ChatColor::DarkRed => 31,
            ChatColor::DarkGreen => 32,
            ChatColor::Gold => 33,
            ChatColor::DarkBlue => 34,
            ChatColor::DarkPurple => 35,
            ChatColor::DarkAqua => 36,
            ChatColor::Gray => 37,
            ChatColor::DarkGray => 90,
            ChatColor::Red => 91,
            ChatColor::Green => 92,
            ChatColor::Yellow => 93,
            ChatColor::Blue => 94,
            ChatColor::LightPurple => 95,
            ChatColor::Aqua => 96,
            ChatColor::White => 97,
        }
    }
}

impl fmt::Display for ChatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unknown color token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for ChatColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownColor(s.to_string()))
    }
}
