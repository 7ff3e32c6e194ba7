//! Light/dark preference, persisted under the `theme` key.

use std::fmt;

use crate::storage::{Storage, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Font Awesome class for the toggle button.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Light => "fas fa-sun",
            Theme::Dark => "fas fa-moon",
        }
    }

    /// Saved preference, dark when unset or unrecognised.
    pub fn load(storage: &impl Storage) -> Self {
        storage
            .get_item(THEME_KEY)
            .and_then(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
