//! JSON layout files.
//!
//! ```json
//! {
//!     "device": { "keyword": "Launchpad MK2", "wire_variant": "rgb" },
//!     "session": {
//!         "0": [
//!             { "type": "key", "position": [0, 0], "data": 65, "color": 4144896 },
//!             { "type": "string", "position": [7, 5], "data": "test!" }
//!         ]
//!     }
//! }
//! ```
//!
//! `color` is a palette index under the `palette` wire variant and `0xRRGGBB` under `rgb`.
//! Broken button entries are logged and skipped; the rest of the layout still loads.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::button::{Button, Pacing};
use crate::controller::Settings;
use crate::launchpad_mk2::{GridPosition, PaletteColor, WireVariant};
use crate::page::{Page, PageSet, MAX_PAGES};
use crate::{some_or_continue, ConfigError, EntryError};

/// Device-level settings, all optional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Substring of the MIDI port names to connect to
    pub keyword: String,
    pub wire_variant: WireVariant,
    /// Palette index shown while a cell is held
    pub highlight_color: u8,
    pub key_hold_ms: u64,
    pub macro_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            keyword: "Launchpad MK2".to_owned(),
            wire_variant: WireVariant::default(),
            highlight_color: PaletteColor::PURPLE.id(),
            key_hold_ms: pacing.key_hold.as_millis() as u64,
            macro_interval_ms: pacing.macro_interval.as_millis() as u64,
        }
    }
}

impl DeviceConfig {
    pub fn settings(&self) -> Settings {
        let highlight = PaletteColor::try_from(self.highlight_color).unwrap_or_else(|id| {
            log::warn!("Highlight color {} isn't a palette index, using the default", id);
            PaletteColor::PURPLE
        });

        Settings {
            variant: self.wire_variant,
            highlight,
            pacing: Pacing {
                key_hold: Duration::from_millis(self.key_hold_ms),
                macro_interval: Duration::from_millis(self.macro_interval_ms),
            },
            ..Settings::default()
        }
    }
}

/// A parsed layout file. Button entries stay raw until [`Config::build_pages`] so that each
/// one can fail on its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    /// Page number -> button entries
    pub session: BTreeMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ButtonEntry {
    #[serde(rename = "type")]
    kind: String,
    position: [i64; 2],
    #[serde(default)]
    data: serde_json::Value,
    color: Option<u32>,
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    /// Builds the page set. Invalid pages and entries are skipped with a warning. Colors are
    /// checked against the configured wire variant.
    pub fn build_pages(&self) -> PageSet {
        let variant = self.device.wire_variant;
        let mut pages = PageSet::new();

        for (key, entries) in &self.session {
            let index = some_or_continue!(parse_page_key(key));
            let mut page = Page::new();

            for entry in entries {
                match parse_entry(entry, variant) {
                    Ok((pos, button)) => {
                        log::debug!("Page {} {:?}: {}", index, pos, button.describe());
                        if page.set(pos, button).is_some() {
                            log::warn!("Page {} {:?} is bound twice, keeping the last", index, pos);
                        }
                    }
                    Err(e) => log::warn!("Skipping button on page {}: {}", index, e),
                }
            }

            if pages.insert(index, page).is_err() {
                log::warn!("{}", EntryError::InvalidPage { key: key.clone() });
            }
        }

        pages
    }
}

fn parse_page_key(key: &str) -> Option<usize> {
    match key.trim().parse::<usize>() {
        Ok(index) if index < MAX_PAGES => Some(index),
        _ => {
            log::warn!(
                "Skipping page: {}",
                EntryError::InvalidPage {
                    key: key.to_owned()
                }
            );
            None
        }
    }
}

fn parse_entry(
    value: &serde_json::Value,
    variant: WireVariant,
) -> Result<(GridPosition, Button), EntryError> {
    let entry = ButtonEntry::deserialize(value)?;

    let [row, column] = entry.position;
    let pos = u8::try_from(row)
        .ok()
        .zip(u8::try_from(column).ok())
        .and_then(|(row, column)| GridPosition::new(row, column))
        .ok_or(EntryError::PositionOutOfRange { row, column })?;

    let color = entry.color.unwrap_or_else(|| variant.default_color());
    if !variant.is_valid_color(color) {
        return Err(EntryError::ColorOutOfRange { color, variant });
    }
    let mismatch = || EntryError::DataMismatch {
        kind: entry.kind.clone(),
    };

    let button = match entry.kind.as_str() {
        "key" | "key_test" => {
            let code = entry
                .data
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .ok_or_else(mismatch)?;
            Button::keystroke(code, color)
        }
        "string" | "key_string" => {
            let text = entry.data.as_str().ok_or_else(mismatch)?;
            Button::string_macro(text, color)
        }
        other => {
            let kind = other.to_owned();
            Button::callback(
                move || log::info!("Test button of unknown type {:?} pressed", kind),
                color,
            )
        }
    };

    Ok((pos, button))
}
