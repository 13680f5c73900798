/*!
# Launchpad MK2 wire protocol

The surface is addressed as an 8x8 grid of cells, `(row, column)`, with `(0, 0)` in the
bottom-left corner. On the wire each cell is identified by a single keycode byte:

```text
keycode = origin + 10 * row + column
```

The column just right of the grid, [`PAGE_COLUMN`], holds the round "scene" buttons which
select the active page (row `n` selects page `n`). The origin depends on the firmware
revision, see [`WireVariant`].
*/

mod input;
pub use input::*;

mod output;
pub use output::*;

/// Number of rows and columns of the playable grid
pub const GRID_SIZE: u8 = 8;

/// Relative column (counted from the origin like grid columns) of the page-select buttons
pub const PAGE_COLUMN: u8 = 8;

/// Velocity byte of a press
pub const VELOCITY_PRESSED: u8 = 0x7F;

/// Velocity byte of a release
pub const VELOCITY_RELEASED: u8 = 0x00;

/// One cell of the 8x8 grid. Can only be constructed with in-range coordinates.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct GridPosition {
    row: u8,
    column: u8,
}

impl GridPosition {
    /// Returns `None` if either coordinate lies outside `0..8`
    pub const fn new(row: u8, column: u8) -> Option<Self> {
        if row < GRID_SIZE && column < GRID_SIZE {
            Some(Self { row, column })
        } else {
            None
        }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn column(&self) -> u8 {
        self.column
    }

    /// All 64 cells, row by row starting at the bottom
    pub fn all() -> impl Iterator<Item = GridPosition> {
        (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |column| Self { row, column }))
    }
}

/// The LED color encodings (and keycode conventions) of the supported firmware revisions.
/// Chosen by configuration, never negotiated with the device.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireVariant {
    /// Plain 3-byte note messages carrying a palette index as velocity. Keycodes start at
    /// `0x00` for the bottom-left cell.
    Palette,
    /// SysEx-wrapped RGB messages. Keycodes start at `0x0B` for the bottom-left cell, as in
    /// the MK2 programmer's reference.
    Rgb,
}

impl Default for WireVariant {
    fn default() -> Self {
        Self::Rgb
    }
}

impl WireVariant {
    /// Keycode of the bottom-left cell
    pub fn origin(self) -> u8 {
        match self {
            Self::Palette => 0x00,
            Self::Rgb => 0x0B,
        }
    }

    pub fn keycode(self, pos: GridPosition) -> u8 {
        self.origin() + 10 * pos.row + pos.column
    }

    /// Keycode of the page-select button for `page`. Panics if `page` has no button.
    pub fn page_keycode(self, page: u8) -> u8 {
        assert!(page < GRID_SIZE);
        self.origin() + 10 * page + PAGE_COLUMN
    }

    /// Splits a keycode into `(row, relative column)`; the column may be [`PAGE_COLUMN`] or
    /// beyond. `None` for keycodes below the origin or above the top row.
    fn split_keycode(self, keycode: u8) -> Option<(u8, u8)> {
        let relative = keycode.checked_sub(self.origin())?;
        let (row, column) = (relative / 10, relative % 10);
        if row < GRID_SIZE {
            Some((row, column))
        } else {
            None
        }
    }
}

/// The four mode buttons on the right of the top row. Mirrored to their LEDs; doesn't
/// influence dispatch.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[repr(u8)]
pub enum DeviceMode {
    Session = 0,
    User1 = 1,
    User2 = 2,
    Mixer = 3,
}

impl Default for DeviceMode {
    fn default() -> Self {
        Self::Session
    }
}

impl DeviceMode {
    /// Controller number of the first top-row button
    pub const FIRST_CONTROL_CC: u8 = 104;
    /// Controller number of the Session button; the other modes follow
    pub const SESSION_CC: u8 = 108;

    pub fn controller_number(self) -> u8 {
        Self::SESSION_CC + self as u8
    }

    pub fn from_controller_number(cc: u8) -> Option<Self> {
        Self::from_index(cc.checked_sub(Self::SESSION_CC)?)
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Session),
            1 => Some(Self::User1),
            2 => Some(Self::User2),
            3 => Some(Self::Mixer),
            _ => None,
        }
    }
}
