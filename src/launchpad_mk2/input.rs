use super::{
    DeviceMode, GridPosition, WireVariant, GRID_SIZE, PAGE_COLUMN, VELOCITY_PRESSED,
    VELOCITY_RELEASED,
};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// A decoded Launchpad MK2 input message
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum DeviceEvent {
    GridPressed(GridPosition),
    GridReleased(GridPosition),
    /// One of the page buttons to the right of the grid was pressed
    PageSelectPressed(u8),
    /// A top-row (automap) button, identified by its controller number
    SecondaryPressed(u8),
    SecondaryReleased(u8),
    /// Anything malformed, out of range, or not interesting
    Ignored,
}

impl DeviceEvent {
    /// Returns the mode a secondary press switches to, if it was one of the mode buttons
    pub fn mode_switch(&self) -> Option<DeviceMode> {
        match *self {
            Self::SecondaryPressed(cc) => DeviceMode::from_controller_number(cc),
            _ => None,
        }
    }
}

enum Velocity {
    Pressed,
    Released,
}

fn decode_velocity(velocity: u8) -> Option<Velocity> {
    match velocity {
        VELOCITY_PRESSED => Some(Velocity::Pressed),
        VELOCITY_RELEASED => Some(Velocity::Released),
        _ => None,
    }
}

impl WireVariant {
    /// Decode a raw device message. Anything other than a 3-byte short message with a
    /// press/release velocity decodes to [`DeviceEvent::Ignored`].
    pub fn decode(self, data: &[u8]) -> DeviceEvent {
        let (status, key, value) = match *data {
            [status, key, value] => (status, key, value),
            _ => return DeviceEvent::Ignored,
        };

        match status & 0xF0 {
            NOTE_ON => match decode_velocity(value) {
                Some(velocity) => self.decode_grid(key, velocity),
                None => DeviceEvent::Ignored,
            },
            // Newer firmware releases with a note-off instead of a zero-velocity note-on. The
            // velocity byte carries no information there.
            NOTE_OFF => self.decode_grid(key, Velocity::Released),
            CONTROL_CHANGE => match decode_velocity(value) {
                Some(Velocity::Pressed) => DeviceEvent::SecondaryPressed(key),
                Some(Velocity::Released) => DeviceEvent::SecondaryReleased(key),
                None => DeviceEvent::Ignored,
            },
            _ => DeviceEvent::Ignored,
        }
    }

    fn decode_grid(self, key: u8, velocity: Velocity) -> DeviceEvent {
        let (row, column) = match self.split_keycode(key) {
            Some(split) => split,
            None => return DeviceEvent::Ignored,
        };

        if column == PAGE_COLUMN {
            return match velocity {
                Velocity::Pressed => DeviceEvent::PageSelectPressed(row),
                Velocity::Released => DeviceEvent::Ignored,
            };
        }

        match GridPosition::new(row, column) {
            Some(pos) => match velocity {
                Velocity::Pressed => DeviceEvent::GridPressed(pos),
                Velocity::Released => DeviceEvent::GridReleased(pos),
            },
            None => DeviceEvent::Ignored,
        }
    }

    /// Synthesize the message the device sends when a grid cell is pressed or released.
    pub fn encode_event(self, pos: GridPosition, pressed: bool) -> Vec<u8> {
        let velocity = if pressed {
            VELOCITY_PRESSED
        } else {
            VELOCITY_RELEASED
        };
        vec![NOTE_ON, self.keycode(pos), velocity]
    }

    /// Synthesize the message the device sends when a page button is pressed.
    pub fn encode_page_press(self, page: u8) -> Vec<u8> {
        assert!(page < GRID_SIZE);
        vec![NOTE_ON, self.page_keycode(page), VELOCITY_PRESSED]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANTS: [WireVariant; 2] = [WireVariant::Palette, WireVariant::Rgb];

    fn pos(row: u8, column: u8) -> GridPosition {
        GridPosition::new(row, column).unwrap()
    }

    #[test]
    fn test_round_trip_all_cells() {
        for variant in VARIANTS {
            for p in GridPosition::all() {
                assert_eq!(
                    variant.decode(&variant.encode_event(p, true)),
                    DeviceEvent::GridPressed(p)
                );
                assert_eq!(
                    variant.decode(&variant.encode_event(p, false)),
                    DeviceEvent::GridReleased(p)
                );
            }
        }
    }

    #[test]
    fn test_palette_example() {
        let variant = WireVariant::Palette;
        assert_eq!(
            variant.decode(&[0x90, 0x04, 0x7F]),
            DeviceEvent::GridPressed(pos(0, 4))
        );
        assert_eq!(
            variant.decode(&[0x90, 0x04, 0x00]),
            DeviceEvent::GridReleased(pos(0, 4))
        );
    }

    #[test]
    fn test_rgb_keycodes() {
        let variant = WireVariant::Rgb;
        assert_eq!(
            variant.decode(&[0x90, 11, 0x7F]),
            DeviceEvent::GridPressed(pos(0, 0))
        );
        assert_eq!(
            variant.decode(&[0x90, 88, 0x7F]),
            DeviceEvent::GridPressed(pos(7, 7))
        );
        // Below the origin
        assert_eq!(variant.decode(&[0x90, 5, 0x7F]), DeviceEvent::Ignored);
        // Left of the grid
        assert_eq!(variant.decode(&[0x90, 20, 0x7F]), DeviceEvent::Ignored);
    }

    #[test]
    fn test_page_select() {
        for variant in VARIANTS {
            for page in 0..8 {
                assert_eq!(
                    variant.decode(&variant.encode_page_press(page)),
                    DeviceEvent::PageSelectPressed(page)
                );
            }
        }
        assert_eq!(
            WireVariant::Rgb.decode(&[0x90, 39, 0x7F]),
            DeviceEvent::PageSelectPressed(2)
        );
        assert_eq!(
            WireVariant::Rgb.decode(&[0x90, 39, 0x00]),
            DeviceEvent::Ignored
        );
    }

    #[test]
    fn test_malformed_messages() {
        for variant in VARIANTS {
            assert_eq!(variant.decode(&[0x90, 0x04]), DeviceEvent::Ignored);
            assert_eq!(variant.decode(&[]), DeviceEvent::Ignored);
            assert_eq!(variant.decode(&[0x90, 0x04, 0x7F, 0x00]), DeviceEvent::Ignored);
            // Out-of-band velocity
            assert_eq!(variant.decode(&[0x90, 0x04 + variant.origin(), 0x40]), DeviceEvent::Ignored);
            // Above the top row
            assert_eq!(variant.decode(&[0x90, 0x7F, 0x7F]), DeviceEvent::Ignored);
            // Unknown status
            assert_eq!(variant.decode(&[0xE0, 0x04, 0x7F]), DeviceEvent::Ignored);
        }
    }

    #[test]
    fn test_note_off_releases() {
        assert_eq!(
            WireVariant::Rgb.decode(&[0x80, 11, 0x40]),
            DeviceEvent::GridReleased(pos(0, 0))
        );
    }

    #[test]
    fn test_secondary_buttons() {
        let variant = WireVariant::Rgb;
        assert_eq!(
            variant.decode(&[0xB0, 104, 0x7F]),
            DeviceEvent::SecondaryPressed(104)
        );
        assert_eq!(
            variant.decode(&[0xB0, 104, 0x00]),
            DeviceEvent::SecondaryReleased(104)
        );
        assert_eq!(
            variant.decode(&[0xB0, 109, 0x7F]).mode_switch(),
            Some(DeviceMode::User1)
        );
        assert_eq!(variant.decode(&[0xB0, 104, 0x7F]).mode_switch(), None);
    }
}
