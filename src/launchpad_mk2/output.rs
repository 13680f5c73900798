use super::{DeviceMode, GridPosition, WireVariant};

/// Every SysEx command to the MK2 starts with this
const SYSEX_HEADER: [u8; 6] = [240, 0, 32, 41, 2, 24];
const SYSEX_END: u8 = 247;

const SYSEX_SET_PALETTE: u8 = 0x0A;
const SYSEX_SET_RGB: u8 = 0x0B;
const SYSEX_SET_ALL: u8 = 0x0E;

/// A color from the MK2 color palette. See the "Launchpad MK2 Programmers Reference Manual"
/// to see the palette.
///
/// Raw palette indices convert with `PaletteColor::try_from(id)`, which hands back indices
/// outside the palette.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct PaletteColor {
    pub(crate) id: u8,
}

impl PaletteColor {
    /// Highest index of the 128-color palette
    pub const MAX_ID: u8 = 127;

    pub fn is_valid(&self) -> bool {
        self.id <= Self::MAX_ID
    }

    pub fn new(id: u8) -> Self {
        let self_ = Self { id };
        assert!(self_.is_valid());
        self_
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Pure black #000000, i.e. LED off
    pub const BLACK: PaletteColor = Self { id: 0 };

    /// Page indicator of the active page
    pub const LIGHT_YELLOW: PaletteColor = Self { id: 12 };

    /// #fdfd00 (almost pure yellow #ffff00)
    pub const YELLOW: PaletteColor = Self { id: 13 };

    /// Roughly the `0x221100` brown of unconfigured RGB buttons
    pub const ORANGE: PaletteColor = Self { id: 9 };

    pub const PURPLE: PaletteColor = Self { id: 49 };
}

impl TryFrom<u8> for PaletteColor {
    /// The rejected index
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        let color = Self { id };
        if color.is_valid() {
            Ok(color)
        } else {
            Err(id)
        }
    }
}

/// Squeezes a `0xRRGGBB` color into the MK2's RGB SysEx fields. Red keeps its top four bits,
/// green its top six; blue is passed through, clipped to a 7-bit data byte.
pub fn rgb_components(color: u32) -> (u8, u8, u8) {
    let r = ((color >> 16) & 0xFF) as u8;
    let g = ((color >> 8) & 0xFF) as u8;
    let b = (color & 0xFF) as u8;
    (r >> 4, g >> 2, b & 0x7F)
}

fn sysex(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SYSEX_HEADER.len() + payload.len() + 1);
    bytes.extend_from_slice(&SYSEX_HEADER);
    bytes.extend_from_slice(payload);
    bytes.push(SYSEX_END);
    bytes
}

/// Largest `0xRRGGBB` value
const MAX_RGB: u32 = 0xFF_FFFF;

impl WireVariant {
    /// Whether `color` means anything under this variant: a palette index for
    /// [`WireVariant::Palette`], `0xRRGGBB` for [`WireVariant::Rgb`]
    pub fn is_valid_color(self, color: u32) -> bool {
        match self {
            Self::Palette => color <= u32::from(PaletteColor::MAX_ID),
            Self::Rgb => color <= MAX_RGB,
        }
    }

    /// Color of buttons that don't specify one
    pub fn default_color(self) -> u32 {
        match self {
            Self::Palette => u32::from(PaletteColor::ORANGE.id()),
            Self::Rgb => 0x221100,
        }
    }

    /// Light a cell in a button's color. Under [`WireVariant::Palette`], `color` is a palette
    /// index; under [`WireVariant::Rgb`] it's `0xRRGGBB`.
    ///
    /// Panics if the color isn't [valid](Self::is_valid_color) for this variant.
    pub fn encode_led(self, pos: GridPosition, color: u32) -> Vec<u8> {
        assert!(
            self.is_valid_color(color),
            "Color {:#x} is out of range for the {:?} variant",
            color,
            self
        );

        let key = self.keycode(pos);
        match self {
            Self::Palette => vec![0x90, key, color as u8],
            Self::Rgb => {
                let (r, g, b) = rgb_components(color);
                sysex(&[SYSEX_SET_RGB, key, r, g, b])
            }
        }
    }

    /// Light a cell with a palette color regardless of the variant
    pub fn encode_led_palette(self, pos: GridPosition, color: PaletteColor) -> Vec<u8> {
        self.encode_key_palette(self.keycode(pos), color)
    }

    pub fn encode_led_off(self, pos: GridPosition) -> Vec<u8> {
        match self {
            Self::Palette => vec![0x80, self.keycode(pos), 0x00],
            Self::Rgb => self.encode_led_palette(pos, PaletteColor::BLACK),
        }
    }

    /// Lights the page button next to row `page`
    pub fn encode_page_indicator(self, page: u8, color: PaletteColor) -> Vec<u8> {
        self.encode_key_palette(self.page_keycode(page), color)
    }

    /// Lights the top-row button of `mode`. Control buttons are lit with a controller
    /// change in either variant.
    pub fn encode_mode_indicator(self, mode: DeviceMode, color: PaletteColor) -> Vec<u8> {
        vec![0xB0, mode.controller_number(), color.id()]
    }

    /// Resets the device: all LEDs off, default layout
    pub fn encode_reset(self) -> Vec<u8> {
        vec![0xB0, 0x00, 0x00]
    }

    /// Messages that switch every grid LED off
    pub fn all_off(self) -> Vec<Vec<u8>> {
        match self {
            Self::Palette => GridPosition::all()
                .map(|pos| self.encode_led_off(pos))
                .collect(),
            Self::Rgb => vec![sysex(&[SYSEX_SET_ALL, PaletteColor::BLACK.id()])],
        }
    }

    fn encode_key_palette(self, key: u8, color: PaletteColor) -> Vec<u8> {
        match self {
            Self::Palette => vec![0x90, key, color.id()],
            Self::Rgb => sysex(&[SYSEX_SET_PALETTE, key, color.id()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u8, column: u8) -> GridPosition {
        GridPosition::new(row, column).unwrap()
    }

    #[test]
    fn test_palette_messages() {
        let variant = WireVariant::Palette;
        assert_eq!(variant.encode_led(pos(0, 4), 21), vec![0x90, 0x04, 21]);
        assert_eq!(variant.encode_led_off(pos(0, 4)), vec![0x80, 0x04, 0x00]);
        assert_eq!(
            variant.encode_led_palette(pos(1, 2), PaletteColor::PURPLE),
            vec![0x90, 12, 49]
        );
        assert_eq!(
            variant.encode_page_indicator(0, PaletteColor::LIGHT_YELLOW),
            vec![0x90, 8, 12]
        );
        assert_eq!(variant.all_off().len(), 64);
    }

    #[test]
    fn test_rgb_messages() {
        let variant = WireVariant::Rgb;
        assert_eq!(
            variant.encode_led(pos(0, 0), 0xFF8040),
            vec![240, 0, 32, 41, 2, 24, 0x0B, 11, 0x0F, 0x20, 0x40, 247]
        );
        assert_eq!(
            variant.encode_led_off(pos(7, 7)),
            vec![240, 0, 32, 41, 2, 24, 0x0A, 88, 0, 247]
        );
        assert_eq!(
            variant.encode_page_indicator(1, PaletteColor::LIGHT_YELLOW),
            vec![240, 0, 32, 41, 2, 24, 0x0A, 29, 12, 247]
        );
        assert_eq!(
            variant.all_off(),
            vec![vec![240, 0, 32, 41, 2, 24, 0x0E, 0, 247]]
        );
    }

    #[test]
    fn test_palette_color_is_sent_unchanged() {
        let variant = WireVariant::Palette;
        for color in [1, 9, 100, 127] {
            assert_eq!(variant.encode_led(pos(3, 3), color)[2], color as u8);
        }
    }

    #[test]
    #[should_panic]
    fn test_palette_rejects_rgb_color() {
        WireVariant::Palette.encode_led(pos(0, 0), 0x3F3F00);
    }

    #[test]
    fn test_color_ranges() {
        assert!(WireVariant::Palette.is_valid_color(127));
        assert!(!WireVariant::Palette.is_valid_color(128));
        assert!(!WireVariant::Palette.is_valid_color(0x221100));
        assert!(WireVariant::Rgb.is_valid_color(0xFFFFFF));
        assert!(!WireVariant::Rgb.is_valid_color(0x1000000));

        for variant in [WireVariant::Palette, WireVariant::Rgb] {
            let default = variant.default_color();
            assert!(variant.is_valid_color(default));
            assert_ne!(
                variant.encode_led(pos(0, 0), default),
                variant.encode_led_off(pos(0, 0))
            );
        }
    }

    #[test]
    fn test_palette_color_conversion() {
        assert_eq!(PaletteColor::try_from(49), Ok(PaletteColor::PURPLE));
        assert_eq!(PaletteColor::try_from(127).map(|c| c.id()), Ok(127));
        assert_eq!(PaletteColor::try_from(128), Err(128));
    }

    #[test]
    fn test_rgb_precision() {
        assert_eq!(rgb_components(0x3F3F00), (0x03, 0x0F, 0x00));
        assert_eq!(rgb_components(0xFFFFFF), (0x0F, 0x3F, 0x7F));
        // Low bits of red and green are dropped
        assert_eq!(rgb_components(0x0F0300), (0, 0, 0));
    }

    #[test]
    fn test_control_messages() {
        for variant in [WireVariant::Palette, WireVariant::Rgb] {
            assert_eq!(variant.encode_reset(), vec![0xB0, 0x00, 0x00]);
            assert_eq!(
                variant.encode_mode_indicator(DeviceMode::User2, PaletteColor::LIGHT_YELLOW),
                vec![0xB0, 110, 12]
            );
        }
    }

    #[test]
    fn test_buffers_are_fresh() {
        let variant = WireVariant::Rgb;
        let mut first = variant.encode_led(pos(0, 0), 0x112233);
        first.clear();
        assert_eq!(variant.encode_led(pos(0, 0), 0x112233).len(), 12);
    }
}
