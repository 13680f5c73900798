/*!
Turns a Novation Launchpad MK2 into a macro pad.

Each of the 64 grid cells can be bound to an action: a keystroke, a typed-out string, or an
arbitrary callback. Bindings are organized into up to eight pages, which are switched with the
round buttons on the right side of the device. The LEDs always show the active page: bound
cells light up in their button's color, unbound cells stay dark.

# Running a layout

```no_run
use launchpad_macropad::{Config, Controller, DeviceInput, DeviceOutput, LogInjector};

let config = Config::from_file("layout.json")?;
let input = DeviceInput::guess(&config.device.keyword)?;
let output = DeviceOutput::guess_or_disconnected(&config.device.keyword);

let mut controller = Controller::new(
    input,
    output,
    LogInjector,
    config.build_pages(),
    config.device.settings(),
);

// Call `terminate()` on this from anywhere to stop the loop
let handle = controller.handle();
controller.run();
# drop(handle);
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Protocol

The [`launchpad_mk2`] module decodes raw device messages into [`DeviceEvent`]s and encodes
LED updates. Two encodings are supported, see [`WireVariant`]: plain 3-byte palette messages
and SysEx-wrapped RGB messages. Every encode call returns its own freshly allocated buffer.

# Testing without hardware

The [`mock`] module has in-memory transports and an injector that records what it would
have typed.
*/

pub mod util;

mod errors;
pub use errors::*;

mod midi_io;
pub use midi_io::*;

pub mod launchpad_mk2;
pub use launchpad_mk2 as mk2;
pub use launchpad_mk2::{DeviceEvent, DeviceMode, GridPosition, PaletteColor, WireVariant};

pub mod button;
pub use button::{Action, Button, Injector, KeyInput, LogInjector, Pacing};

pub mod page;
pub use page::{Page, PageSet, MAX_PAGES};

pub mod controller;
pub use controller::{Controller, ControllerHandle, Settings, State};

pub mod config;
pub use config::Config;

pub mod mock;

/// Identifier used for e.g. the midi port names etc.
const APPLICATION_NAME: &str = "Launchpad Macropad";
