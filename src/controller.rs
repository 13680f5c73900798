//! The receive loop: decodes device input, runs button actions and keeps the LEDs in sync.
//!
//! Actions run synchronously on the loop thread. A slow or hanging action therefore stalls
//! all input processing until it returns.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::button::{Injector, Pacing};
use crate::launchpad_mk2::{DeviceEvent, DeviceMode, GridPosition, PaletteColor, WireVariant};
use crate::midi_io::{InputTransport, OutputTransport};
use crate::page::{PageSet, MAX_PAGES};

/// Lifecycle of a [`Controller`]. There is no way back from `Stopped`.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum State {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Per-device LED choices
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Settings {
    pub variant: WireVariant,
    /// Shown on a cell while it's held down
    pub highlight: PaletteColor,
    /// Page button of the active page, and the active mode button
    pub indicator: PaletteColor,
    pub pacing: Pacing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: WireVariant::default(),
            highlight: PaletteColor::PURPLE,
            indicator: PaletteColor::LIGHT_YELLOW,
            pacing: Pacing::default(),
        }
    }
}

struct Shared {
    terminated: AtomicBool,
    page: AtomicUsize,
    mode: AtomicU8,
}

/// Thread-safe view of a running [`Controller`]. Cheap to clone.
#[derive(Clone)]
pub struct ControllerHandle {
    shared: Arc<Shared>,
}

impl ControllerHandle {
    /// Ask the receive loop to stop. It notices at its next poll.
    pub fn terminate(&self) {
        self.shared.terminated.store(true, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::SeqCst)
    }

    /// The page last selected on the device
    pub fn current_page(&self) -> usize {
        self.shared.page.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> DeviceMode {
        DeviceMode::from_index(self.shared.mode.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("terminated", &self.is_terminated())
            .field("page", &self.current_page())
            .field("mode", &self.mode())
            .finish()
    }
}

pub struct Controller<I, O, A> {
    input: I,
    output: O,
    injector: A,
    pages: PageSet,
    mode: DeviceMode,
    settings: Settings,
    state: State,
    shared: Arc<Shared>,
}

impl<I, O, A> Controller<I, O, A>
where
    I: InputTransport,
    O: OutputTransport,
    A: Injector,
{
    /// The transports come in already opened (or not: a closed output is fine, the
    /// controller then runs without LED feedback).
    pub fn new(input: I, output: O, injector: A, pages: PageSet, settings: Settings) -> Self {
        let shared = Arc::new(Shared {
            terminated: AtomicBool::new(false),
            page: AtomicUsize::new(pages.current_page()),
            mode: AtomicU8::new(DeviceMode::default() as u8),
        });

        Self {
            input,
            output,
            injector,
            pages,
            mode: DeviceMode::default(),
            settings,
            state: State::Idle,
            shared,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pages(&self) -> &PageSet {
        &self.pages
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn injector(&self) -> &A {
        &self.injector
    }

    /// Idle -> Running. Paints the current page.
    pub fn start(&mut self) {
        if self.state != State::Idle {
            log::warn!("Controller can't start from {:?}", self.state);
            return;
        }

        log::info!(
            "Starting controller ({:?} variant, page {})",
            self.settings.variant,
            self.pages.current_page()
        );
        if !self.output.is_open() {
            log::warn!("No output port open, LEDs won't be updated");
        }

        self.state = State::Running;
        self.full_refresh();
    }

    /// Starts if necessary, then processes messages until [terminated](ControllerHandle::terminate)
    /// or the input is lost. Cleans up the device before returning.
    pub fn run(&mut self) {
        if self.state == State::Idle {
            self.start();
        }
        if self.state != State::Running {
            log::warn!("Controller can't run from {:?}", self.state);
            return;
        }

        loop {
            if self.shared.terminated.load(Ordering::SeqCst) {
                log::debug!("Termination requested");
                break;
            }

            match self.input.recv() {
                Ok(Some(message)) => {
                    self.handle_message(&message);
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("Stopping receive loop: {}", e);
                    break;
                }
            }
        }

        self.shutdown();
    }

    /// Dispatches a single raw message. Returns what it was decoded to.
    pub fn handle_message(&mut self, message: &[u8]) -> DeviceEvent {
        log::trace!("Received {:02X?}", message);

        if self.state != State::Running {
            log::debug!("Dropping {:02X?}, controller is {:?}", message, self.state);
            return DeviceEvent::Ignored;
        }

        let event = self.settings.variant.decode(message);
        self.dispatch(event);
        event
    }

    fn dispatch(&mut self, event: DeviceEvent) {
        let variant = self.settings.variant;

        match event {
            DeviceEvent::GridPressed(pos) => {
                self.send(variant.encode_led_palette(pos, self.settings.highlight));
            }
            DeviceEvent::GridReleased(pos) => {
                let color = match self.pages.current_button(pos) {
                    Some(button) => {
                        log::debug!("Executing {}", button.describe());
                        button.execute(&mut self.injector, &self.settings.pacing);
                        Some(button.color())
                    }
                    None => None,
                };

                let message = match color {
                    Some(color) => self.encode_button_led(pos, color),
                    None => variant.encode_led_off(pos),
                };
                self.send(message);
            }
            DeviceEvent::PageSelectPressed(page) => {
                log::info!("Switching to page {}", page);
                self.set_current_page(page as usize);
                self.full_refresh();
            }
            DeviceEvent::SecondaryPressed(_) => {
                if let Some(mode) = event.mode_switch() {
                    self.set_mode(mode);
                }
            }
            DeviceEvent::SecondaryReleased(_) => {}
            DeviceEvent::Ignored => log::trace!("Ignoring message"),
        }
    }

    /// Only changes the bookkeeping, follow up with [`Self::full_refresh`].
    pub fn set_current_page(&mut self, page: usize) {
        self.pages.set_current_page(page);
        self.shared.page.store(page, Ordering::SeqCst);
    }

    /// Switches the mode and moves the mode indicator.
    pub fn set_mode(&mut self, mode: DeviceMode) {
        if mode == self.mode {
            return;
        }

        log::info!("Switching to {:?} mode", mode);
        let variant = self.settings.variant;
        self.send(variant.encode_mode_indicator(self.mode, PaletteColor::BLACK));
        self.mode = mode;
        self.shared.mode.store(mode as u8, Ordering::SeqCst);
        self.send(variant.encode_mode_indicator(mode, self.settings.indicator));
    }

    /// Repaints everything: reset, page indicator, mode indicator, then every one of the 64
    /// cells. Only meant for startup and page changes.
    pub fn full_refresh(&mut self) {
        if !self.output.is_open() {
            return;
        }

        let variant = self.settings.variant;
        let current = self.pages.current_page();

        self.send(variant.encode_reset());
        if current < MAX_PAGES {
            self.send(variant.encode_page_indicator(current as u8, self.settings.indicator));
        }
        self.send(variant.encode_mode_indicator(self.mode, self.settings.indicator));

        let messages: Vec<Vec<u8>> = GridPosition::all()
            .map(|pos| match self.pages.button_at(current, pos) {
                Some(button) => self.encode_button_led(pos, button.color()),
                None => variant.encode_led_off(pos),
            })
            .collect();
        for message in messages {
            self.send(message);
        }
    }

    /// A bound cell always lights up. Colors the wire variant can't express fall back to its
    /// default color.
    fn encode_button_led(&self, pos: GridPosition, color: u32) -> Vec<u8> {
        let variant = self.settings.variant;
        if variant.is_valid_color(color) {
            variant.encode_led(pos, color)
        } else {
            log::warn!(
                "Color {:#x} at {:?} doesn't fit the {:?} variant, using the default",
                color,
                pos,
                variant
            );
            variant.encode_led(pos, variant.default_color())
        }
    }

    /// Stopping -> Stopped: best-effort device reset, then the ports are released
    fn shutdown(&mut self) {
        self.state = State::Stopping;
        log::info!("Shutting down controller");

        let variant = self.settings.variant;
        self.send(variant.encode_reset());
        for message in variant.all_off() {
            self.send(message);
        }

        self.output.close();
        self.input.close();
        self.state = State::Stopped;
    }

    fn send(&mut self, message: Vec<u8>) {
        if !self.output.is_open() {
            return;
        }
        if let Err(e) = self.output.send(&message) {
            log::warn!("Failed to send {:02X?}: {}", message, e);
        }
    }
}
