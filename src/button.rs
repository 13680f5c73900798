//! Actions bound to grid cells, and the service that carries them out.

use std::sync::Arc;
use std::time::Duration;

use crate::ActionError;

/// One key event for the operating system's input queue
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum KeyInput {
    /// A platform virtual key code
    Virtual(u16),
    /// A Unicode character, typed independent of the keyboard layout
    Unicode(char),
}

/// The input-injection service that buttons act through.
///
/// Implementations deliver a single key event per call. Key holds and pacing between
/// events are the caller's business.
pub trait Injector {
    fn key_down(&mut self, key: KeyInput) -> Result<(), ActionError>;
    fn key_up(&mut self, key: KeyInput) -> Result<(), ActionError>;

    /// Runs an opaque callback action
    fn invoke(&mut self, callback: &(dyn Fn() + Send + Sync)) -> Result<(), ActionError> {
        callback();
        Ok(())
    }
}

/// An injector that only logs what it would have typed. Handy for running the controller
/// without any OS integration.
#[derive(Debug, Default)]
pub struct LogInjector;

impl Injector for LogInjector {
    fn key_down(&mut self, key: KeyInput) -> Result<(), ActionError> {
        log::info!("key down {:?}", key);
        Ok(())
    }

    fn key_up(&mut self, key: KeyInput) -> Result<(), ActionError> {
        log::info!("key up {:?}", key);
        Ok(())
    }
}

/// Timing of injected key events
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pacing {
    /// How long a keystroke button holds its key down
    pub key_hold: Duration,
    /// Pause after every down and every up event of a string macro. The OS input queue
    /// drops or reorders characters when they arrive faster.
    pub macro_interval: Duration,
}

impl Pacing {
    /// No delays at all, for tests and simulations
    pub const IMMEDIATE: Pacing = Pacing {
        key_hold: Duration::ZERO,
        macro_interval: Duration::ZERO,
    };
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            key_hold: Duration::from_millis(100),
            macro_interval: Duration::from_millis(1),
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// What a button does when released
#[derive(Clone)]
pub enum Action {
    /// Press and release a single virtual key
    Keystroke(u16),
    /// Type a sequence of characters
    StringMacro(Vec<char>),
    /// Call a closure, mostly for diagnostics and tests
    Callback(Callback),
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keystroke(code) => f.debug_tuple("Keystroke").field(code).finish(),
            Self::StringMacro(chars) => f
                .debug_tuple("StringMacro")
                .field(&chars.iter().collect::<String>())
                .finish(),
            Self::Callback(callback) => write!(f, "Callback({:p})", Arc::as_ptr(callback)),
        }
    }
}

/// A grid cell binding: an action plus the color its LED shows. Immutable once built.
///
/// The color is a palette index or a `0xRRGGBB` value, depending on the
/// [wire variant](crate::launchpad_mk2::WireVariant) in use.
#[derive(Debug, Clone)]
pub struct Button {
    action: Action,
    color: u32,
}

impl Button {
    pub fn new(action: Action, color: u32) -> Self {
        Self { action, color }
    }

    pub fn keystroke(code: u16, color: u32) -> Self {
        Self::new(Action::Keystroke(code), color)
    }

    pub fn string_macro(text: &str, color: u32) -> Self {
        Self::new(Action::StringMacro(text.chars().collect()), color)
    }

    pub fn callback<F>(callback: F, color: u32) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(Action::Callback(Arc::new(callback)), color)
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    /// Carry out the bound action. Blocks for as long as the injection takes; failures are
    /// logged, never propagated.
    pub fn execute<I: Injector + ?Sized>(&self, injector: &mut I, pacing: &Pacing) {
        if let Err(e) = self.try_execute(injector, pacing) {
            log::warn!("{} ({})", e, self.describe());
        }
    }

    fn try_execute<I: Injector + ?Sized>(
        &self,
        injector: &mut I,
        pacing: &Pacing,
    ) -> Result<(), ActionError> {
        match &self.action {
            Action::Keystroke(code) => {
                let key = KeyInput::Virtual(*code);
                injector.key_down(key)?;
                pause(pacing.key_hold);
                injector.key_up(key)?;
            }
            Action::StringMacro(chars) => {
                for &c in chars {
                    let key = KeyInput::Unicode(c);
                    injector.key_down(key)?;
                    pause(pacing.macro_interval);
                    injector.key_up(key)?;
                    pause(pacing.macro_interval);
                }
            }
            Action::Callback(callback) => injector.invoke(callback.as_ref())?,
        }
        Ok(())
    }

    /// Human readable summary for diagnostics
    pub fn describe(&self) -> String {
        match &self.action {
            Action::Keystroke(code) => {
                format!("keystroke button: color={:#08x} keycode={}", self.color, code)
            }
            Action::StringMacro(chars) => format!(
                "string macro button: color={:#08x} text={:?}",
                self.color,
                chars.iter().collect::<String>()
            ),
            Action::Callback(_) => format!("callback button: color={:#08x}", self.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InjectedKey, RecordingInjector};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_keystroke() {
        let mut injector = RecordingInjector::new();
        Button::keystroke(0x41, 0x3F3F00).execute(&mut injector, &Pacing::IMMEDIATE);

        assert_eq!(
            injector.events(),
            &[
                InjectedKey::Down(KeyInput::Virtual(0x41)),
                InjectedKey::Up(KeyInput::Virtual(0x41)),
            ]
        );
    }

    #[test]
    fn test_string_macro_order() {
        let mut injector = RecordingInjector::new();
        Button::string_macro("Hi!", 0).execute(&mut injector, &Pacing::IMMEDIATE);

        let expected: Vec<InjectedKey> = ['H', 'i', '!']
            .iter()
            .flat_map(|&c| {
                vec![
                    InjectedKey::Down(KeyInput::Unicode(c)),
                    InjectedKey::Up(KeyInput::Unicode(c)),
                ]
            })
            .collect();
        assert_eq!(injector.events(), expected.as_slice());

        let codepoints: Vec<u32> = injector
            .pairs()
            .into_iter()
            .filter_map(|key| match key {
                KeyInput::Unicode(c) => Some(u32::from(c)),
                KeyInput::Virtual(_) => None,
            })
            .collect();
        assert_eq!(codepoints, vec![0x48, 0x69, 0x21]);
    }

    #[test]
    fn test_string_macro_non_ascii() {
        let mut injector = RecordingInjector::new();
        Button::string_macro("테스트", 0).execute(&mut injector, &Pacing::IMMEDIATE);

        let expected: Vec<KeyInput> = "테스트".chars().map(KeyInput::Unicode).collect();
        assert_eq!(injector.pairs(), expected);
    }

    #[test]
    fn test_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let button = Button::callback(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            0x3F3A00,
        );

        let mut injector = RecordingInjector::new();
        button.execute(&mut injector, &Pacing::IMMEDIATE);
        button.execute(&mut injector, &Pacing::IMMEDIATE);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(injector.events().is_empty());
        assert_eq!(button.color(), 0x3F3A00);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut injector = RecordingInjector::failing();
        // Must not panic
        Button::string_macro("abc", 0).execute(&mut injector, &Pacing::IMMEDIATE);
        // The macro stops at the first failure
        assert_eq!(injector.attempts(), 1);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Button::keystroke(65, 0x221100).describe(),
            "keystroke button: color=0x221100 keycode=65"
        );
        assert!(Button::string_macro("hey", 0).describe().contains("\"hey\""));
    }
}
