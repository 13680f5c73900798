//! In-memory stand-ins for the MIDI transport and the action service. They record everything
//! so a controller can be driven and inspected without hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::button::{Injector, KeyInput};
use crate::midi_io::{InputTransport, OutputTransport};
use crate::{ActionError, MidiError};

/// Replays a fixed script of raw messages. `None` entries simulate a poll timeout; once the
/// script runs out, the input reports a disconnect, unless it was made [endless](Self::endless).
#[derive(Debug, Default)]
pub struct MockInput {
    script: VecDeque<Option<Vec<u8>>>,
    endless: bool,
    disconnected: bool,
    polls: Arc<AtomicUsize>,
}

impl MockInput {
    /// Idle time of an endless input between two empty polls
    const IDLE_POLL: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// An input that keeps timing out after its script, like a silent device. Only a
    /// termination request stops a controller reading from it.
    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, message: &[u8]) {
        self.script.push_back(Some(message.to_vec()));
    }

    pub fn push_timeout(&mut self) {
        self.script.push_back(None);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Counts calls to `recv`. Stays readable after the input moved to another thread.
    pub fn poll_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.polls)
    }

    /// Whether `recv` ever reported a disconnect
    pub fn disconnected(&self) -> bool {
        self.disconnected
    }
}

impl<M: AsRef<[u8]>> FromIterator<M> for MockInput {
    fn from_iter<T: IntoIterator<Item = M>>(iter: T) -> Self {
        let mut input = Self::new();
        for message in iter {
            input.push(message.as_ref());
        }
        input
    }
}

impl InputTransport for MockInput {
    fn recv(&mut self) -> Result<Option<Vec<u8>>, MidiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        match self.script.pop_front() {
            Some(entry) => Ok(entry),
            None if self.endless => {
                std::thread::sleep(Self::IDLE_POLL);
                Ok(None)
            }
            None => {
                self.disconnected = true;
                Err(MidiError::Disconnected)
            }
        }
    }
}

/// Collects every sent message
#[derive(Debug)]
pub struct MockOutput {
    sent: Vec<Vec<u8>>,
    open: bool,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            open: true,
        }
    }

    /// An output whose port never opened
    pub fn closed() -> Self {
        Self {
            sent: Vec::new(),
            open: false,
        }
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTransport for MockOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum InjectedKey {
    Down(KeyInput),
    Up(KeyInput),
}

/// Records injected key events instead of typing them
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Vec<InjectedKey>,
    attempts: usize,
    invocations: usize,
    fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[InjectedKey] {
        &self.events
    }

    /// Number of calls made, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Number of callback actions run
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// The keys of all complete down+up pairs, in order. Panics if the events don't form
    /// such pairs.
    pub fn pairs(&self) -> Vec<KeyInput> {
        self.events
            .chunks(2)
            .map(|pair| match *pair {
                [InjectedKey::Down(down), InjectedKey::Up(up)] if down == up => down,
                _ => panic!("Unpaired key events: {:?}", pair),
            })
            .collect()
    }

    fn record(&mut self, event: InjectedKey) -> Result<(), ActionError> {
        self.attempts += 1;
        if self.fail {
            return Err(ActionError::new("injection disabled"));
        }
        self.events.push(event);
        Ok(())
    }
}

impl Injector for RecordingInjector {
    fn key_down(&mut self, key: KeyInput) -> Result<(), ActionError> {
        self.record(InjectedKey::Down(key))
    }

    fn key_up(&mut self, key: KeyInput) -> Result<(), ActionError> {
        self.record(InjectedKey::Up(key))
    }

    fn invoke(&mut self, callback: &(dyn Fn() + Send + Sync)) -> Result<(), ActionError> {
        self.attempts += 1;
        if self.fail {
            return Err(ActionError::new("injection disabled"));
        }
        self.invocations += 1;
        callback();
        Ok(())
    }
}
