use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::{ok_or_continue, MidiError};

/// How long [`DeviceInput::recv`] waits before handing control back to the receive loop, so
/// that a pending termination request gets noticed even when the device is silent.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn guess_port<T: midir::MidiIO>(midi_io: &T, keyword: &str) -> Option<T::Port> {
    for port in midi_io.ports() {
        let name = ok_or_continue!(midi_io.port_name(&port));

        if name.contains(keyword) {
            log::info!("Using MIDI port {:?}", name);
            return Some(port);
        }
        log::debug!("Skipping MIDI port {:?}", name);
    }

    None
}

/// Where device-bound messages go.
pub trait OutputTransport {
    /// Sends one complete MIDI message.
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError>;

    /// Whether a device is actually attached. A closed output swallows everything the
    /// controller would send.
    fn is_open(&self) -> bool;

    /// Releases the underlying port. Afterwards, `is_open()` returns false.
    fn close(&mut self) {}
}

/// Where device messages come from.
pub trait InputTransport {
    /// Wait for the next raw message.
    ///
    /// `Ok(None)` means nothing arrived in time and the caller should simply poll again.
    /// `Err(MidiError::Disconnected)` means nothing will ever arrive again.
    fn recv(&mut self) -> Result<Option<Vec<u8>>, MidiError>;

    fn close(&mut self) {}
}

/// The midir-backed output port of a Launchpad.
pub struct DeviceOutput {
    connection: Option<MidiOutputConnection>,
}

impl DeviceOutput {
    const MIDI_CONNECTION_NAME: &'static str = "Macropad output";

    /// Initiate from an existing midir connection.
    pub fn from_connection(connection: MidiOutputConnection) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    /// An output with no device behind it. Every send is dropped.
    pub fn disconnected() -> Self {
        Self { connection: None }
    }

    /// Search the midi devices and connect to the first output port whose name contains
    /// `keyword`.
    pub fn guess(keyword: &str) -> Result<Self, MidiError> {
        let midi_output = MidiOutput::new(crate::APPLICATION_NAME)?;

        let port = guess_port(&midi_output, keyword).ok_or_else(|| MidiError::NoPortFound {
            keyword: keyword.to_owned(),
        })?;

        let connection = midi_output.connect(&port, Self::MIDI_CONNECTION_NAME)?;
        Ok(Self::from_connection(connection))
    }

    /// Like [`Self::guess`], but falls back to a [disconnected](Self::disconnected) output,
    /// so the controller still runs for diagnostics without LED feedback.
    pub fn guess_or_disconnected(keyword: &str) -> Self {
        match Self::guess(keyword) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("No LED output available ({}), continuing without", e);
                Self::disconnected()
            }
        }
    }
}

impl OutputTransport for DeviceOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        if let Some(connection) = &mut self.connection {
            connection.send(bytes)?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

/// The midir-backed input port of a Launchpad. midir delivers messages on its own thread;
/// they are queued here until the receive loop asks for them.
pub struct DeviceInput {
    connection: Option<MidiInputConnection<()>>,
    receiver: Receiver<Vec<u8>>,
}

impl DeviceInput {
    const MIDI_CONNECTION_NAME: &'static str = "Macropad input";

    /// Search the midi devices and connect to the first input port whose name contains
    /// `keyword`.
    pub fn guess(keyword: &str) -> Result<Self, MidiError> {
        let mut midi_input = MidiInput::new(crate::APPLICATION_NAME)?;
        // SysEx replies must come through too
        midi_input.ignore(Ignore::None);

        let port = guess_port(&midi_input, keyword).ok_or_else(|| MidiError::NoPortFound {
            keyword: keyword.to_owned(),
        })?;

        let (sender, receiver) = std::sync::mpsc::channel();
        let midir_callback = move |timestamp: u64, data: &[u8], _: &mut ()| {
            log::trace!("MIDI in @{}: {:02X?}", timestamp, data);
            // Only fails once the receiving side is gone, at which point nobody cares
            let _ = sender.send(data.to_vec());
        };

        let connection = midi_input.connect(&port, Self::MIDI_CONNECTION_NAME, midir_callback, ())?;

        Ok(Self {
            connection: Some(connection),
            receiver,
        })
    }

    /// Drain of any pending messages. The Launchpad queues up button inputs while nobody is
    /// connected and delivers them all at once as soon as someone connects.
    ///
    /// This function returns the number of messages that were discarded.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

impl InputTransport for DeviceInput {
    fn recv(&mut self) -> Result<Option<Vec<u8>>, MidiError> {
        match self.receiver.recv_timeout(POLL_INTERVAL) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(MidiError::Disconnected),
        }
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}
