//! Runs a layout file on the first connected Launchpad MK2. Typed keys are only logged.
//!
//! Usage: `cargo run --example macropad -- layout.json`, then press enter to quit.

use launchpad_macropad::{Config, Controller, DeviceInput, DeviceOutput, LogInjector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => {
            log::warn!("No layout file given, starting with an empty layout");
            Config::default()
        }
    };

    let keyword = config.device.keyword.clone();
    let input = DeviceInput::guess(&keyword)?;
    let discarded = input.drain();
    if discarded > 0 {
        log::info!("Discarded {} stale messages", discarded);
    }
    let output = DeviceOutput::guess_or_disconnected(&keyword);

    let mut controller = Controller::new(
        input,
        output,
        LogInjector,
        config.build_pages(),
        config.device.settings(),
    );

    let handle = controller.handle();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        handle.terminate();
    });

    controller.run();
    Ok(())
}
