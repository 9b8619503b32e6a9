//! Logs every chord typed anywhere on the system. Ctrl+C in the terminal exits.
use keycast_core::chord_assembler::ChordAssembler;
use keycast_core::events::{event_channel, KeyEdge};
use keycast_core::keyboard_hook;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let (sink, rx) = event_channel(256);
    let _capture = keyboard_hook::start_capture(sink)?;
    println!("Capturing keys, press Ctrl+C to quit.");

    let mut asm = ChordAssembler::new();
    for event in rx.iter() {
        match event.edge {
            KeyEdge::Down => {
                if let Some(chord) = asm.on_press(event.key) {
                    println!("{chord}");
                }
            }
            KeyEdge::Up => asm.on_release(event.key),
        }
    }
    Ok(())
}
