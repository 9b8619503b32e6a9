use crate::error::CaptureError;
use crate::events::EventSink;
use crate::types::{NamedKey, RawKey};
use parking_lot::Mutex;
use rdev::{EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// `rdev::listen` fails fast (no display, no permission); past this it is
/// considered running.
const STARTUP_GRACE: Duration = Duration::from_millis(250);

static SINK: Mutex<Option<EventSink>> = parking_lot::const_mutex(None);
static LISTENER_STARTED: AtomicBool = AtomicBool::new(false);

/// Active capture. rdev cannot unregister its listener, so stopping detaches
/// the sink and the listener thread idles until process exit.
pub struct CaptureHandle {
    stopped: bool,
}

impl CaptureHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.stopped {
            self.stopped = true;
            SINK.lock().take();
            info!("Keyboard capture detached.");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn start_capture(sink: EventSink) -> Result<CaptureHandle, CaptureError> {
    {
        let mut slot = SINK.lock();
        if slot.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        *slot = Some(sink);
    }

    if LISTENER_STARTED.swap(true, Ordering::SeqCst) {
        info!("Keyboard capture re-attached.");
        return Ok(CaptureHandle { stopped: false });
    }

    let (fail_tx, fail_rx) = crossbeam_channel::bounded::<String>(1);
    let spawned = thread::Builder::new()
        .name("keycast-listen".to_string())
        .spawn(move || {
            info!("Starting rdev listener...");
            if let Err(e) = rdev::listen(forward) {
                error!("rdev listener stopped: {:?}", e);
                let _ = fail_tx.send(format!("{e:?}"));
            }
        });

    if let Err(e) = spawned {
        abort_start();
        return Err(CaptureError::Install(e.to_string()));
    }

    match fail_rx.recv_timeout(STARTUP_GRACE) {
        Ok(reason) => {
            abort_start();
            Err(CaptureError::Install(reason))
        }
        Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
            info!("Keyboard capture started.");
            Ok(CaptureHandle { stopped: false })
        }
        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
            abort_start();
            Err(CaptureError::ThreadExited)
        }
    }
}

fn abort_start() {
    SINK.lock().take();
    LISTENER_STARTED.store(false, Ordering::SeqCst);
}

fn forward(event: rdev::Event) {
    let (key, down) = match event.event_type {
        EventType::KeyPress(key) => (key, true),
        EventType::KeyRelease(key) => (key, false),
        _ => return,
    };

    let slot = SINK.lock();
    let Some(sink) = slot.as_ref() else {
        return;
    };
    let raw = to_raw_key(key);
    if down {
        sink.press(raw);
    } else {
        sink.release(raw);
    }
}

/// Stable identity per physical key: printable keys report their unshifted
/// character so press and release always agree.
pub(crate) fn to_raw_key(key: Key) -> RawKey {
    let c = |c: char| RawKey::from_char(c);
    let n = RawKey::Named;
    match key {
        Key::KeyA => c('a'),
        Key::KeyB => c('b'),
        Key::KeyC => c('c'),
        Key::KeyD => c('d'),
        Key::KeyE => c('e'),
        Key::KeyF => c('f'),
        Key::KeyG => c('g'),
        Key::KeyH => c('h'),
        Key::KeyI => c('i'),
        Key::KeyJ => c('j'),
        Key::KeyK => c('k'),
        Key::KeyL => c('l'),
        Key::KeyM => c('m'),
        Key::KeyN => c('n'),
        Key::KeyO => c('o'),
        Key::KeyP => c('p'),
        Key::KeyQ => c('q'),
        Key::KeyR => c('r'),
        Key::KeyS => c('s'),
        Key::KeyT => c('t'),
        Key::KeyU => c('u'),
        Key::KeyV => c('v'),
        Key::KeyW => c('w'),
        Key::KeyX => c('x'),
        Key::KeyY => c('y'),
        Key::KeyZ => c('z'),

        Key::Num0 => c('0'),
        Key::Num1 => c('1'),
        Key::Num2 => c('2'),
        Key::Num3 => c('3'),
        Key::Num4 => c('4'),
        Key::Num5 => c('5'),
        Key::Num6 => c('6'),
        Key::Num7 => c('7'),
        Key::Num8 => c('8'),
        Key::Num9 => c('9'),

        Key::Minus => c('-'),
        Key::Equal => c('='),
        Key::Comma => c(','),
        Key::Dot => c('.'),
        Key::Quote => c('\''),
        Key::BackQuote => c('`'),
        Key::Slash => c('/'),
        Key::LeftBracket => c('['),
        Key::RightBracket => c(']'),
        Key::BackSlash | Key::IntlBackslash => c('\\'),
        Key::SemiColon => c(';'),

        Key::ControlLeft => n(NamedKey::ControlLeft),
        Key::ControlRight => n(NamedKey::ControlRight),
        Key::ShiftLeft => n(NamedKey::ShiftLeft),
        Key::ShiftRight => n(NamedKey::ShiftRight),
        Key::Alt => n(NamedKey::AltLeft),
        Key::AltGr => n(NamedKey::AltRight),
        Key::MetaLeft => n(NamedKey::MetaLeft),
        Key::MetaRight => n(NamedKey::MetaRight),

        Key::Return => n(NamedKey::Enter),
        Key::Escape => n(NamedKey::Escape),
        Key::Backspace => n(NamedKey::Backspace),
        Key::Tab => n(NamedKey::Tab),
        Key::Space => n(NamedKey::Space),
        Key::CapsLock => n(NamedKey::CapsLock),
        Key::Delete => n(NamedKey::Delete),
        Key::Insert => n(NamedKey::Insert),
        Key::Home => n(NamedKey::Home),
        Key::End => n(NamedKey::End),
        Key::PageUp => n(NamedKey::PageUp),
        Key::PageDown => n(NamedKey::PageDown),
        Key::UpArrow => n(NamedKey::Up),
        Key::DownArrow => n(NamedKey::Down),
        Key::LeftArrow => n(NamedKey::Left),
        Key::RightArrow => n(NamedKey::Right),
        Key::PrintScreen => n(NamedKey::PrintScreen),
        Key::ScrollLock => n(NamedKey::ScrollLock),
        Key::Pause => n(NamedKey::Pause),
        Key::NumLock => n(NamedKey::NumLock),
        Key::Function => n(NamedKey::Function),

        Key::F1 => n(NamedKey::F(1)),
        Key::F2 => n(NamedKey::F(2)),
        Key::F3 => n(NamedKey::F(3)),
        Key::F4 => n(NamedKey::F(4)),
        Key::F5 => n(NamedKey::F(5)),
        Key::F6 => n(NamedKey::F(6)),
        Key::F7 => n(NamedKey::F(7)),
        Key::F8 => n(NamedKey::F(8)),
        Key::F9 => n(NamedKey::F(9)),
        Key::F10 => n(NamedKey::F(10)),
        Key::F11 => n(NamedKey::F(11)),
        Key::F12 => n(NamedKey::F(12)),

        Key::Kp0 => n(NamedKey::Numpad(0)),
        Key::Kp1 => n(NamedKey::Numpad(1)),
        Key::Kp2 => n(NamedKey::Numpad(2)),
        Key::Kp3 => n(NamedKey::Numpad(3)),
        Key::Kp4 => n(NamedKey::Numpad(4)),
        Key::Kp5 => n(NamedKey::Numpad(5)),
        Key::Kp6 => n(NamedKey::Numpad(6)),
        Key::Kp7 => n(NamedKey::Numpad(7)),
        Key::Kp8 => n(NamedKey::Numpad(8)),
        Key::Kp9 => n(NamedKey::Numpad(9)),
        Key::KpReturn => n(NamedKey::NumpadEnter),
        Key::KpPlus => n(NamedKey::NumpadAdd),
        Key::KpMinus => n(NamedKey::NumpadSubtract),
        Key::KpMultiply => n(NamedKey::NumpadMultiply),
        Key::KpDivide => n(NamedKey::NumpadDivide),
        Key::KpDelete => n(NamedKey::NumpadDecimal),

        Key::Unknown(code) => RawKey::VirtualKey(code),
    }
}
