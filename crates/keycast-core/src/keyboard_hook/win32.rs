use crate::error::CaptureError;
use crate::events::EventSink;
use crate::types::RawKey;
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, KBDLLHOOKSTRUCT, MSG,
    PEEK_MESSAGE_REMOVE_TYPE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

/// Where the hook procedure forwards edges. The hook callback has no user
/// data pointer, so this is the one process-wide slot.
static SINK: Mutex<Option<EventSink>> = parking_lot::const_mutex(None);

/// Running hook thread. Dropping it stops capture as well.
pub struct CaptureHandle {
    thread_id: u32,
    join: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Detaches the sink, ends the message loop and waits for the unhook.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        SINK.lock().take();
        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                warn!("Failed to signal hook thread: {}", e);
            }
        }
        if join.join().is_err() {
            warn!("Hook thread panicked");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Installs the low-level keyboard hook on a dedicated thread and returns once
/// it is live, or with the install error.
pub fn start_capture(sink: EventSink) -> Result<CaptureHandle, CaptureError> {
    {
        let mut slot = SINK.lock();
        if slot.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        *slot = Some(sink);
    }

    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<u32, CaptureError>>(1);
    let spawned = thread::Builder::new()
        .name("keycast-hook".to_string())
        .spawn(move || {
            let mut msg = MSG::default();
            // Create the thread's message queue before anyone posts WM_QUIT to it.
            unsafe {
                let _ = PeekMessageW(&mut msg, None, 0, 0, PEEK_MESSAGE_REMOVE_TYPE(0));
            }

            let hook = match unsafe {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0)
            } {
                Ok(hook) if !hook.is_invalid() => hook,
                Ok(_) => {
                    let _ = ready_tx.send(Err(CaptureError::Install(
                        "SetWindowsHookExW returned a null handle".to_string(),
                    )));
                    return;
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(CaptureError::Install(e.to_string())));
                    return;
                }
            };
            info!("Keyboard hook installed. Handle: {:?}", hook);
            let _ = ready_tx.send(Ok(unsafe { GetCurrentThreadId() }));

            run_event_loop();

            unsafe {
                let _ = UnhookWindowsHookEx(hook);
            }
            info!("Keyboard hook uninstalled.");
        });

    let join = match spawned {
        Ok(join) => join,
        Err(e) => {
            SINK.lock().take();
            return Err(CaptureError::Install(e.to_string()));
        }
    };

    match ready_rx.recv() {
        Ok(Ok(thread_id)) => Ok(CaptureHandle {
            thread_id,
            join: Some(join),
        }),
        Ok(Err(e)) => {
            SINK.lock().take();
            let _ = join.join();
            Err(e)
        }
        Err(_) => {
            SINK.lock().take();
            Err(CaptureError::ThreadExited)
        }
    }
}

fn run_event_loop() {
    info!("Starting message loop...");
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    info!("Message loop exited.");
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        let key = RawKey::VirtualKey(kbd.vkCode);

        if let Some(sink) = SINK.lock().as_ref() {
            match wparam.0 as u32 {
                WM_KEYDOWN | WM_SYSKEYDOWN => {
                    sink.press(key);
                }
                WM_KEYUP | WM_SYSKEYUP => {
                    sink.release(key);
                }
                _ => {}
            }
        }
    }

    // Observe only; every event continues to the focused application.
    CallNextHookEx(None, code, wparam, lparam)
}
