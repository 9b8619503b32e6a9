use crate::canvas::Presenter;
use crate::keycap::KeycapCompositor;
use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use keycast_core::keyboard_hook::CaptureHandle;
use keycast_core::{Engine, KeyEvent, Settings};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId, WindowLevel};

/// Overlay window driving the keystroke pipeline at a fixed frame rate.
pub struct App {
    settings: Settings,
    engine: Engine<KeycapCompositor>,
    events: Receiver<KeyEvent>,
    capture: Option<CaptureHandle>,
    window: Option<Rc<Window>>,
    presenter: Option<Presenter>,
    next_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        settings: Settings,
        compositor: KeycapCompositor,
        events: Receiver<KeyEvent>,
        capture: CaptureHandle,
    ) -> Self {
        let engine = Engine::new(&settings, compositor);
        Self {
            settings,
            engine,
            events,
            capture: Some(capture),
            window: None,
            presenter: None,
            next_frame: Instant::now(),
            error: None,
        }
    }

    /// Stops capture if the loop did not already, and reports a window
    /// setup failure.
    pub fn finish(mut self) -> Result<()> {
        self.stop_capture();
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn stop_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attributes = Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ))
            .with_resizable(false);
        if self.settings.always_on_top {
            attributes = attributes.with_window_level(WindowLevel::AlwaysOnTop);
        }

        let window = Rc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create overlay window")?,
        );
        let presenter = Presenter::new(window.clone(), self.settings.background_color)?;

        let size = window.inner_size();
        self.engine.set_surface_height(size.height as i32);
        info!("Overlay window {}x{}", size.width, size.height);

        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            error!("{:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed, shutting down.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Resized to {}x{}", size.width, size.height);
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(size.width, size.height);
                }
                self.engine.set_surface_height(size.height as i32);
            }
            WindowEvent::RedrawRequested => {
                if let Some(presenter) = self.presenter.as_mut() {
                    self.engine.frame(&self.events, Instant::now(), presenter);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Redraws may stop while the window is hidden; input must not back up.
        self.engine.drain_events(&self.events);

        let now = Instant::now();
        if now >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame = now + self.settings.frame_interval();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop_capture();
        self.presenter = None;
        self.window = None;
    }
}
