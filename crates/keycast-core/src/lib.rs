pub mod chord_assembler;
pub mod engine;
pub mod error;
pub mod events;
pub mod key_namer;
pub mod keyboard_hook;
pub mod settings;
pub mod stroke_queue;
pub mod stroke_renderer;
pub mod types;

pub use engine::{Engine, TileCompositor};
pub use error::{CaptureError, SettingsError};
pub use events::{event_channel, EventSink, KeyEdge, KeyEvent};
pub use settings::Settings;
pub use stroke_renderer::{FrameSurface, Tile};
pub use types::{Chord, NamedKey, RawKey, Role};
