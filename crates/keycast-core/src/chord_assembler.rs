use crate::key_namer;
use crate::types::{Chord, RawKey, Role};
use std::collections::HashSet;
use tracing::trace;

/// Turns press/release edges into chords.
///
/// Modifiers accumulate until a regular key is pressed; that press emits the
/// held modifiers (in press order) plus the key, and the modifiers are spent.
/// A modifier has to be released and pressed again to join another chord.
#[derive(Debug, Default)]
pub struct ChordAssembler {
    /// Held modifier labels in press order, no duplicates.
    held_modifiers: Vec<String>,
    /// Every key currently down, in identity form. Used to drop auto-repeat.
    held_keys: HashSet<RawKey>,
}

impl ChordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_press(&mut self, key: RawKey) -> Option<Chord> {
        if !self.held_keys.insert(key.identity()) {
            trace!("Repeat suppressed: {}", key);
            return None;
        }

        let (label, role) = key_namer::name(&key);
        match role {
            Role::Modifier => {
                if !self.held_modifiers.contains(&label) {
                    self.held_modifiers.push(label);
                }
                None
            }
            Role::Regular => {
                let mut labels = std::mem::take(&mut self.held_modifiers);
                labels.push(label);
                Some(Chord(labels))
            }
        }
    }

    pub fn on_release(&mut self, key: RawKey) {
        self.held_keys.remove(&key.identity());

        let (label, role) = key_namer::name(&key);
        if role == Role::Modifier {
            self.held_modifiers.retain(|held| *held != label);
        }
    }

    pub fn held_modifiers(&self) -> &[String] {
        &self.held_modifiers
    }

    pub fn is_held(&self, key: RawKey) -> bool {
        self.held_keys.contains(&key.identity())
    }

    pub fn held_key_count(&self) -> usize {
        self.held_keys.len()
    }
}
