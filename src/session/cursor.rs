use super::actions::{Action, ActionSequence};
use tracing::debug;

/// Position inside an [`ActionSequence`].
///
/// The cursor is either unset (empty sequence) or points at a valid action.
/// Moves past either end and jumps to unknown targets leave it untouched.
#[derive(Debug, Clone, Default)]
pub struct ActionCursor {
    sequence: ActionSequence,
    position: Option<usize>,
}

impl ActionCursor {
    pub fn new(sequence: ActionSequence) -> Self {
        let position = if sequence.is_empty() { None } else { Some(0) };
        ActionCursor { sequence, position }
    }

    pub fn sequence(&self) -> &ActionSequence {
        &self.sequence
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_unset(&self) -> bool {
        self.position.is_none()
    }

    fn coordinates(&self) -> Option<(usize, usize)> {
        let index = self.position?;
        let coords = self.sequence.position(index);
        debug_assert!(
            coords.is_some(),
            "cursor {} outside sequence of {}",
            index,
            self.sequence.len()
        );
        coords
    }

    /// Index of the active action group.
    pub fn unit_index(&self) -> Option<usize> {
        self.coordinates().map(|(g, _)| g)
    }

    /// Index of the active action within its group.
    pub fn phrase_index(&self) -> Option<usize> {
        self.coordinates().map(|(_, w)| w)
    }

    /// Both coordinates, `(-1, -1)` when unset.
    pub fn indices_or_unset(&self) -> (i64, i64) {
        match self.coordinates() {
            Some((g, w)) => (g as i64, w as i64),
            None => (-1, -1),
        }
    }

    pub fn active_action(&self) -> Option<&Action> {
        self.sequence.get(self.position?)
    }

    fn move_to(&mut self, index: usize) -> bool {
        if self.position == Some(index) {
            return false;
        }
        self.position = Some(index);
        debug!(index, coords = ?self.coordinates(), "cursor moved");
        true
    }

    /// Jumps to the first trainable phrase of `unit_id`. Returns whether the cursor moved.
    pub fn set_unit(&mut self, unit_id: &str) -> bool {
        match self.sequence.first_of_unit(unit_id) {
            Some(index) => self.move_to(index),
            None => {
                debug!(unit = %unit_id, "unit not in action sequence, cursor unchanged");
                false
            }
        }
    }

    pub fn set_phrase(&mut self, phrase_id: &str) -> bool {
        match self.sequence.index_of_phrase(phrase_id) {
            Some(index) => self.move_to(index),
            None => {
                debug!(phrase = %phrase_id, "phrase not in action sequence, cursor unchanged");
                false
            }
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self.position, Some(index) if index + 1 < self.sequence.len())
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.position, Some(index) if index > 0)
    }

    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        let next = self.position.map_or(0, |index| index + 1);
        self.move_to(next)
    }

    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        let previous = self.position.map_or(0, |index| index - 1);
        self.move_to(previous)
    }

    /// Back to the first action.
    pub fn reset(&mut self) {
        self.position = if self.sequence.is_empty() { None } else { Some(0) };
    }
}
