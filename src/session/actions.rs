//! Flattening a course into the ordered list of trainable actions.
//!
//! Actions live in one flat arena; groups are ranges of that arena described
//! by an offset table, so a position is a single index and its
//! (group, phrase-within-group) pair is always derived, never stored.

use crate::course::model::{Course, Phrase};
use std::ops::Range;

/// One trainable phrase paired with the unit that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub unit_id: String,
    pub phrase_id: String,
    /// Positions inside the course the sequence was built from
    pub unit_index: usize,
    pub phrase_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub unit_id: String,
    pub title: String,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSequence {
    actions: Vec<Action>,
    groups: Vec<ActionGroup>,
    /// `offsets[g]` is the first flat index of group `g`; the last entry is `actions.len()`
    offsets: Vec<usize>,
}

impl Default for ActionSequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl ActionSequence {
    pub fn empty() -> Self {
        ActionSequence {
            actions: Vec::new(),
            groups: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Builds the sequence from every phrase accepted by `eligible`.
    /// Units without any eligible phrase produce no group.
    pub fn build<F>(course: &Course, eligible: F) -> Self
    where
        F: Fn(&Phrase) -> bool,
    {
        let mut sequence = Self::empty();
        for (unit_index, unit) in course.units.iter().enumerate() {
            let start = sequence.actions.len();
            for (phrase_index, phrase) in unit.phrases.iter().enumerate() {
                if !eligible(phrase) {
                    continue;
                }
                sequence.actions.push(Action {
                    unit_id: unit.id.clone(),
                    phrase_id: phrase.id.clone(),
                    unit_index,
                    phrase_index,
                });
            }
            let end = sequence.actions.len();
            if end > start {
                sequence.groups.push(ActionGroup {
                    unit_id: unit.id.clone(),
                    title: unit.title.clone(),
                    range: start..end,
                });
                sequence.offsets.push(end);
            }
        }
        sequence
    }

    /// Training view: only phrases with a recording.
    pub fn for_training(course: &Course) -> Self {
        Self::build(course, Phrase::has_sound)
    }

    /// Editor view: every phrase, recorded or not.
    pub fn for_editing(course: &Course) -> Self {
        Self::build(course, |_| true)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[ActionGroup] {
        &self.groups
    }

    pub fn group_actions(&self, group: usize) -> &[Action] {
        match self.groups.get(group) {
            Some(g) => &self.actions[g.range.clone()],
            None => &[],
        }
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    /// Splits a flat index into (group, index within group).
    pub fn position(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.actions.len() {
            return None;
        }
        // offsets is sorted and starts at 0, so this is always >= 1
        let group = self.offsets.partition_point(|&start| start <= index) - 1;
        Some((group, index - self.offsets[group]))
    }

    pub fn flat_index(&self, group: usize, within: usize) -> Option<usize> {
        let g = self.groups.get(group)?;
        let index = g.range.start + within;
        g.range.contains(&index).then_some(index)
    }

    /// Flat index of the first action belonging to `unit_id`.
    pub fn first_of_unit(&self, unit_id: &str) -> Option<usize> {
        self.groups
            .iter()
            .find(|g| g.unit_id == unit_id)
            .map(|g| g.range.start)
    }

    pub fn index_of_phrase(&self, phrase_id: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.phrase_id == phrase_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::{Language, Unit};

    fn course() -> Course {
        let mut course = Course::new("c", "Course", Language::new("fr", "Français"));
        course.units = vec![
            Unit::new("A", "Unit A")
                .with_phrase(Phrase::new("A1", "a1").with_sound("a1.ogg"))
                .with_phrase(Phrase::new("A2", "a2")),
            Unit::new("silent", "Silent").with_phrase(Phrase::new("S1", "s1").with_sound("")),
            Unit::new("B", "Unit B")
                .with_phrase(Phrase::new("B1", "b1").with_sound("b1.ogg"))
                .with_phrase(Phrase::new("B2", "b2").with_sound("b2.ogg")),
        ];
        course
    }

    #[test]
    fn skips_silent_phrases_and_units() {
        let seq = ActionSequence::for_training(&course());
        assert_eq!(seq.group_count(), 2);
        assert_eq!(seq.len(), 3);
        let ids: Vec<_> = seq.group_actions(0).iter().map(|a| a.phrase_id.as_str()).collect();
        assert_eq!(ids, ["A1"]);
        let ids: Vec<_> = seq.group_actions(1).iter().map(|a| a.phrase_id.as_str()).collect();
        assert_eq!(ids, ["B1", "B2"]);
        assert_eq!(seq.groups()[1].unit_id, "B");
        assert_eq!(seq.get(1).unwrap().unit_index, 2);
    }

    #[test]
    fn editing_view_keeps_everything() {
        let seq = ActionSequence::for_editing(&course());
        assert_eq!(seq.group_count(), 3);
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let course = course();
        assert_eq!(
            ActionSequence::for_training(&course),
            ActionSequence::for_training(&course)
        );
    }

    #[test]
    fn position_and_flat_index_agree() {
        let seq = ActionSequence::for_training(&course());
        for index in 0..seq.len() {
            let (g, w) = seq.position(index).unwrap();
            assert_eq!(seq.flat_index(g, w), Some(index));
        }
        assert_eq!(seq.position(2), Some((1, 1)));
        assert_eq!(seq.position(3), None);
        assert_eq!(seq.flat_index(0, 1), None);
        assert_eq!(seq.flat_index(5, 0), None);
    }

    #[test]
    fn lookups() {
        let seq = ActionSequence::for_training(&course());
        assert_eq!(seq.first_of_unit("B"), Some(1));
        assert_eq!(seq.first_of_unit("silent"), None);
        assert_eq!(seq.index_of_phrase("B2"), Some(2));
        assert_eq!(seq.index_of_phrase("A2"), None);
    }

    #[test]
    fn empty_course_gives_empty_sequence() {
        let course = Course::new("c", "Course", Language::new("fr", "Français"));
        let seq = ActionSequence::for_training(&course);
        assert!(seq.is_empty());
        assert_eq!(seq, ActionSequence::empty());
        assert_eq!(seq.position(0), None);
        assert!(seq.group_actions(0).is_empty());
    }
}
