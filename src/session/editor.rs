use super::actions::ActionSequence;
use super::cursor::ActionCursor;
use crate::course::library::CourseLibrary;
use crate::course::model::{Course, Language, Phrase, Unit};
use crate::error::{Error, Result};
use tracing::{debug, warn};

/// Phrase-by-phrase navigation over a course being edited.
///
/// Unlike a training session every phrase is visited, recorded or not.
/// Structural edits rebuild the action sequence and keep the cursor on the
/// phrase it pointed at.
#[derive(Debug, Default)]
pub struct EditorSession {
    course: Option<Course>,
    cursor: ActionCursor,
    modified: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_course(&mut self, course: Course) {
        if self.course.as_ref() == Some(&course) {
            return;
        }
        self.cursor = ActionCursor::new(ActionSequence::for_editing(&course));
        self.course = Some(course);
        self.modified = false;
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn language(&self) -> Option<&Language> {
        self.course.as_ref().map(|c| &c.language)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn active_unit(&self) -> Option<&Unit> {
        let action = self.cursor.active_action()?;
        self.course.as_ref()?.units.get(action.unit_index)
    }

    pub fn active_phrase(&self) -> Option<&Phrase> {
        let action = self.cursor.active_action()?;
        self.active_unit()?.phrases.get(action.phrase_index)
    }

    /// Selects the first phrase of `unit_id`.
    pub fn set_active_unit(&mut self, unit_id: &str) {
        self.cursor.set_unit(unit_id);
    }

    pub fn set_active_phrase(&mut self, phrase_id: &str) {
        self.cursor.set_phrase(phrase_id);
    }

    pub fn has_next_phrase(&self) -> bool {
        self.cursor.has_next()
    }

    pub fn has_previous_phrase(&self) -> bool {
        self.cursor.has_previous()
    }

    pub fn switch_to_next_phrase(&mut self) {
        if !self.cursor.advance() {
            warn!("there is no next phrase, aborting");
        }
    }

    pub fn switch_to_previous_phrase(&mut self) {
        if !self.cursor.retreat() {
            warn!("there is no previous phrase, aborting");
        }
    }

    /// Edits the active phrase in place. Returns false when nothing is selected.
    pub fn edit_active_phrase<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut Phrase),
    {
        let Some(phrase_id) = self.cursor.active_action().map(|a| a.phrase_id.clone()) else {
            return false;
        };
        let Some(phrase) = self.course.as_mut().and_then(|c| c.phrase_mut(&phrase_id)) else {
            return false;
        };
        edit(phrase);
        // an edit may not change the id the cursor relies on
        if phrase.id != phrase_id {
            warn!(phrase = %phrase_id, "phrase id edits are not allowed, restoring");
            phrase.id = phrase_id;
        }
        self.modified = true;
        true
    }

    /// Rebuilds after a structural change, keeping the cursor on `focus` if possible.
    fn rebuild(&mut self, focus: Option<String>) {
        let Some(course) = self.course.as_ref() else {
            return;
        };
        self.cursor = ActionCursor::new(ActionSequence::for_editing(course));
        if let Some(phrase_id) = focus {
            self.cursor.set_phrase(&phrase_id);
        }
        debug!(actions = self.cursor.sequence().len(), "editor actions rebuilt");
    }

    /// Appends a new unit. Empty units have no actions, so the cursor stays put.
    pub fn add_unit(&mut self) -> Option<String> {
        let course = self.course.as_mut()?;
        let unit_id = course.create_unit();
        let focus = self.cursor.active_action().map(|a| a.phrase_id.clone());
        self.modified = true;
        self.rebuild(focus);
        Some(unit_id)
    }

    /// Appends a new phrase to `unit_id` and selects it.
    pub fn add_phrase(&mut self, unit_id: &str) -> Result<Option<String>> {
        let Some(course) = self.course.as_mut() else {
            return Ok(None);
        };
        let phrase_id = course.create_phrase(unit_id)?;
        self.modified = true;
        self.rebuild(Some(phrase_id.clone()));
        Ok(Some(phrase_id))
    }

    /// True when the edited course is itself a skeleton known to `library`.
    pub fn skeleton_mode(&self, library: &CourseLibrary) -> bool {
        self.course
            .as_ref()
            .map_or(false, |c| library.skeleton(&c.id).is_some())
    }

    /// Imports what the linked skeleton has and the course lacks. Returns
    /// whether the course changed; the cursor stays on its phrase.
    pub fn update_course_from_skeleton(&mut self, library: &CourseLibrary) -> Result<bool> {
        let Some(course) = self.course.as_mut() else {
            warn!("not updating course from skeleton, no course set");
            return Ok(false);
        };
        let skeleton_id = course.foreign_id.clone().unwrap_or_default();
        let skeleton = library
            .skeleton(&skeleton_id)
            .ok_or(Error::UnknownSkeleton(skeleton_id))?;
        let changed = course.update_from_skeleton(skeleton)?;
        if changed {
            self.modified = true;
            let focus = self.cursor.active_action().map(|a| a.phrase_id.clone());
            self.rebuild(focus);
        }
        Ok(changed)
    }

    /// Hands the edited course to `library`, which notifies training sessions.
    pub fn publish(&mut self, library: &mut CourseLibrary) -> bool {
        let Some(course) = self.course.as_ref() else {
            return false;
        };
        library.replace(course.clone());
        self.modified = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::Skeleton;

    fn course() -> Course {
        let mut course = Course::new("c", "Course", Language::new("pt", "Português"));
        course.units = vec![
            Unit::new("A", "A")
                .with_phrase(Phrase::new("A1", "olá").with_sound("a1.ogg"))
                .with_phrase(Phrase::new("A2", "tchau")),
            Unit::new("empty", "Empty"),
            Unit::new("B", "B").with_phrase(Phrase::new("B1", "obrigado")),
        ];
        course
    }

    #[test]
    fn visits_phrases_without_sound() {
        let mut editor = EditorSession::new();
        editor.set_course(course());
        editor.switch_to_next_phrase();
        assert_eq!(editor.active_phrase().unwrap().id, "A2");
        editor.switch_to_next_phrase();
        assert_eq!(editor.active_unit().unwrap().id, "B");
        assert!(!editor.has_next_phrase());
        editor.switch_to_next_phrase();
        assert_eq!(editor.active_phrase().unwrap().id, "B1");
    }

    #[test]
    fn edits_mark_modified_and_keep_ids() {
        let mut editor = EditorSession::new();
        editor.set_course(course());
        editor.set_active_phrase("A2");
        assert!(editor.edit_active_phrase(|p| {
            p.text = "adeus".to_string();
            p.id = "hijack".to_string();
        }));
        assert!(editor.is_modified());
        let phrase = editor.active_phrase().unwrap();
        assert_eq!((phrase.id.as_str(), phrase.text.as_str()), ("A2", "adeus"));
    }

    #[test]
    fn new_phrase_becomes_active() {
        let mut editor = EditorSession::new();
        editor.set_course(course());
        let id = editor.add_phrase("empty").unwrap().unwrap();
        assert_eq!(editor.active_phrase().unwrap().id, id);
        assert_eq!(editor.active_unit().unwrap().id, "empty");
        assert!(editor.add_phrase("missing").is_err());

        editor.set_active_unit("A");
        editor.add_unit().unwrap();
        assert_eq!(editor.active_phrase().unwrap().id, "A1");
    }

    #[test]
    fn skeleton_update_adds_phrases_and_keeps_cursor() {
        let mut library = CourseLibrary::new();
        library.add_skeleton(Skeleton {
            id: "basics".to_string(),
            title: "Basics".to_string(),
            units: vec![Unit::new("s-u", "Greetings").with_phrase(Phrase::new("s-p", "hello"))],
            ..Default::default()
        });

        let mut editor = EditorSession::new();
        assert!(!editor.update_course_from_skeleton(&library).unwrap());
        let mut linked = course();
        linked.foreign_id = Some("basics".to_string());
        editor.set_course(linked);
        assert!(!editor.skeleton_mode(&library));
        editor.set_active_phrase("B1");

        assert!(editor.update_course_from_skeleton(&library).unwrap());
        assert!(editor.is_modified());
        assert_eq!(editor.active_phrase().unwrap().id, "B1");
        editor.switch_to_next_phrase();
        let imported = editor.active_phrase().unwrap();
        assert_eq!(imported.foreign_id.as_deref(), Some("s-p"));
        assert_eq!(imported.text, "hello");
        assert!(!editor.update_course_from_skeleton(&library).unwrap());
    }

    #[test]
    fn skeleton_errors_and_mode() {
        let mut library = CourseLibrary::new();
        let mut editor = EditorSession::new();
        editor.set_course(course());
        assert!(matches!(
            editor.update_course_from_skeleton(&library),
            Err(Error::UnknownSkeleton(_))
        ));
        library.add_skeleton(Skeleton {
            id: "c".to_string(),
            ..Default::default()
        });
        assert!(editor.skeleton_mode(&library));
        assert!(!editor.is_modified());
    }

    #[test]
    fn publish_notifies_library_subscribers() {
        let mut library = CourseLibrary::new();
        let rx = library.subscribe();
        let mut editor = EditorSession::new();
        assert!(!editor.publish(&mut library));
        editor.set_course(course());
        editor.edit_active_phrase(|p| p.sound = None);
        assert!(editor.publish(&mut library));
        assert!(!editor.is_modified());
        assert_eq!(rx.try_iter().count(), 1);
        let stored = library.get("c").unwrap();
        assert!(!stored.units[0].phrases[0].has_sound());
    }
}
