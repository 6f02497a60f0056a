//! Training session: walks the trainable phrases of one course and turns the
//! learner's accept / skip / reject judgments into cursor moves.

use super::actions::ActionSequence;
use super::cursor::ActionCursor;
use crate::course::library::CourseEvent;
use crate::course::model::{Course, Language, Phrase, Unit};
use crate::error::Result;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentRecord {
    pub course_id: String,
    pub phrase_id: String,
    pub judgment: Judgment,
}

/// Receives learner judgments for persistence. The session does not depend
/// on the outcome; failures are only logged.
pub trait JudgmentSink {
    fn record(&mut self, record: &JudgmentRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No course, or a course without trainable phrases
    #[default]
    Idle,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CourseChanged,
    PhraseChanged,
    Completed,
}

/// Outcome of a judgment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Advanced,
    Completed,
    /// Session idle or already completed
    Ignored,
}

#[derive(Default)]
pub struct TrainingSession {
    course: Option<Arc<Course>>,
    cursor: ActionCursor,
    state: SessionState,
    events: Vec<SessionEvent>,
    updates: Option<Receiver<CourseEvent>>,
    sink: Option<Box<dyn JudgmentSink>>,
}

impl TrainingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Box<dyn JudgmentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state() == SessionState::Completed
    }

    pub fn course(&self) -> Option<&Arc<Course>> {
        self.course.as_ref()
    }

    pub fn language(&self) -> Option<&Language> {
        self.course.as_deref().map(|c| &c.language)
    }

    /// Replaces the course and rebuilds the session from scratch.
    pub fn set_course(&mut self, course: Option<Arc<Course>>) {
        let sequence = match course.as_deref() {
            Some(c) => ActionSequence::for_training(c),
            None => ActionSequence::empty(),
        };
        info!(
            course = course.as_deref().map_or("<none>", |c| c.id.as_str()),
            groups = sequence.group_count(),
            actions = sequence.len(),
            "training session rebuilt"
        );
        self.cursor = ActionCursor::new(sequence);
        self.course = course;
        self.state = if self.cursor.is_unset() {
            SessionState::Idle
        } else {
            SessionState::Active
        };
        self.events.push(SessionEvent::CourseChanged);
        self.events.push(SessionEvent::PhraseChanged);
    }

    /// Listens to a course library; call [`sync`](Self::sync) to apply its notifications.
    pub fn watch(&mut self, updates: Receiver<CourseEvent>) {
        self.updates = Some(updates);
    }

    /// Applies pending library notifications. Returns true if the session was rebuilt.
    /// A notification carrying the snapshot the session already holds is skipped.
    pub fn sync(&mut self) -> bool {
        let Some(updates) = self.updates.as_ref() else {
            return false;
        };
        let pending: Vec<CourseEvent> = updates.try_iter().collect();
        let mut rebuilt = false;
        for event in pending {
            let current_id = self.course.as_ref().map(|c| c.id.clone());
            match event {
                CourseEvent::Replaced(course)
                    if self.course.as_ref().map_or(false, |c| Arc::ptr_eq(c, &course)) => {}
                CourseEvent::Replaced(course) if current_id.as_deref() == Some(course.id.as_str()) => {
                    self.set_course(Some(course));
                    rebuilt = true;
                }
                CourseEvent::Removed(id) if current_id.as_deref() == Some(id.as_str()) => {
                    self.set_course(None);
                    rebuilt = true;
                }
                _ => {}
            }
        }
        rebuilt
    }

    pub fn trainable_actions(&self) -> &ActionSequence {
        self.cursor.sequence()
    }

    pub fn active_unit(&self) -> Option<&Unit> {
        let action = self.cursor.active_action()?;
        self.course.as_deref()?.units.get(action.unit_index)
    }

    pub fn active_phrase(&self) -> Option<&Phrase> {
        let action = self.cursor.active_action()?;
        self.active_unit()?.phrases.get(action.phrase_index)
    }

    pub fn has_next(&self) -> bool {
        self.cursor.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.cursor.has_previous()
    }

    /// Position of the active phrase as (1-based ordinal, total).
    pub fn progress(&self) -> (usize, usize) {
        let total = self.cursor.sequence().len();
        match self.cursor.position() {
            Some(index) => (index + 1, total),
            None => (0, total),
        }
    }

    pub fn set_unit(&mut self, unit_id: &str) {
        if self.cursor.set_unit(unit_id) {
            self.events.push(SessionEvent::PhraseChanged);
        }
    }

    pub fn set_phrase(&mut self, phrase_id: &str) {
        if self.cursor.set_phrase(phrase_id) {
            self.events.push(SessionEvent::PhraseChanged);
        }
    }

    /// Manual navigation, independent of judgments.
    pub fn next_phrase(&mut self) {
        if self.cursor.advance() {
            self.events.push(SessionEvent::PhraseChanged);
        }
    }

    pub fn previous_phrase(&mut self) {
        if self.cursor.retreat() {
            self.events.push(SessionEvent::PhraseChanged);
        }
    }

    pub fn accept(&mut self) -> Progress {
        self.judge(Some(Judgment::Accepted))
    }

    /// Leaves the phrase for later review; nothing is recorded.
    pub fn skip(&mut self) -> Progress {
        self.judge(None)
    }

    pub fn reject(&mut self) -> Progress {
        self.judge(Some(Judgment::Rejected))
    }

    fn judge(&mut self, judgment: Option<Judgment>) -> Progress {
        if self.state() != SessionState::Active {
            debug!(state = ?self.state(), "judgment ignored");
            return Progress::Ignored;
        }
        if let Some(judgment) = judgment {
            self.report(judgment);
        }
        if self.cursor.advance() {
            self.events.push(SessionEvent::PhraseChanged);
            Progress::Advanced
        } else {
            self.state = SessionState::Completed;
            self.events.push(SessionEvent::Completed);
            info!(course = ?self.course.as_ref().map(|c| &c.id), "training session completed");
            Progress::Completed
        }
    }

    fn report(&mut self, judgment: Judgment) {
        let (Some(sink), Some(course), Some(action)) = (
            self.sink.as_mut(),
            self.course.as_ref(),
            self.cursor.active_action(),
        ) else {
            return;
        };
        let record = JudgmentRecord {
            course_id: course.id.clone(),
            phrase_id: action.phrase_id.clone(),
            judgment,
        };
        if let Err(e) = sink.record(&record) {
            warn!(phrase = %record.phrase_id, error = %e, "failed to record judgment");
        }
    }

    /// Starts over from the first phrase; clears a completed state.
    pub fn restart(&mut self) {
        self.cursor.reset();
        if !self.cursor.is_unset() {
            self.state = SessionState::Active;
        }
        self.events.push(SessionEvent::PhraseChanged);
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<JudgmentRecord>>>);

    impl JudgmentSink for Recorder {
        fn record(&mut self, record: &JudgmentRecord) -> Result<()> {
            self.0.borrow_mut().push(record.clone());
            Ok(())
        }
    }

    struct Broken;

    impl JudgmentSink for Broken {
        fn record(&mut self, _record: &JudgmentRecord) -> Result<()> {
            Err(Error::Config("storage offline".to_string()))
        }
    }

    fn course() -> Arc<Course> {
        let mut course = Course::new("c", "Course", Language::new("it", "Italiano"));
        course.units = vec![
            Unit::new("A", "A").with_phrase(Phrase::new("A1", "ciao").with_sound("a1.ogg")),
            Unit::new("B", "B")
                .with_phrase(Phrase::new("B1", "grazie").with_sound("b1.ogg"))
                .with_phrase(Phrase::new("B2", "prego").with_sound("b2.ogg")),
        ];
        Arc::new(course)
    }

    #[test]
    fn sink_gets_accept_and_reject_but_not_skip() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut session = TrainingSession::new().with_sink(Box::new(Recorder(log.clone())));
        session.set_course(Some(course()));
        session.accept();
        session.skip();
        session.reject();
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].phrase_id, "A1");
        assert_eq!(log[0].judgment, Judgment::Accepted);
        assert_eq!(log[1].phrase_id, "B2");
        assert_eq!(log[1].judgment, Judgment::Rejected);
    }

    #[test]
    fn sink_failure_does_not_stop_session() {
        let mut session = TrainingSession::new().with_sink(Box::new(Broken));
        session.set_course(Some(course()));
        assert_eq!(session.accept(), Progress::Advanced);
        assert_eq!(session.active_phrase().unwrap().id, "B1");
    }

    #[test]
    fn completed_is_sticky_until_restart() {
        let mut session = TrainingSession::new();
        session.set_course(Some(course()));
        session.set_phrase("B2");
        assert_eq!(session.reject(), Progress::Completed);
        session.set_phrase("A1");
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.accept(), Progress::Ignored);

        session.restart();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.active_phrase().unwrap().id, "A1");
        assert_eq!(session.progress(), (1, 3));
    }

    #[test]
    fn events_follow_transitions() {
        let mut session = TrainingSession::new();
        session.set_course(Some(course()));
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::CourseChanged, SessionEvent::PhraseChanged]
        );
        session.set_phrase("missing");
        session.set_unit("A");
        assert!(session.drain_events().is_empty());
        session.next_phrase();
        session.previous_phrase();
        assert_eq!(session.drain_events().len(), 2);
    }

    #[test]
    fn no_course_is_idle() {
        let mut session = TrainingSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.language().is_none());
        assert_eq!(session.progress(), (0, 0));
        assert_eq!(session.skip(), Progress::Ignored);
    }
}
