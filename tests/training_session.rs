// Sessions hold a course snapshot; edits reach them only as a full rebuild.

use phrasedrill_rust_gui::course::library::CourseLibrary;
use phrasedrill_rust_gui::course::model::{Course, Language, Phrase, Unit};
use phrasedrill_rust_gui::session::{
    ActionSequence, EditorSession, Progress, SessionEvent, SessionState, TrainingSession,
};
use std::sync::Arc;

fn language() -> Language {
    Language::new("de", "Deutsch")
}

fn with_sound(id: &str) -> Phrase {
    Phrase::new(id, id.to_lowercase()).with_sound(format!("/tmp/{}.ogg", id.to_lowercase()))
}

fn course_with(units: Vec<Unit>) -> Arc<Course> {
    let mut course = Course::new("courseid", "title", language());
    course.description = "description of the course".to_string();
    course.units = units;
    Arc::new(course)
}

/// Unit A: A1 (sound), A2 (none). Unit B: B1, B2 (both with sound).
fn mixed_course() -> Arc<Course> {
    course_with(vec![
        Unit::new("A", "Unit A")
            .with_phrase(with_sound("A1"))
            .with_phrase(Phrase::new("A2", "a2")),
        Unit::new("B", "Unit B")
            .with_phrase(with_sound("B1"))
            .with_phrase(with_sound("B2")),
    ])
}

fn full_course() -> Arc<Course> {
    course_with(vec![
        Unit::new("A", "Unit A")
            .with_phrase(with_sound("A1"))
            .with_phrase(with_sound("A2")),
        Unit::new("B", "Unit B")
            .with_phrase(with_sound("B1"))
            .with_phrase(with_sound("B2")),
    ])
}

fn active(session: &TrainingSession) -> (String, String) {
    (
        session.active_unit().unwrap().id.clone(),
        session.active_phrase().unwrap().id.clone(),
    )
}

fn completions(session: &mut TrainingSession) -> usize {
    session
        .drain_events()
        .into_iter()
        .filter(|e| *e == SessionEvent::Completed)
        .count()
}

#[test]
fn create_training_session_without_units() {
    let course = course_with(Vec::new());
    let mut session = TrainingSession::new();
    session.set_course(Some(course.clone()));
    assert!(Arc::ptr_eq(session.course().unwrap(), &course));
    assert!(session.trainable_actions().is_empty());
    assert!(session.active_unit().is_none());
    assert!(session.active_phrase().is_none());
    assert!(!session.has_next());
    assert!(!session.has_previous());
}

#[test]
fn create_training_session_with_empty_sounds() {
    let mut session = TrainingSession::new();
    session.set_course(Some(mixed_course()));
    let actions = session.trainable_actions();
    assert_eq!(actions.group_count(), 2);
    assert_eq!(actions.group_actions(0).len(), 1);
    assert_eq!(actions.group_actions(1).len(), 2);
}

#[test]
fn units_with_only_silent_phrases_produce_no_groups() {
    let course = course_with(vec![
        Unit::new("A", "Unit A").with_phrase(with_sound("A1")),
        Unit::new("B", "Unit B").with_phrase(Phrase::new("B1", "b1")),
        Unit::new("C", "Unit C"),
    ]);
    let sequence = ActionSequence::for_training(&course);
    assert_eq!(sequence.group_count(), 1);
    assert_eq!(sequence.groups()[0].unit_id, "A");
}

#[test]
fn silent_course_never_starts() {
    let course = course_with(vec![
        Unit::new("A", "Unit A").with_phrase(Phrase::new("A1", "a1")),
        Unit::new("B", "Unit B").with_phrase(Phrase::new("B1", "b1").with_sound("")),
    ]);
    let mut session = TrainingSession::new();
    session.set_course(Some(course));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.active_unit().is_none());
    assert!(!session.has_next() && !session.has_previous());
    assert_eq!(session.accept(), Progress::Ignored);
    assert_eq!(session.skip(), Progress::Ignored);
    assert_eq!(completions(&mut session), 0);
}

#[test]
fn rebuild_from_same_course_is_identical() {
    let course = mixed_course();
    let mut first = TrainingSession::new();
    first.set_course(Some(course.clone()));
    let mut second = TrainingSession::new();
    second.set_course(Some(course.clone()));
    assert_eq!(first.trainable_actions(), second.trainable_actions());
    first.set_course(Some(course));
    assert_eq!(first.trainable_actions(), second.trainable_actions());
}

#[test]
fn accept_walks_mixed_course_and_completes_once() {
    let mut session = TrainingSession::new();
    session.set_course(Some(mixed_course()));
    assert_eq!(active(&session), ("A".into(), "A1".into()));

    assert_eq!(session.accept(), Progress::Advanced);
    assert_eq!(active(&session), ("B".into(), "B1".into()));
    assert_eq!(session.accept(), Progress::Advanced);
    assert_eq!(active(&session), ("B".into(), "B2".into()));
    assert_eq!(completions(&mut session), 0);

    assert!(!session.is_completed());
    assert_eq!(session.accept(), Progress::Completed);
    assert!(session.is_completed());
    assert_eq!(completions(&mut session), 1);
    assert_eq!(session.accept(), Progress::Ignored);
    assert_eq!(session.skip(), Progress::Ignored);
    assert_eq!(completions(&mut session), 0);
}

#[test]
fn iterate_course() {
    let mut session = TrainingSession::new();
    session.set_course(Some(full_course()));

    // starts on the first unit's first phrase
    assert_eq!(active(&session), ("A".into(), "A1".into()));

    session.set_unit("A");
    assert_eq!(session.active_unit().unwrap().id, "A");
    session.set_unit("B");
    assert_eq!(session.active_unit().unwrap().id, "B");

    session.set_phrase("A1");
    assert_eq!(active(&session), ("A".into(), "A1".into()));
    session.set_phrase("B1");
    assert_eq!(active(&session), ("B".into(), "B1".into()));

    let actions = session.trainable_actions();
    assert_eq!(actions.group_count(), 2);
    assert_eq!(actions.group_actions(0).len(), 2);
    assert_eq!(actions.group_actions(1).len(), 2);

    // accept iterator
    session.set_phrase("A1");
    assert!(session.has_next());
    session.accept();
    assert_eq!(active(&session), ("A".into(), "A2".into()));
    session.accept();
    assert_eq!(session.active_phrase().unwrap().id, "B1");
    session.accept();
    assert_eq!(session.active_phrase().unwrap().id, "B2");
    assert!(!session.has_next());

    // skip iterator
    session.set_phrase("A1");
    assert_eq!(active(&session), ("A".into(), "A1".into()));
    assert!(!session.has_previous());
    assert!(session.has_next());
    session.skip();
    assert_eq!(active(&session), ("A".into(), "A2".into()));
    session.skip();
    assert_eq!(session.active_phrase().unwrap().id, "B1");
    session.skip();
    assert_eq!(session.active_phrase().unwrap().id, "B2");
    assert!(session.has_previous());
    assert!(!session.has_next());

    // completion
    session.drain_events();
    session.set_phrase("B1");
    session.accept();
    assert_eq!(completions(&mut session), 0);
    session.accept();
    assert_eq!(completions(&mut session), 1);
}

#[test]
fn unknown_targets_leave_cursor_alone() {
    let mut session = TrainingSession::new();
    session.set_course(Some(mixed_course()));
    session.set_phrase("B2");
    session.set_phrase("A2"); // no sound, not trainable
    session.set_unit("missing");
    assert_eq!(active(&session), ("B".into(), "B2".into()));
}

#[test]
fn advance_and_retreat_round_trip_everywhere() {
    let mut session = TrainingSession::new();
    session.set_course(Some(full_course()));
    for phrase in ["A2", "B1"] {
        session.set_phrase(phrase);
        let before = active(&session);
        session.next_phrase();
        session.previous_phrase();
        assert_eq!(active(&session), before);
    }
}

#[test]
fn library_replacement_rebuilds_session() {
    let mut library = CourseLibrary::new();
    let mut session = TrainingSession::new();
    session.watch(library.subscribe());

    let course = library.insert((*mixed_course()).clone());
    session.set_course(Some(course));
    session.accept();
    assert_eq!(session.active_phrase().unwrap().id, "B1");

    // unrelated course: nothing happens
    library.insert(Course::new("other", "Other", language()));
    assert!(!session.sync());
    assert_eq!(session.active_phrase().unwrap().id, "B1");

    library.replace((*full_course()).clone());
    assert!(session.sync());
    assert_eq!(session.trainable_actions().len(), 4);
    assert_eq!(active(&session), ("A".into(), "A1".into()));

    library.remove("courseid");
    assert!(session.sync());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.course().is_none());
}

#[test]
fn loading_through_library_rebuilds_only_once() {
    let mut library = CourseLibrary::new();
    let mut session = TrainingSession::new();
    session.watch(library.subscribe());
    session.set_course(Some(library.replace((*mixed_course()).clone())));
    session.accept();

    // the library notification carries the snapshot already held
    assert!(!session.sync());
    assert_eq!(session.active_phrase().unwrap().id, "B1");
    let events = session.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == SessionEvent::CourseChanged)
            .count(),
        1
    );
}

#[test]
fn editor_changes_reach_training_session() {
    let mut library = CourseLibrary::new();
    let mut session = TrainingSession::new();
    session.watch(library.subscribe());
    session.set_course(Some(library.insert((*mixed_course()).clone())));
    assert_eq!(session.trainable_actions().len(), 3);

    let mut editor = EditorSession::new();
    editor.set_course((**session.course().unwrap()).clone());
    editor.set_active_phrase("A2");
    editor.edit_active_phrase(|p| p.sound = Some("/tmp/a2.ogg".to_string()));
    editor.publish(&mut library);

    assert!(session.sync());
    assert_eq!(session.trainable_actions().len(), 4);
    session.set_phrase("A2");
    assert_eq!(active(&session), ("A".into(), "A2".into()));
}
