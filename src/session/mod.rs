//! Sessions: iteration over the phrases of a course
//!
//! # Components
//! - `actions.rs`: flattening a course into ordered action groups
//! - `cursor.rs`: position inside an action sequence
//! - `training.rs`: accept / skip / reject state machine for learners
//! - `editor.rs`: the same navigation for contributors editing a course

pub mod actions;
pub mod cursor;
pub mod editor;
pub mod training;

pub use actions::{Action, ActionGroup, ActionSequence};
pub use cursor::ActionCursor;
pub use editor::EditorSession;
pub use training::{
    Judgment, JudgmentRecord, JudgmentSink, Progress, SessionEvent, SessionState, TrainingSession,
};
