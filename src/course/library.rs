//! Loaded courses and the "content changed" notification sessions listen to.
//!
//! Courses are handed out as `Arc<Course>` snapshots. Replacing a course never
//! mutates a snapshot a session already holds; subscribers receive the new
//! snapshot and rebuild from it.

use super::model::{Course, Skeleton};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum CourseEvent {
    /// A course was loaded or its content replaced
    Replaced(Arc<Course>),
    /// The course with this id is no longer available
    Removed(String),
}

#[derive(Debug, Default)]
pub struct CourseLibrary {
    courses: Vec<Arc<Course>>,
    skeletons: Vec<Skeleton>,
    subscribers: Vec<Sender<CourseEvent>>,
}

impl CourseLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<CourseEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, event: CourseEvent) {
        // a failed send means the receiving session is gone
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(subscribers = self.subscribers.len(), "course event broadcast");
    }

    /// Stores `course`, replacing any course with the same id, and notifies subscribers.
    pub fn replace(&mut self, course: Course) -> Arc<Course> {
        let course = Arc::new(course);
        match self.courses.iter_mut().find(|c| c.id == course.id) {
            Some(slot) => {
                info!(course = %course.id, "course replaced");
                *slot = Arc::clone(&course);
            }
            None => {
                info!(course = %course.id, units = course.units.len(), "course loaded");
                self.courses.push(Arc::clone(&course));
            }
        }
        self.broadcast(CourseEvent::Replaced(Arc::clone(&course)));
        course
    }

    pub fn insert(&mut self, course: Course) -> Arc<Course> {
        self.replace(course)
    }

    pub fn remove(&mut self, course_id: &str) -> Option<Arc<Course>> {
        let idx = self.courses.iter().position(|c| c.id == course_id)?;
        let removed = self.courses.remove(idx);
        info!(course = %course_id, "course removed");
        self.broadcast(CourseEvent::Removed(course_id.to_string()));
        Some(removed)
    }

    pub fn get(&self, course_id: &str) -> Option<Arc<Course>> {
        self.courses.iter().find(|c| c.id == course_id).cloned()
    }

    pub fn courses(&self) -> &[Arc<Course>] {
        &self.courses
    }

    /// Stores a skeleton, replacing one with the same id. Skeletons do not
    /// notify subscribers; courses pick up changes through
    /// [`Course::update_from_skeleton`].
    pub fn add_skeleton(&mut self, skeleton: Skeleton) {
        match self.skeletons.iter_mut().find(|s| s.id == skeleton.id) {
            Some(slot) => *slot = skeleton,
            None => {
                debug!(skeleton = %skeleton.id, units = skeleton.units.len(), "skeleton loaded");
                self.skeletons.push(skeleton);
            }
        }
    }

    pub fn skeleton(&self, skeleton_id: &str) -> Option<&Skeleton> {
        self.skeletons.iter().find(|s| s.id == skeleton_id)
    }

    pub fn skeletons(&self) -> &[Skeleton] {
        &self.skeletons
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
