use crate::error::{Error, Result};
use crate::session::training::{Judgment, JudgmentRecord, JudgmentSink};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhraseState {
    #[default]
    New,
    Active,
    Known,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PhraseProgress {
    pub state: PhraseState,
    pub accepted: u32,
    pub rejected: u32,
    pub required_threshold: u32,
}

impl PhraseProgress {
    fn new(required_threshold: u32) -> Self {
        PhraseProgress {
            state: PhraseState::New,
            accepted: 0,
            rejected: 0,
            required_threshold,
        }
    }

    fn apply(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Accepted => {
                self.accepted += 1;
                self.state = if self.accepted >= self.required_threshold {
                    PhraseState::Known
                } else {
                    PhraseState::Active
                };
            }
            Judgment::Rejected => {
                self.rejected += 1;
                // a known phrase that was rejected needs practice again
                self.state = PhraseState::Active;
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LearnerProfile {
    /// Assigned by [`ProfileManager::add_profile`]
    #[serde(default)]
    pub id: u32,
    pub name: String,
    pub learned_threshold: u32,
    /// Keyed by `course_id/phrase_id`
    pub phrases: HashMap<String, PhraseProgress>,
}

fn progress_key(course_id: &str, phrase_id: &str) -> String {
    format!("{}/{}", course_id, phrase_id)
}

impl LearnerProfile {
    pub fn new(name: impl Into<String>, learned_threshold: u32) -> Self {
        LearnerProfile {
            id: 0,
            name: name.into(),
            learned_threshold: learned_threshold.max(1),
            phrases: HashMap::new(),
        }
    }

    pub fn progress(&self, course_id: &str, phrase_id: &str) -> Option<&PhraseProgress> {
        self.phrases.get(&progress_key(course_id, phrase_id))
    }

    pub fn phrase_state(&self, course_id: &str, phrase_id: &str) -> PhraseState {
        self.progress(course_id, phrase_id)
            .map_or(PhraseState::New, |p| p.state)
    }

    pub fn apply(&mut self, record: &JudgmentRecord) {
        let threshold = self.learned_threshold;
        let progress = self
            .phrases
            .entry(progress_key(&record.course_id, &record.phrase_id))
            .or_insert_with(|| PhraseProgress::new(threshold));
        progress.apply(record.judgment);
        debug!(
            phrase = %record.phrase_id,
            state = ?progress.state,
            accepted = progress.accepted,
            "judgment applied to profile"
        );
    }

    pub fn count_known(&self) -> usize {
        self.phrases
            .values()
            .filter(|p| p.state == PhraseState::Known)
            .count()
    }

    pub fn count_active(&self) -> usize {
        self.phrases
            .values()
            .filter(|p| p.state == PhraseState::Active)
            .count()
    }

    pub fn total_judgments(&self) -> u32 {
        self.phrases.values().map(|p| p.accepted + p.rejected).sum()
    }

    /// Forgets all progress, keeping name and threshold.
    pub fn reset(&mut self) {
        self.phrases.clear();
    }
}

/// All learners on this machine and which one is training.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ProfileManager {
    profiles: Vec<LearnerProfile>,
    #[serde(default)]
    active: Option<u32>,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a learner with the next free id and returns that id.
    pub fn add_profile(&mut self, name: impl Into<String>, learned_threshold: u32) -> u32 {
        let id = self.profiles.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let mut profile = LearnerProfile::new(name, learned_threshold);
        profile.id = id;
        info!(id, name = %profile.name, "learner profile added");
        self.profiles.push(profile);
        id
    }

    pub fn remove_profile(&mut self, id: u32) -> Option<LearnerProfile> {
        let index = self.profiles.iter().position(|p| p.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.profiles.remove(index))
    }

    pub fn profiles(&self) -> &[LearnerProfile] {
        &self.profiles
    }

    pub fn profile(&self, id: u32) -> Option<&LearnerProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn active_profile(&self) -> Option<&LearnerProfile> {
        self.profile(self.active?)
    }

    pub fn active_profile_mut(&mut self) -> Option<&mut LearnerProfile> {
        let id = self.active?;
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    /// Returns whether the active learner changed.
    pub fn set_active_profile(&mut self, id: u32) -> Result<bool> {
        if self.profile(id).is_none() {
            return Err(Error::UnknownProfile(id));
        }
        if self.active == Some(id) {
            return Ok(false);
        }
        self.active = Some(id);
        debug!(id, "active learner changed");
        Ok(true)
    }
}

impl JudgmentSink for ProfileManager {
    fn record(&mut self, record: &JudgmentRecord) -> Result<()> {
        self.active_profile_mut()
            .ok_or(Error::NoActiveProfile)?
            .apply(record);
        Ok(())
    }
}

/// Profile handle the UI can read while a session records into it.
#[derive(Debug, Clone)]
pub struct SharedProfiles(Rc<RefCell<ProfileManager>>);

impl SharedProfiles {
    pub fn new(profiles: ProfileManager) -> Self {
        SharedProfiles(Rc::new(RefCell::new(profiles)))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, ProfileManager> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, ProfileManager> {
        self.0.borrow_mut()
    }
}

impl JudgmentSink for SharedProfiles {
    fn record(&mut self, record: &JudgmentRecord) -> Result<()> {
        self.0.borrow_mut().record(record)
    }
}
