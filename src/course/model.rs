use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhraseType {
    #[default]
    Word,
    Expression,
    Sentence,
    Paragraph,
}

impl PhraseType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Some(PhraseType::Word),
            "expression" => Some(PhraseType::Expression),
            "sentence" => Some(PhraseType::Sentence),
            "paragraph" => Some(PhraseType::Paragraph),
            _ => None,
        }
    }
}

/// Contributor-facing state of a phrase while the course is being written
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    #[default]
    Unknown,
    Translated,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Phrase {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub i18n_text: String,
    /// Reference to the recorded native-speaker audio, relative to the course file
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub phonemes: Vec<String>,
    #[serde(default)]
    pub phrase_type: PhraseType,
    #[serde(default)]
    pub edit_state: EditState,
    #[serde(default)]
    pub excluded: bool,
    /// Id of the skeleton phrase this phrase translates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
}

impl Phrase {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Phrase {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Only phrases with audio can be trained.
    pub fn has_sound(&self) -> bool {
        self.sound.as_deref().map_or(false, |s| !s.is_empty())
    }

    pub fn add_phoneme(&mut self, phoneme: impl Into<String>) {
        let phoneme = phoneme.into();
        if !self.phonemes.contains(&phoneme) {
            self.phonemes.push(phoneme);
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Unit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub phrases: Vec<Phrase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
}

impl Unit {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Unit {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_phrase(mut self, phrase: Phrase) -> Self {
        self.phrases.push(phrase);
        self
    }

    pub fn phrase(&self, phrase_id: &str) -> Option<&Phrase> {
        self.phrases.iter().find(|p| p.id == phrase_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PronunciationTag {
    pub id: String,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Language {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub i18n_title: String,
    #[serde(default)]
    pub pronunciation_tags: Vec<PronunciationTag>,
}

impl Language {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Language {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Registers a tag unless its id is already known.
    pub fn add_pronunciation_tag(&mut self, id: impl Into<String>, title: impl Into<String>) -> bool {
        let id = id.into();
        if self.pronunciation_tags.iter().any(|t| t.id == id) {
            warn!(tag = %id, language = %self.id, "pronunciation tag already registered");
            return false;
        }
        self.pronunciation_tags.push(PronunciationTag {
            id,
            title: title.into(),
        });
        true
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub i18n_title: String,
    #[serde(default)]
    pub description: String,
    pub language: Language,
    #[serde(default)]
    pub units: Vec<Unit>,
    /// Skeleton this course was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
}

impl Course {
    pub fn new(id: impl Into<String>, title: impl Into<String>, language: Language) -> Self {
        Course {
            id: id.into(),
            title: title.into(),
            language,
            ..Default::default()
        }
    }

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// Finds a phrase anywhere in the course together with its owning unit.
    pub fn phrase(&self, phrase_id: &str) -> Option<(&Unit, &Phrase)> {
        self.units
            .iter()
            .find_map(|u| u.phrase(phrase_id).map(|p| (u, p)))
    }

    pub(crate) fn phrase_mut(&mut self, phrase_id: &str) -> Option<&mut Phrase> {
        self.units
            .iter_mut()
            .flat_map(|u| u.phrases.iter_mut())
            .find(|p| p.id == phrase_id)
    }

    pub fn phrase_count(&self) -> usize {
        self.units.iter().map(|u| u.phrases.len()).sum()
    }

    fn has_phrase_id(&self, phrase_id: &str) -> bool {
        self.phrase(phrase_id).is_some()
    }

    pub fn add_unit(&mut self, unit: Unit) -> Result<()> {
        if self.unit(&unit.id).is_some() {
            return Err(Error::DuplicateUnit(unit.id));
        }
        for (i, phrase) in unit.phrases.iter().enumerate() {
            let repeated = unit.phrases[..i].iter().any(|p| p.id == phrase.id);
            if repeated || self.has_phrase_id(&phrase.id) {
                return Err(Error::DuplicatePhrase(phrase.id.clone()));
            }
        }
        self.units.push(unit);
        Ok(())
    }

    /// Checks that unit ids and phrase ids are unique within the course.
    /// Courses deserialized from disk go through this before use.
    pub fn validate(&self) -> Result<()> {
        check_unique_ids(&self.units)
    }

    pub fn add_phrase(&mut self, unit_id: &str, phrase: Phrase) -> Result<()> {
        if self.has_phrase_id(&phrase.id) {
            return Err(Error::DuplicatePhrase(phrase.id));
        }
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| Error::UnknownUnit(unit_id.to_string()))?;
        unit.phrases.push(phrase);
        Ok(())
    }

    /// Appends an empty unit with a fresh id and returns that id.
    pub fn create_unit(&mut self) -> String {
        let mut id = uuid::Uuid::new_v4().to_string();
        while self.unit(&id).is_some() {
            warn!("unit id generator hit a collision, recreating id");
            id = uuid::Uuid::new_v4().to_string();
        }
        self.units.push(Unit::new(id.clone(), "New Unit"));
        id
    }

    /// Appends an empty word phrase to `unit_id`, with an id unique across the course.
    pub fn create_phrase(&mut self, unit_id: &str) -> Result<String> {
        let mut id = uuid::Uuid::new_v4().to_string();
        while self.has_phrase_id(&id) {
            warn!("phrase id generator hit a collision, recreating id");
            id = uuid::Uuid::new_v4().to_string();
        }
        self.add_phrase(unit_id, Phrase::new(id.clone(), ""))?;
        Ok(id)
    }

    /// Imports units and phrases of `skeleton` that this course does not link
    /// to yet. Linked phrases whose skeleton text changed get the new text as
    /// their reference and go back to `EditState::Unknown`.
    ///
    /// Returns whether anything changed. Course items no longer present in
    /// the skeleton are left alone.
    pub fn update_from_skeleton(&mut self, skeleton: &Skeleton) -> Result<bool> {
        if self.foreign_id.as_deref() != Some(skeleton.id.as_str()) {
            return Err(Error::UnknownSkeleton(
                self.foreign_id.clone().unwrap_or_default(),
            ));
        }
        let mut changed = false;
        for skeleton_unit in &skeleton.units {
            let unit_index = match self
                .units
                .iter()
                .position(|u| u.foreign_id.as_deref() == Some(skeleton_unit.id.as_str()))
            {
                Some(index) => index,
                None => {
                    let unit_id = self.create_unit();
                    let index = self.units.len() - 1;
                    let unit = &mut self.units[index];
                    unit.title = skeleton_unit.title.clone();
                    unit.foreign_id = Some(skeleton_unit.id.clone());
                    debug!(
                        unit = %unit_id,
                        skeleton_unit = %skeleton_unit.id,
                        "unit imported from skeleton"
                    );
                    changed = true;
                    index
                }
            };

            for skeleton_phrase in &skeleton_unit.phrases {
                let linked = self.units[unit_index]
                    .phrases
                    .iter_mut()
                    .find(|p| p.foreign_id.as_deref() == Some(skeleton_phrase.id.as_str()));
                if let Some(phrase) = linked {
                    if phrase.i18n_text != skeleton_phrase.text {
                        phrase.i18n_text = skeleton_phrase.text.clone();
                        phrase.edit_state = EditState::Unknown;
                        changed = true;
                    }
                    continue;
                }
                let unit_id = self.units[unit_index].id.clone();
                let phrase_id = self.create_phrase(&unit_id)?;
                if let Some(phrase) = self.phrase_mut(&phrase_id) {
                    phrase.text = skeleton_phrase.text.clone();
                    phrase.i18n_text = skeleton_phrase.text.clone();
                    phrase.phrase_type = skeleton_phrase.phrase_type;
                    phrase.foreign_id = Some(skeleton_phrase.id.clone());
                }
                changed = true;
            }
        }
        info!(
            course = %self.id,
            skeleton = %skeleton.id,
            changed,
            "course updated from skeleton"
        );
        Ok(changed)
    }
}

fn check_unique_ids(units: &[Unit]) -> Result<()> {
    let mut unit_ids = HashSet::new();
    let mut phrase_ids = HashSet::new();
    for unit in units {
        if !unit_ids.insert(unit.id.as_str()) {
            return Err(Error::DuplicateUnit(unit.id.clone()));
        }
        for phrase in &unit.phrases {
            if !phrase_ids.insert(phrase.id.as_str()) {
                return Err(Error::DuplicatePhrase(phrase.id.clone()));
            }
        }
    }
    Ok(())
}

/// Language-independent course template. Courses link to it through
/// `foreign_id` on the course, its units and its phrases.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Skeleton {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Skeleton {
    pub fn validate(&self) -> Result<()> {
        check_unique_ids(&self.units)
    }
}
