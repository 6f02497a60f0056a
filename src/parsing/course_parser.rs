use crate::course::model::{Course, Language, Phrase, PhraseType, Unit};
use crate::error::{Error, Result};
use regex::Regex;
use tracing::warn;

// Tracks which free-text field a plain continuation line belongs to
#[derive(Debug, PartialEq, Clone, Copy)]
enum ParsingSection {
    None,
    Description,
    Unit,
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn strip_comment(s: &str) -> &str {
    match s.find(" //") {
        Some(comment_start) => s[..comment_start].trim_end(),
        None => s,
    }
}

/// Splits `a | b | c` into trimmed fields.
fn fields(value: &str) -> Vec<&str> {
    value.split('|').map(|f| f.trim()).collect()
}

fn foreign_id(parts: &[&str], index: usize) -> Option<String> {
    parts
        .get(index)
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

/// Parses the line-oriented `.course.txt` authoring format.
pub fn parse_course_text(content: &str) -> Result<Course> {
    let directive_re = Regex::new(r"^([A-Z][A-Z0-9_]*)::\s*(.*)$").expect("valid regex");
    let id_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid regex");

    let mut course: Option<Course> = None;
    let mut current_unit: Option<String> = None;
    let mut excluded: Vec<(usize, String)> = Vec::new();
    let mut current_section = ParsingSection::None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() || line_trimmed.starts_with("//") {
            continue;
        }

        let Some(caps) = directive_re.captures(line_trimmed) else {
            match current_section {
                ParsingSection::Description => {
                    if let Some(c) = course.as_mut() {
                        c.description.push(' ');
                        c.description.push_str(line_trimmed);
                    }
                }
                _ => warn!(line = line_no, text = %line_trimmed, "stray text outside of a description, ignoring"),
            }
            continue;
        };
        let key = caps.get(1).map_or("", |m| m.as_str());
        let value = strip_comment(caps.get(2).map_or("", |m| m.as_str()).trim());

        if key == "COURSE" {
            if course.is_some() {
                return Err(parse_error(line_no, "second COURSE:: directive"));
            }
            if !id_re.is_match(value) {
                return Err(parse_error(line_no, format!("invalid course id '{}'", value)));
            }
            course = Some(Course {
                id: value.to_string(),
                ..Default::default()
            });
            current_section = ParsingSection::None;
            continue;
        }

        let c = course
            .as_mut()
            .ok_or_else(|| parse_error(line_no, format!("{}:: before COURSE::", key)))?;

        current_section = ParsingSection::None;
        match key {
            "TITLE" => c.title = value.to_string(),
            "I18N_TITLE" => c.i18n_title = value.to_string(),
            "SKELETON" => c.foreign_id = Some(value.to_string()).filter(|v| !v.is_empty()),
            "DESCRIPTION" => {
                c.description = value.to_string();
                current_section = ParsingSection::Description;
            }
            "LANGUAGE" => {
                let parts = fields(value);
                let id = parts.first().copied().unwrap_or_default();
                if id.is_empty() {
                    return Err(parse_error(line_no, "LANGUAGE:: needs an id"));
                }
                let tags = std::mem::take(&mut c.language.pronunciation_tags);
                c.language = Language::new(id, parts.get(1).copied().unwrap_or(id));
                c.language.pronunciation_tags = tags;
            }
            "TAG" => {
                let parts = fields(value);
                match parts.as_slice() {
                    [id, title, ..] if !id.is_empty() => {
                        c.language.add_pronunciation_tag(*id, *title);
                    }
                    _ => warn!(line = line_no, "malformed TAG:: line, expected '<id> | <title>'"),
                }
            }
            "UNIT" => {
                let parts = fields(value);
                let id = parts.first().copied().unwrap_or_default();
                if !id_re.is_match(id) {
                    return Err(parse_error(line_no, format!("invalid unit id '{}'", id)));
                }
                let title = parts.get(1).copied().unwrap_or(id);
                let mut unit = Unit::new(id, title);
                unit.foreign_id = foreign_id(&parts, 2);
                c.add_unit(unit)
                    .map_err(|e| parse_error(line_no, e.to_string()))?;
                current_unit = Some(id.to_string());
                current_section = ParsingSection::Unit;
            }
            "PHRASE" => {
                let unit_id = current_unit
                    .as_deref()
                    .ok_or_else(|| parse_error(line_no, "PHRASE:: before any UNIT::"))?;
                let parts = fields(value);
                let id = parts.first().copied().unwrap_or_default();
                if !id_re.is_match(id) {
                    return Err(parse_error(line_no, format!("invalid phrase id '{}'", id)));
                }
                let type_str = parts.get(1).copied().unwrap_or("word");
                let phrase_type = PhraseType::parse(type_str)
                    .ok_or_else(|| parse_error(line_no, format!("unknown phrase type '{}'", type_str)))?;
                let mut phrase = Phrase {
                    id: id.to_string(),
                    text: parts.get(2).copied().unwrap_or_default().to_string(),
                    i18n_text: parts.get(3).copied().unwrap_or_default().to_string(),
                    phrase_type,
                    ..Default::default()
                };
                if let Some(sound) = parts.get(4).filter(|s| !s.is_empty()) {
                    phrase.sound = Some(sound.to_string());
                }
                if let Some(phonemes) = parts.get(5) {
                    for phoneme in phonemes.split_whitespace() {
                        phrase.add_phoneme(phoneme);
                    }
                }
                phrase.foreign_id = foreign_id(&parts, 6);
                if phrase.text.is_empty() {
                    warn!(line = line_no, phrase = %phrase.id, "phrase has no text");
                }
                c.add_phrase(unit_id, phrase)
                    .map_err(|e| parse_error(line_no, e.to_string()))?;
                current_section = ParsingSection::Unit;
            }
            "EXCLUDED" => excluded.push((line_no, value.to_string())),
            other => warn!(line = line_no, directive = %other, "unknown directive, ignoring"),
        }
    }

    let mut course = course.ok_or_else(|| parse_error(0, "missing COURSE:: directive"))?;
    for (line_no, phrase_id) in excluded {
        match course.phrase_mut(&phrase_id) {
            Some(phrase) => phrase.excluded = true,
            None => return Err(parse_error(line_no, format!("EXCLUDED:: unknown phrase '{}'", phrase_id))),
        }
    }
    if course.title.is_empty() {
        course.title = course.id.clone();
    }
    Ok(course)
}
