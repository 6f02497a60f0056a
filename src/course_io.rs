use crate::course::model::{Course, Skeleton};
use crate::error::{Error, Result};
use crate::parsing::course_parser::parse_course_text;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TEXT_SUFFIX: &str = ".course.txt";
const JSON_SUFFIX: &str = ".json";
const SKELETON_SUFFIX: &str = ".skeleton.json";

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn is_course_file(path: &Path) -> bool {
    let name = file_name(path);
    name.ends_with(TEXT_SUFFIX)
        || (name.ends_with(JSON_SUFFIX)
            && !name.ends_with(SKELETON_SUFFIX)
            && name != "profile.json")
}

fn is_skeleton_file(path: &Path) -> bool {
    file_name(path).ends_with(SKELETON_SUFFIX)
}

/// Saves a course as pretty-printed JSON.
pub fn save_course(course: &Course, file_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(writer, course)?;
    debug!(course = %course.id, path = %file_path.display(), "course saved");
    Ok(())
}

/// Loads a JSON course. Duplicate unit or phrase ids are rejected.
pub fn load_course_json(file_path: &Path) -> Result<Course> {
    let reader = BufReader::new(File::open(file_path)?);
    let course: Course = serde_json::from_reader(reader)?;
    course.validate()?;
    Ok(course)
}

/// Loads a `.json` or `.course.txt` course file.
pub fn load_course_file(file_path: &Path) -> Result<Course> {
    let name = file_name(file_path);
    let course = if name.ends_with(TEXT_SUFFIX) {
        parse_course_text(&fs::read_to_string(file_path)?)?
    } else if name.ends_with(JSON_SUFFIX) {
        load_course_json(file_path)?
    } else {
        return Err(Error::UnsupportedFile(file_path.display().to_string()));
    };
    debug!(
        course = %course.id,
        units = course.units.len(),
        phrases = course.phrase_count(),
        "course file loaded"
    );
    Ok(course)
}

pub fn save_skeleton(skeleton: &Skeleton, file_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(writer, skeleton)?;
    debug!(skeleton = %skeleton.id, path = %file_path.display(), "skeleton saved");
    Ok(())
}

/// Loads a `.skeleton.json` file. Duplicate unit or phrase ids are rejected.
pub fn load_skeleton_file(file_path: &Path) -> Result<Skeleton> {
    if !is_skeleton_file(file_path) {
        return Err(Error::UnsupportedFile(file_path.display().to_string()));
    }
    let reader = BufReader::new(File::open(file_path)?);
    let skeleton: Skeleton = serde_json::from_reader(reader)?;
    skeleton.validate()?;
    Ok(skeleton)
}

/// Lists course files in `dir`, sorted by path. The learner profile and
/// skeletons are skipped.
pub fn scan_course_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    scan_dir(dir, is_course_file)
}

pub fn scan_skeleton_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    scan_dir(dir, is_skeleton_file)
}

fn scan_dir(dir: &Path, wanted: fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut course_files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unreadable directory entry");
                continue;
            }
        };
        if path.is_file() && wanted(&path) {
            course_files.push(path);
        }
    }
    course_files.sort();
    Ok(course_files)
}
