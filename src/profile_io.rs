use crate::error::Result;
use crate::profile::ProfileManager;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error as IoError, ErrorKind as IoErrorKind};
use std::path::Path;
use tracing::info;

/// Saves every learner profile to a JSON file.
pub fn save_profile_snapshot(profiles: &ProfileManager, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, profiles)?;
    info!(path = %file_path.display(), learners = profiles.profiles().len(), "profiles saved");
    Ok(())
}

/// Loads the learner profiles from a JSON file.
pub fn load_profile_snapshot(file_path: &Path) -> Result<ProfileManager> {
    if !file_path.exists() {
        return Err(IoError::new(
            IoErrorKind::NotFound,
            format!("Profile snapshot file not found at {:?}", file_path),
        )
        .into());
    }
    let reader = BufReader::new(File::open(file_path)?);
    let profiles: ProfileManager = serde_json::from_reader(reader)?;
    Ok(profiles)
}

/// Loads the snapshot, or starts with a single active learner `name` when
/// none exists yet.
pub fn load_or_create_profile(
    file_path: &Path,
    name: &str,
    learned_threshold: u32,
) -> Result<ProfileManager> {
    if file_path.exists() {
        return load_profile_snapshot(file_path);
    }
    info!(path = %file_path.display(), "no profile yet, starting fresh");
    let mut profiles = ProfileManager::new();
    let id = profiles.add_profile(name, learned_threshold);
    profiles.set_active_profile(id)?;
    Ok(profiles)
}
