use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

fn default_learner_name() -> String {
    "learner".to_string()
}

fn default_learned_threshold() -> u32 {
    3
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Directory scanned for `.json` and `.course.txt` course files
    pub content_project_dir: String,
    /// Where the learner profile snapshot lives. Defaults to `profile.json`
    /// inside the content directory.
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default = "default_learner_name")]
    pub learner_name: String,
    /// Accepts needed before a phrase counts as known
    #[serde(default = "default_learned_threshold")]
    pub learned_threshold: u32,
}

impl Config {
    pub fn profile_file(&self) -> PathBuf {
        match &self.profile_path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(&self.content_project_dir).join("profile.json"),
        }
    }
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let config = toml::from_str::<Config>(contents)?;
    if config.learned_threshold == 0 {
        return Err(Error::Config(
            "learned_threshold must be at least 1".to_string(),
        ));
    }
    Ok(config)
}

pub fn load_config_from_file(file_path: impl AsRef<Path>) -> Result<Config> {
    let file_path = file_path.as_ref();
    let contents = fs::read_to_string(file_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read {}: {}. Please ensure it exists.",
            file_path.display(),
            e
        ))
    })?;
    let loaded_config = parse_config(&contents)?;

    let path = PathBuf::from(&loaded_config.content_project_dir);
    if !path.is_dir() {
        return Err(Error::Config(format!(
            "content_project_dir specified in {} ('{}') is not a valid directory.",
            file_path.display(),
            loaded_config.content_project_dir
        )));
    }
    Ok(loaded_config)
}
