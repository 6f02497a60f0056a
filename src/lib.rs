// Declare all modules that are part of this library
pub mod config;
pub mod error;
pub mod course {
    pub mod library;
    pub mod model;
}
pub mod parsing {
    pub mod course_parser;
}
pub mod session;
pub mod profile;
pub mod profile_io;
pub mod course_io;

pub use error::{Error, Result};
