//! File locator – finds includes, fonts and pictures on a search path.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::LocateError;

/// Sub-directories searched beneath every search directory.
const SUB_LOCATIONS: [&str; 2] = ["images", "templates"];

/// Resolves a name from the markup to a readable file.
pub trait FileLocator {
    fn locate(&self, name: &str) -> Result<PathBuf, LocateError>;
}

/// Removes one pair of matching surrounding quotes, if present.
pub fn strip_quotes(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &name[1..name.len() - 1];
        }
    }
    name
}

/// Searches an ordered list of directories (and their `images/` and
/// `templates/` sub-directories).
#[derive(Debug, Clone, Default)]
pub struct SearchPathLocator {
    dirs: Vec<PathBuf>,
}

impl SearchPathLocator {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut locator = Self::default();
        for dir in dirs {
            locator.push_dir(dir.into());
        }
        locator
    }

    /// The default search list: `extra` first, then the working directory,
    /// the executable's directory, `/etc` and `/usr/local/etc`.
    pub fn standard(extra: &[PathBuf]) -> Self {
        let mut locator = Self::new(extra.iter().cloned());
        if let Ok(cwd) = env::current_dir() {
            locator.push_dir(cwd);
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            locator.push_dir(exe_dir);
        }
        locator.push_dir(PathBuf::from("/etc"));
        locator.push_dir(PathBuf::from("/usr/local/etc"));
        locator
    }

    fn push_dir(&mut self, dir: PathBuf) {
        for candidate in std::iter::once(dir.clone())
            .chain(SUB_LOCATIONS.iter().map(|sub| dir.join(sub)))
        {
            if !self.dirs.contains(&candidate) {
                self.dirs.push(candidate);
            }
        }
    }
}

impl FileLocator for SearchPathLocator {
    fn locate(&self, name: &str) -> Result<PathBuf, LocateError> {
        let name = strip_quotes(name.trim());
        let direct = Path::new(name);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        if direct.is_relative() {
            for dir in &self.dirs {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    log::debug!("located {name:?} at {}", candidate.display());
                    return Ok(candidate);
                }
            }
        }
        Err(LocateError::NotFound {
            name: name.to_string(),
            searched: self.dirs.clone(),
        })
    }
}
