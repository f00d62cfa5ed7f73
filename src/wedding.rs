//! Multi-wedding support.
//!
//! This module handles wedding discovery, naming conventions, and per-wedding
//! database file management. Each wedding is stored as an individual JSON file
//! with the naming convention: `<wedding_name>_wedding.json`. Scoping a store
//! file to one wedding replaces the `wedding_id` filter every query in the
//! legacy system carried.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::Error;

/// A wedding with its name and database file path.
#[derive(Debug, Clone)]
pub struct Wedding {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Wedding {
    /// Create a new wedding handle with the given display name.
    pub fn new(display_name: &str, data_dir: &Path) -> Self {
        let name = sanitize_wedding_name(display_name);
        let file_path = data_dir.join(format!("{}_wedding.json", name));

        Wedding {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Load a wedding handle from an existing database file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;

        if !file_name.ends_with("_wedding") {
            return None;
        }

        let name = file_name.strip_suffix("_wedding")?;
        let display_name = name.replace('_', " ");

        Some(Wedding {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    /// Create the database file for this wedding if it doesn't exist.
    pub fn create_if_not_exists(&self, wedding_date: Option<NaiveDate>) -> Result<(), Error> {
        if !self.file_path.exists() {
            let db = Database {
                wedding_date,
                ..Database::default()
            };
            db.save(&self.file_path)?;
        }
        Ok(())
    }

    /// Load the database for this wedding.
    pub fn load_database(&self) -> Database {
        Database::load(&self.file_path)
    }
}

/// Convert a display name to a safe wedding name for file naming.
/// Converts to lowercase and replaces spaces and punctuation with underscores.
pub fn sanitize_wedding_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing weddings in the data directory.
pub fn discover_weddings(data_dir: &Path) -> Result<Vec<Wedding>, Error> {
    let mut weddings = Vec::new();

    if !data_dir.exists() {
        return Ok(weddings);
    }

    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(wedding) = Wedding::from_file(path) {
                weddings.push(wedding);
            }
        }
    }

    weddings.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Ok(weddings)
}

/// Create a new wedding with the given name and optional wedding date.
pub fn create_wedding(
    display_name: &str,
    data_dir: &Path,
    wedding_date: Option<NaiveDate>,
) -> Result<Wedding, Error> {
    if display_name.trim().is_empty() {
        return Err(Error::Validation("wedding name cannot be empty".into()));
    }

    let wedding = Wedding::new(display_name, data_dir);

    if wedding.file_path.exists() {
        return Err(Error::Validation(format!(
            "wedding '{display_name}' already exists"
        )));
    }

    wedding.create_if_not_exists(wedding_date)?;

    Ok(wedding)
}

/// Find the most recently modified wedding in the data directory.
pub fn get_most_recent_wedding(data_dir: &Path) -> Result<Option<Wedding>, Error> {
    let weddings = discover_weddings(data_dir)?;

    if weddings.is_empty() {
        return Ok(None);
    }

    let mut most_recent: Option<(Wedding, std::time::SystemTime)> = None;

    for wedding in weddings {
        if let Ok(metadata) = fs::metadata(&wedding.file_path) {
            if let Ok(modified) = metadata.modified() {
                match most_recent {
                    None => most_recent = Some((wedding, modified)),
                    Some((_, current_time)) => {
                        if modified > current_time {
                            most_recent = Some((wedding, modified));
                        }
                    }
                }
            }
        }
    }

    Ok(most_recent.map(|(wedding, _)| wedding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_wedding_name() {
        assert_eq!(sanitize_wedding_name("Smith Jones"), "smith_jones");
        assert_eq!(sanitize_wedding_name("O'Brien-Lee 2025"), "o_brien_lee_2025");
        assert_eq!(sanitize_wedding_name("  Multiple   Spaces  "), "multiple_spaces");
        assert_eq!(sanitize_wedding_name(""), "");
    }

    #[test]
    fn create_and_discover_weddings() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 1);
        create_wedding("Smith Jones", dir.path(), date).unwrap();

        let found = discover_weddings(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "smith_jones");

        let db = found[0].load_database();
        assert_eq!(db.wedding_date, date);

        // Creating the same wedding again is rejected.
        assert!(create_wedding("Smith Jones", dir.path(), date).is_err());
    }
}
