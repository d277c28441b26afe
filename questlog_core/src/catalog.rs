//! Habit catalog: definitions, validation, and file persistence.
//!
//! The catalog is the configuration side of the system. It ships with a
//! small starter set so a fresh install has something on the board, and is
//! persisted as a JSON document the user edits through the `habit`
//! commands.

use crate::{Error, Habit, HabitCatalog, Metric, Result};
use fs2::FileExt;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cached starter catalog - built once and reused across all operations
static STARTER_CATALOG: Lazy<HabitCatalog> = Lazy::new(build_starter_catalog_internal);

/// Get a reference to the cached starter catalog
pub fn get_starter_catalog() -> &'static HabitCatalog {
    &STARTER_CATALOG
}

/// Builds the starter catalog of example habits
///
/// **Note**: For production use, prefer `get_starter_catalog()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_starter_catalog() -> HabitCatalog {
    build_starter_catalog_internal()
}

fn build_starter_catalog_internal() -> HabitCatalog {
    let mut habits = HashMap::new();

    habits.insert(
        "meditation".into(),
        Habit {
            id: "meditation".into(),
            name: "Meditation".into(),
            category: "Mind".into(),
            metric: Metric::Time,
            xp_multiplier: 2.0,
            unit: Some("mins".into()),
            color: Some("#8b5cf6".into()),
            active: true,
        },
    );

    habits.insert(
        "pushups".into(),
        Habit {
            id: "pushups".into(),
            name: "Push-ups".into(),
            category: "Body".into(),
            metric: Metric::Count,
            xp_multiplier: 5.0,
            unit: Some("reps".into()),
            color: Some("#ef4444".into()),
            active: true,
        },
    );

    habits.insert(
        "savings".into(),
        Habit {
            id: "savings".into(),
            name: "Put money aside".into(),
            category: "Wealth".into(),
            metric: Metric::Money,
            xp_multiplier: 1.0,
            unit: Some("$".into()),
            color: Some("#22c55e".into()),
            active: true,
        },
    );

    habits.insert(
        "floss".into(),
        Habit {
            id: "floss".into(),
            name: "Floss".into(),
            category: "Health".into(),
            metric: Metric::Boolean,
            xp_multiplier: 25.0,
            unit: None,
            color: Some("#3b82f6".into()),
            active: true,
        },
    );

    HabitCatalog { habits }
}

impl HabitCatalog {
    /// Load the catalog from a JSON file
    ///
    /// Returns the starter catalog if the file doesn't exist. A corrupted
    /// file logs a warning and also falls back to the starter catalog, so a
    /// bad edit never locks the user out of logging.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No catalog file found, using starter catalog");
            return Ok(get_starter_catalog().clone());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open catalog file {:?}: {}. Using starter catalog.",
                    path,
                    e
                );
                return Ok(get_starter_catalog().clone());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock catalog file {:?}: {}. Using starter catalog.",
                path,
                e
            );
            return Ok(get_starter_catalog().clone());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read catalog file {:?}: {}. Using starter catalog.",
                path,
                e
            );
            return Ok(get_starter_catalog().clone());
        }

        file.unlock()?;

        match serde_json::from_str::<HabitCatalog>(&contents) {
            Ok(catalog) => {
                tracing::debug!("Loaded {} habits from {:?}", catalog.habits.len(), path);
                Ok(catalog)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse catalog file {:?}: {}. Using starter catalog.",
                    path,
                    e
                );
                Ok(get_starter_catalog().clone())
            }
        }
    }

    /// Save the catalog to a JSON file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = tempfile::NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "catalog path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;
        serde_json::to_writer_pretty(temp.as_file(), self)?;
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved catalog to {:?}", path);
        Ok(())
    }

    /// Create or replace a habit definition
    pub fn upsert(&mut self, habit: Habit) -> Result<()> {
        if habit.id.is_empty() {
            return Err(Error::Catalog("habit id must not be empty".into()));
        }
        if habit.name.is_empty() {
            return Err(Error::Catalog(format!("habit '{}' has empty name", habit.id)));
        }
        if !habit.xp_multiplier.is_finite() || habit.xp_multiplier <= 0.0 {
            return Err(Error::Catalog(format!(
                "habit '{}' needs a positive xp multiplier",
                habit.id
            )));
        }
        self.habits.insert(habit.id.clone(), habit);
        Ok(())
    }

    /// Mark a habit inactive; its history and stats are kept
    pub fn archive(&mut self, habit_id: &str) -> Result<()> {
        let habit = self
            .habits
            .get_mut(habit_id)
            .ok_or_else(|| Error::Catalog(format!("unknown habit '{}'", habit_id)))?;
        habit.active = false;
        Ok(())
    }

    /// Reactivate an archived habit
    pub fn restore(&mut self, habit_id: &str) -> Result<()> {
        let habit = self
            .habits
            .get_mut(habit_id)
            .ok_or_else(|| Error::Catalog(format!("unknown habit '{}'", habit_id)))?;
        habit.active = true;
        Ok(())
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, habit) in &self.habits {
            if id.is_empty() || habit.id.is_empty() {
                errors.push("Habit has empty ID".to_string());
            }
            if id != &habit.id {
                errors.push(format!(
                    "Habit key '{}' doesn't match habit.id '{}'",
                    id, habit.id
                ));
            }
            if habit.name.is_empty() {
                errors.push(format!("Habit '{}' has empty name", id));
            }
            if !habit.xp_multiplier.is_finite() || habit.xp_multiplier <= 0.0 {
                errors.push(format!(
                    "Habit '{}' has non-positive xp multiplier {}",
                    id, habit.xp_multiplier
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_catalog_loads() {
        let catalog = build_starter_catalog();
        assert_eq!(catalog.habits.len(), 4);
    }

    #[test]
    fn test_starter_catalog_validates() {
        let errors = build_starter_catalog().validate();
        assert!(
            errors.is_empty(),
            "Starter catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_starter_catalog_covers_all_metrics() {
        let catalog = build_starter_catalog();
        for metric in [Metric::Boolean, Metric::Time, Metric::Money, Metric::Count] {
            assert!(
                catalog.habits.values().any(|h| h.metric == metric),
                "No starter habit with metric {:?}",
                metric
            );
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");

        let mut catalog = build_starter_catalog();
        catalog
            .upsert(Habit {
                id: "reading".into(),
                name: "Read a book".into(),
                category: "Mind".into(),
                metric: Metric::Time,
                xp_multiplier: 3.0,
                unit: Some("mins".into()),
                color: None,
                active: true,
            })
            .unwrap();

        catalog.save(&path).unwrap();
        let loaded = HabitCatalog::load(&path).unwrap();

        assert_eq!(loaded.habits.len(), 5);
        assert!(loaded.habits.contains_key("reading"));
    }

    #[test]
    fn test_load_nonexistent_returns_starter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let catalog = HabitCatalog::load(&temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(catalog.habits.len(), build_starter_catalog().habits.len());
    }

    #[test]
    fn test_corrupted_catalog_falls_back_to_starter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");
        std::fs::write(&path, "{ not json }").unwrap();

        let catalog = HabitCatalog::load(&path).unwrap();
        assert!(!catalog.habits.is_empty());
    }

    #[test]
    fn test_upsert_rejects_bad_multiplier() {
        let mut catalog = HabitCatalog::default();
        let result = catalog.upsert(Habit {
            id: "bad".into(),
            name: "Bad".into(),
            category: String::new(),
            metric: Metric::Count,
            xp_multiplier: 0.0,
            unit: None,
            color: None,
            active: true,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_archive_and_restore() {
        let mut catalog = build_starter_catalog();

        catalog.archive("floss").unwrap();
        assert!(!catalog.habits["floss"].active);
        assert!(catalog.active_habits().iter().all(|h| h.id != "floss"));

        catalog.restore("floss").unwrap();
        assert!(catalog.habits["floss"].active);
    }

    #[test]
    fn test_archive_unknown_habit_fails() {
        let mut catalog = build_starter_catalog();
        assert!(catalog.archive("nope").is_err());
    }

    #[test]
    fn test_validate_flags_key_mismatch() {
        let mut catalog = HabitCatalog::default();
        catalog.habits.insert(
            "one".into(),
            Habit {
                id: "two".into(),
                name: "Mismatch".into(),
                category: String::new(),
                metric: Metric::Count,
                xp_multiplier: 1.0,
                unit: None,
                color: None,
                active: true,
            },
        );

        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("doesn't match"));
    }
}
