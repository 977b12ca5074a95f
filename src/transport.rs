/// [crate::transport] moves [crate::project::Project] snapshots across the
/// process boundary: JSON (de)serialization with shape validation for
/// import/export, export filename derivation, and the durable-storage seam
/// used to mirror every committed snapshot.
use std::{
    fs::{read_to_string, remove_file, write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::SkripsiError, project::Project, properties::slugify};

/// The single well-known key under which the active project is persisted.
pub const STORAGE_KEY: &str = "academicProject";

/// Prefix for exported project filenames.
pub const EXPORT_PREFIX: &str = "proyek-akademik";

/// Fallback slug when a title contains no alphanumeric characters at all.
pub const FALLBACK_EXPORT_SLUG: &str = "tanpa-judul";

/// Serialize a project to its transportable pretty-printed JSON form.
pub fn serialize_project(project: &Project) -> Result<String, SkripsiError> {
    Ok(serde_json::to_string_pretty(project)?)
}

/// Parse and validate an imported payload.
///
/// The payload must at minimum carry a non-empty `title` plus `authorInfo`,
/// `outline` and `chapters`; anything less is a hard validation error and no
/// partial project is produced. Missing optional fields are then defaulted by
/// the serde contract on [Project] (see its docs), which is idempotent.
pub fn deserialize_project(text: &str) -> Result<Project, SkripsiError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        SkripsiError::Validation(format!("File is not valid JSON: {e}"))
    })?;
    validate_shape(&value)?;
    serde_json::from_value(value).map_err(|e| {
        SkripsiError::Validation(format!("File does not match the project structure: {e}"))
    })
}

fn validate_shape(value: &Value) -> Result<(), SkripsiError> {
    let object = value.as_object().ok_or_else(|| {
        SkripsiError::Validation("Project payload must be a JSON object".to_string())
    })?;
    let title_ok = object
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if !title_ok {
        return Err(SkripsiError::Validation(
            "Project payload is missing a non-empty 'title'".to_string(),
        ));
    }
    for field in ["authorInfo", "outline", "chapters"] {
        if !object.get(field).is_some_and(Value::is_object) {
            return Err(SkripsiError::Validation(format!(
                "Project payload is missing the '{field}' structure"
            )));
        }
    }
    Ok(())
}

/// Derive the export filename from the project title:
/// `proyek-akademik-<slug>.json`, where the slug is the lowercased title with
/// non-alphanumeric runs collapsed to hyphens, or `tanpa-judul` when nothing
/// survives.
pub fn export_file_name(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{EXPORT_PREFIX}-{FALLBACK_EXPORT_SLUG}.json")
    } else {
        format!("{EXPORT_PREFIX}-{slug}.json")
    }
}

/// Durable storage for the active project. One writer, one reader, whole
/// snapshots only: `save` fully overwrites and `load` reads once at startup.
pub trait ProjectStore: Send + Sync {
    /// Load the stored project, if any. An unreadable or invalid stored
    /// payload is not an error: the caller starts fresh.
    fn load(&self) -> Result<Option<Project>, SkripsiError>;
    fn save(&self, project: &Project) -> Result<(), SkripsiError>;
    fn clear(&self) -> Result<(), SkripsiError>;
}

/// File-backed store keeping the project under `<dir>/academicProject.json`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        JsonFileStore {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&self) -> Result<Option<Project>, SkripsiError> {
        if !self.path.exists() {
            debug!("no stored project at {:?}", self.path);
            return Ok(None);
        }
        let text = read_to_string(&self.path)?;
        match deserialize_project(&text) {
            Ok(project) => Ok(Some(project)),
            Err(err) => {
                warn!("discarding invalid stored project, starting fresh: {err}");
                Ok(None)
            }
        }
    }

    fn save(&self, project: &Project) -> Result<(), SkripsiError> {
        debug!("mirroring project snapshot to {:?}", self.path);
        Ok(write(&self.path, serialize_project(project)?)?)
    }

    fn clear(&self) -> Result<(), SkripsiError> {
        if self.path.exists() {
            remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store mirroring browser local-storage semantics: a single
/// serialized value under one key. Useful for hosts without a filesystem and
/// for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl ProjectStore for MemoryStore {
    fn load(&self) -> Result<Option<Project>, SkripsiError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| SkripsiError::Io(format!("storage lock poisoned: {e}")))?;
        match slot.as_deref() {
            None => Ok(None),
            Some(text) => match deserialize_project(text) {
                Ok(project) => Ok(Some(project)),
                Err(err) => {
                    warn!("discarding invalid stored project, starting fresh: {err}");
                    Ok(None)
                }
            },
        }
    }

    fn save(&self, project: &Project) -> Result<(), SkripsiError> {
        let text = serialize_project(project)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| SkripsiError::Io(format!("storage lock poisoned: {e}")))?;
        *slot = Some(text);
        Ok(())
    }

    fn clear(&self) -> Result<(), SkripsiError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| SkripsiError::Io(format!("storage lock poisoned: {e}")))?;
        *slot = None;
        Ok(())
    }
}
