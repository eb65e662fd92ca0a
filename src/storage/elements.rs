//! Element repository for JSON storage
//!
//! Manages loading and saving tracked elements to elements.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{PartLogError, PartLogResult};
use crate::models::{Element, ElementId, Target, TargetType};

use super::file_io::{read_json, write_json_atomic};
use super::ElementLookup;

/// Serializable element data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ElementData {
    elements: Vec<Element>,
}

/// In-memory copy of every element, used to roll back a failed transaction
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot(HashMap<Target, Element>);

/// Repository for element persistence
pub struct ElementRepository {
    path: PathBuf,
    data: RwLock<HashMap<Target, Element>>,
}

impl ElementRepository {
    /// Create a new element repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load elements from disk
    pub fn load(&self) -> PartLogResult<()> {
        let file_data: ElementData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for element in file_data.elements {
            data.insert(element.target, element);
        }

        debug!(path = %self.path.display(), count = data.len(), "loaded elements");
        Ok(())
    }

    /// Save elements to disk
    pub fn save(&self) -> PartLogResult<()> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut elements: Vec<Element> = data.values().cloned().collect();
        elements.sort_by_key(|e| e.target);

        write_json_atomic(&self.path, &ElementData { elements })
    }

    /// Get an element by target
    pub fn get(&self, target: Target) -> PartLogResult<Option<Element>> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&target).cloned())
    }

    /// Get all elements, optionally of one type, ordered by type and id
    pub fn get_all(&self, target_type: Option<TargetType>) -> PartLogResult<Vec<Element>> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut elements: Vec<Element> = data
            .values()
            .filter(|e| target_type.map_or(true, |t| e.target.target_type == t))
            .cloned()
            .collect();
        elements.sort_by_key(|e| e.target);
        Ok(elements)
    }

    /// Insert or update an element
    pub fn upsert(&self, element: Element) -> PartLogResult<()> {
        let mut data = self.data.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(element.target, element);
        Ok(())
    }

    /// Delete an element, returning it if it existed
    pub fn delete(&self, target: Target) -> PartLogResult<Option<Element>> {
        let mut data = self.data.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&target))
    }

    /// Next free id for a type (highest existing id + 1)
    pub fn next_id(&self, target_type: TargetType) -> PartLogResult<ElementId> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let max = data
            .keys()
            .filter(|t| t.target_type == target_type)
            .map(|t| t.id.get())
            .max()
            .unwrap_or(0);
        Ok(ElementId::new(max + 1))
    }

    /// Count elements
    pub fn count(&self) -> PartLogResult<usize> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }

    /// Copy the current in-memory state
    pub fn snapshot(&self) -> PartLogResult<ElementSnapshot> {
        let data = self.data.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(ElementSnapshot(data.clone()))
    }

    /// Replace the in-memory state with a snapshot (does not touch disk)
    pub fn restore(&self, snapshot: ElementSnapshot) -> PartLogResult<()> {
        let mut data = self.data.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        *data = snapshot.0;
        Ok(())
    }
}

impl ElementLookup for ElementRepository {
    fn find(&self, target: Target) -> PartLogResult<Option<Element>> {
        self.get(target)
    }
}
