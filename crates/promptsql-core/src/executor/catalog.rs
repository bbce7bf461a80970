//! In-memory projects and predictors.

use crate::types::PredictorRecord;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A predictor plus the generation it was registered under.
///
/// Every insert gets a fresh generation, so a training thread started for a
/// model that was later dropped or replaced cannot overwrite its successor.
#[derive(Debug, Clone)]
pub(crate) struct ModelEntry {
    pub record: PredictorRecord,
    pub generation: u64,
}

#[derive(Debug)]
pub(crate) struct Project {
    /// Name as first written by the user.
    pub name: String,
    models: BTreeMap<String, ModelEntry>,
}

impl Project {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            models: BTreeMap::new(),
        }
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }
}

/// Projects keyed by lowercase name; model names are case-insensitive too.
#[derive(Debug)]
pub(crate) struct Catalog {
    projects: BTreeMap<String, Project>,
    default_project: String,
    next_generation: u64,
}

impl Catalog {
    pub fn new(default_project: &str) -> Self {
        let mut projects = BTreeMap::new();
        projects.insert(key(default_project), Project::new(default_project));
        Self {
            projects,
            default_project: key(default_project),
            next_generation: 0,
        }
    }

    pub fn is_default(&self, project: &str) -> bool {
        key(project) == self.default_project
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(&key(name))
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Returns false when the project already existed.
    pub fn create_project(&mut self, name: &str) -> bool {
        let k = key(name);
        if self.projects.contains_key(&k) {
            return false;
        }
        self.projects.insert(k, Project::new(name));
        true
    }

    /// Removes the project with all of its models.
    pub fn drop_project(&mut self, name: &str) -> Option<Project> {
        self.projects.remove(&key(name))
    }

    pub fn model(&self, project: &str, name: &str) -> Option<&ModelEntry> {
        self.project(project)?.models.get(&key(name))
    }

    /// Stores `record` under a new generation, replacing any model with the same name.
    ///
    /// Returns `None` when the record's project does not exist.
    pub fn insert_model(&mut self, record: PredictorRecord) -> Option<u64> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let project = self.projects.get_mut(&key(&record.project))?;
        project
            .models
            .insert(key(&record.name), ModelEntry { record, generation });
        Some(generation)
    }

    pub fn remove_model(&mut self, project: &str, name: &str) -> Option<ModelEntry> {
        self.projects.get_mut(&key(project))?.models.remove(&key(name))
    }

    /// Applies `update` if the model still exists under `generation`.
    pub fn update_model(
        &mut self,
        project: &str,
        name: &str,
        generation: u64,
        update: impl FnOnce(&mut PredictorRecord),
    ) -> bool {
        let entry = self
            .projects
            .get_mut(&key(project))
            .and_then(|p| p.models.get_mut(&key(name)));
        match entry {
            Some(entry) if entry.generation == generation => {
                update(&mut entry.record);
                true
            }
            _ => false,
        }
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Catalog shared between the executor and training threads. Lock poisoning is ignored.
#[derive(Debug, Clone)]
pub(crate) struct SharedCatalog(Arc<RwLock<Catalog>>);

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self(Arc::new(RwLock::new(catalog)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OptionMap, PredictorStatus};

    fn record(project: &str, name: &str) -> PredictorRecord {
        PredictorRecord::new(project, name, "langchain", "answer", OptionMap::new())
    }

    #[test]
    fn default_project_exists() {
        let catalog = Catalog::new("mindsdb");
        assert!(catalog.project("MindsDB").is_some());
        assert!(catalog.is_default("MINDSDB"));
    }

    #[test]
    fn projects_are_case_insensitive() {
        let mut catalog = Catalog::new("mindsdb");
        assert!(catalog.create_project("Proj"));
        assert!(!catalog.create_project("proj"));
        assert_eq!(catalog.project("PROJ").unwrap().name, "Proj");
    }

    #[test]
    fn insert_requires_project() {
        let mut catalog = Catalog::new("mindsdb");
        assert!(catalog.insert_model(record("missing", "m")).is_none());
        assert!(catalog.insert_model(record("mindsdb", "m")).is_some());
        assert!(catalog.model("mindsdb", "M").is_some());
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut catalog = Catalog::new("mindsdb");
        let first = catalog.insert_model(record("mindsdb", "m")).unwrap();
        let second = catalog.insert_model(record("mindsdb", "m")).unwrap();
        assert_ne!(first, second);

        let applied = catalog.update_model("mindsdb", "m", first, |r| {
            r.set_status(PredictorStatus::Complete)
        });
        assert!(!applied);
        assert_eq!(
            catalog.model("mindsdb", "m").unwrap().record.status,
            PredictorStatus::Generating
        );

        assert!(catalog.update_model("mindsdb", "m", second, |r| {
            r.set_status(PredictorStatus::Training)
        }));
    }

    #[test]
    fn dropping_project_removes_models() {
        let mut catalog = Catalog::new("mindsdb");
        catalog.create_project("proj");
        catalog.insert_model(record("proj", "m")).unwrap();
        let dropped = catalog.drop_project("proj").unwrap();
        assert_eq!(dropped.models().count(), 1);
        assert!(catalog.model("proj", "m").is_none());
    }
}
