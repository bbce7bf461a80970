//! Statement execution.
//!
//! The [`Executor`] owns the project catalog and the engine registry. Model
//! creation registers a predictor in the `generating` state and trains it on a
//! background thread; callers block on [`Executor::wait_predictor`] before
//! querying it.

mod catalog;
mod error;

pub use error::ExecutorError;

use crate::config::EngineConfig;
use crate::engine::{
    push_attribute, CreateArgs, EngineRegistry, MlEngine, DESCRIBE_COLUMNS, LANGCHAIN_ENGINE,
};
use crate::parser::parse_statements;
use crate::types::{
    CreateModel, ModelQuery, ObjectName, PredictorRecord, PredictorStatus, Projection, ResultSet,
    Statement,
};
use catalog::{Catalog, SharedCatalog};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Columns of `CREATE MODEL` results.
const CREATE_MODEL_COLUMNS: [&str; 5] = ["name", "project", "engine", "status", "predict"];

/// Columns of `SHOW MODELS` results.
const SHOW_MODELS_COLUMNS: [&str; 6] = ["name", "project", "engine", "status", "predict", "error"];

pub struct Executor {
    config: Arc<EngineConfig>,
    engines: EngineRegistry,
    catalog: SharedCatalog,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Executor {
    /// An executor with the built-in engines.
    pub fn new(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let engines = EngineRegistry::with_defaults(config.clone());
        Self::with_engines(config, engines)
    }

    pub fn with_engines(config: Arc<EngineConfig>, engines: EngineRegistry) -> Self {
        let catalog = SharedCatalog::new(Catalog::new(&config.default_project));
        Self {
            config,
            engines,
            catalog,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses and executes every statement in `sql`, returning the last result.
    ///
    /// Execution stops at the first failing statement. An input without
    /// statements yields an empty result.
    pub fn run_sql(&self, sql: &str) -> Result<ResultSet, ExecutorError> {
        #[cfg(feature = "tracing")]
        debug!(sql = %crate::redact::redact_sql(sql), "Running SQL");

        let statements = parse_statements(sql)?;
        let mut last = ResultSet::default();
        for statement in &statements {
            last = self.execute(statement)?;
        }
        Ok(last)
    }

    pub fn execute(&self, statement: &Statement) -> Result<ResultSet, ExecutorError> {
        #[cfg(feature = "tracing")]
        debug!(kind = statement.kind(), "Executing statement");

        match statement {
            Statement::CreateProject {
                name,
                if_not_exists,
            } => self.create_project(name, *if_not_exists),
            Statement::DropProject { name, if_exists } => self.drop_project(name, *if_exists),
            Statement::CreateModel(create) => self.create_model(create),
            Statement::DropModel { name, if_exists } => self.drop_model(name, *if_exists),
            Statement::Select(query) => self.select(query),
            Statement::Describe { name } => self.describe(name),
            Statement::ShowModels { project } => self.show_models(project.as_deref()),
            Statement::ShowDatabases => Ok(self.show_databases()),
        }
    }

    /// A snapshot of a predictor.
    pub fn predictor(&self, project: &str, name: &str) -> Option<PredictorRecord> {
        self.catalog
            .read()
            .model(project, name)
            .map(|entry| entry.record.clone())
    }

    /// Blocks until the predictor leaves the `generating`/`training` states.
    ///
    /// `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// - `ModelNotFound` - No such model (or it was dropped while waiting)
    /// - `TrainingFailed` - Training ended in the `error` state
    /// - `WaitTimeout` - `timeout` elapsed first
    pub fn wait_predictor(
        &self,
        project: &str,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<PredictorRecord, ExecutorError> {
        let started = Instant::now();
        let interval = self.config.poll_interval();

        loop {
            let record = self
                .predictor(project, name)
                .ok_or_else(|| ExecutorError::ModelNotFound(format!("{project}.{name}")))?;

            match record.status {
                PredictorStatus::Complete => return Ok(record),
                PredictorStatus::Error => {
                    return Err(ExecutorError::TrainingFailed {
                        name: record.qualified_name(),
                        message: record.error.unwrap_or_default(),
                    });
                }
                PredictorStatus::Generating | PredictorStatus::Training => {}
            }

            let waited = started.elapsed();
            if let Some(timeout) = timeout {
                if waited >= timeout {
                    return Err(ExecutorError::WaitTimeout {
                        name: record.qualified_name(),
                        waited,
                        status: record.status,
                    });
                }
            }
            thread::sleep(interval);
        }
    }

    fn project_of<'a>(&'a self, name: &'a ObjectName) -> &'a str {
        name.project_or(&self.config.default_project)
    }

    fn engine(&self, name: &str) -> Result<Arc<dyn MlEngine>, ExecutorError> {
        self.engines
            .get(name)
            .ok_or_else(|| ExecutorError::UnknownEngine(name.to_string()))
    }

    fn require_project(&self, project: &str) -> Result<(), ExecutorError> {
        if self.catalog.read().project(project).is_none() {
            return Err(ExecutorError::ProjectNotFound(project.to_string()));
        }
        Ok(())
    }

    fn create_project(&self, name: &str, if_not_exists: bool) -> Result<ResultSet, ExecutorError> {
        if !self.catalog.write().create_project(name) && !if_not_exists {
            return Err(ExecutorError::ProjectExists(name.to_string()));
        }
        Ok(ResultSet::default())
    }

    fn drop_project(&self, name: &str, if_exists: bool) -> Result<ResultSet, ExecutorError> {
        let mut catalog = self.catalog.write();
        if catalog.is_default(name) {
            return Err(ExecutorError::ProtectedProject(name.to_string()));
        }
        if catalog.drop_project(name).is_none() && !if_exists {
            return Err(ExecutorError::ProjectNotFound(name.to_string()));
        }
        Ok(ResultSet::default())
    }

    fn create_model(&self, create: &CreateModel) -> Result<ResultSet, ExecutorError> {
        let project = self.project_of(&create.name);
        let engine_name = create
            .engine()
            .unwrap_or(LANGCHAIN_ENGINE)
            .to_ascii_lowercase();
        let engine = self.engine(&engine_name)?;

        let (record, generation) = {
            let mut catalog = self.catalog.write();
            let project = catalog
                .project(project)
                .map(|p| p.name.clone())
                .ok_or_else(|| ExecutorError::ProjectNotFound(project.to_string()))?;

            if let Some(existing) = catalog.model(&project, &create.name.name) {
                if create.if_not_exists {
                    return Ok(model_status(&existing.record));
                }
                if !create.or_replace {
                    return Err(ExecutorError::ModelExists(existing.record.qualified_name()));
                }
            }

            let record = PredictorRecord::new(
                project.clone(),
                create.name.name.clone(),
                engine_name,
                create.target.clone(),
                create.options.clone(),
            );
            let generation = catalog
                .insert_model(record.clone())
                .ok_or(ExecutorError::ProjectNotFound(project))?;
            (record, generation)
        };

        #[cfg(feature = "tracing")]
        info!(
            model = %record.qualified_name(),
            engine = %record.engine,
            options = ?crate::redact::redact_options(&record.options),
            "Model registered"
        );

        self.spawn_training(engine, &record, generation)?;
        Ok(model_status(&record))
    }

    fn spawn_training(
        &self,
        engine: Arc<dyn MlEngine>,
        record: &PredictorRecord,
        generation: u64,
    ) -> Result<(), ExecutorError> {
        let catalog = self.catalog.clone();
        let args = CreateArgs {
            project: record.project.clone(),
            name: record.name.clone(),
            target: record.target.clone(),
            options: record.options.clone(),
        };

        let spawned = thread::Builder::new()
            .name(format!("train-{}", record.qualified_name()))
            .spawn(move || train(catalog, engine, args, generation));

        if let Err(err) = spawned {
            let message = err.to_string();
            self.catalog
                .write()
                .update_model(&record.project, &record.name, generation, |r| {
                    r.error = Some(message);
                    r.set_status(PredictorStatus::Error);
                });
            return Err(ExecutorError::Spawn(err));
        }
        Ok(())
    }

    fn drop_model(&self, name: &ObjectName, if_exists: bool) -> Result<ResultSet, ExecutorError> {
        let project = self.project_of(name);
        let removed = self.catalog.write().remove_model(project, &name.name);
        if removed.is_none() && !if_exists {
            return Err(ExecutorError::ModelNotFound(format!("{project}.{}", name.name)));
        }
        Ok(ResultSet::default())
    }

    fn find_model(&self, name: &ObjectName) -> Result<PredictorRecord, ExecutorError> {
        let project = self.project_of(name);
        self.require_project(project)?;
        self.predictor(project, &name.name)
            .ok_or_else(|| ExecutorError::ModelNotFound(format!("{project}.{}", name.name)))
    }

    fn select(&self, query: &ModelQuery) -> Result<ResultSet, ExecutorError> {
        let record = self.find_model(&query.model)?;
        if record.status != PredictorStatus::Complete {
            return Err(ExecutorError::ModelNotReady {
                name: record.qualified_name(),
                status: record.status,
            });
        }

        let engine = self.engine(&record.engine)?;
        let result = engine.predict(&record, &query.bindings)?;

        match &query.projection {
            Projection::Wildcard => Ok(result),
            Projection::Columns(columns) => {
                result
                    .project(columns)
                    .map_err(|column| ExecutorError::UnknownColumn {
                        column,
                        model: record.qualified_name(),
                    })
            }
        }
    }

    fn describe(&self, name: &ObjectName) -> Result<ResultSet, ExecutorError> {
        let record = self.find_model(name)?;

        let mut table = ResultSet::new(DESCRIBE_COLUMNS);
        push_attribute(&mut table, "name", record.name.clone());
        push_attribute(&mut table, "project", record.project.clone());
        push_attribute(&mut table, "engine", record.engine.clone());
        push_attribute(&mut table, "target", record.target.clone());
        push_attribute(&mut table, "status", record.status.as_str());
        push_attribute(&mut table, "error", record.error.clone());
        push_attribute(&mut table, "created_at", record.created_at.to_rfc3339());
        push_attribute(
            &mut table,
            "training_finished_at",
            record.training_finished_at.map(|t| t.to_rfc3339()),
        );

        if let Some(engine) = self.engines.get(&record.engine) {
            table.rows.extend(engine.describe(&record).rows);
        }
        Ok(table)
    }

    fn show_models(&self, project: Option<&str>) -> Result<ResultSet, ExecutorError> {
        let catalog = self.catalog.read();
        let projects: Vec<_> = match project {
            Some(name) => vec![catalog
                .project(name)
                .ok_or_else(|| ExecutorError::ProjectNotFound(name.to_string()))?],
            None => catalog.projects().collect(),
        };

        let mut table = ResultSet::new(SHOW_MODELS_COLUMNS);
        for entry in projects.into_iter().flat_map(|p| p.models()) {
            let record = &entry.record;
            table.push_row(vec![
                record.name.clone().into(),
                record.project.clone().into(),
                record.engine.clone().into(),
                record.status.as_str().into(),
                record.target.clone().into(),
                record.error.clone().into(),
            ]);
        }
        Ok(table)
    }

    fn show_databases(&self) -> ResultSet {
        let mut table = ResultSet::new(["database"]);
        for project in self.catalog.read().projects() {
            table.push_row(vec![project.name.clone().into()]);
        }
        table
    }
}

fn model_status(record: &PredictorRecord) -> ResultSet {
    let mut table = ResultSet::new(CREATE_MODEL_COLUMNS);
    table.push_row(vec![
        record.name.clone().into(),
        record.project.clone().into(),
        record.engine.clone().into(),
        record.status.as_str().into(),
        record.target.clone().into(),
    ]);
    table
}

/// Body of a training thread.
fn train(catalog: SharedCatalog, engine: Arc<dyn MlEngine>, args: CreateArgs, generation: u64) {
    let started = catalog
        .write()
        .update_model(&args.project, &args.name, generation, |r| {
            r.set_status(PredictorStatus::Training)
        });
    if !started {
        return;
    }

    let outcome = engine.create(&args);

    #[cfg(feature = "tracing")]
    match &outcome {
        Ok(_) => info!(model = %format!("{}.{}", args.project, args.name), "Training complete"),
        Err(err) => warn!(
            model = %format!("{}.{}", args.project, args.name),
            error = %err,
            "Training failed"
        ),
    }

    catalog
        .write()
        .update_model(&args.project, &args.name, generation, |r| match outcome {
            Ok(artifact) => {
                r.artifact = Some(artifact);
                r.set_status(PredictorStatus::Complete);
            }
            Err(err) => {
                r.error = Some(err.to_string());
                r.set_status(PredictorStatus::Error);
            }
        });
}
