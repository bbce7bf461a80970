use super::{LangchainEngine, MlEngine};
use crate::config::EngineConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Engines keyed by lowercase name.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn MlEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `langchain` engine.
    pub fn with_defaults(config: Arc<EngineConfig>) -> Self {
        let mut registry = Self::new();
        registry.register(LangchainEngine::new(config));
        registry
    }

    /// Registers `engine` under its name, replacing any engine with the same name.
    pub fn register(&mut self, engine: impl MlEngine + 'static) {
        self.register_arc(Arc::new(engine));
    }

    pub fn register_arc(&mut self, engine: Arc<dyn MlEngine>) {
        self.engines
            .insert(engine.name().to_ascii_lowercase(), engine);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MlEngine>> {
        self.engines.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_langchain() {
        let registry = EngineRegistry::with_defaults(Arc::new(EngineConfig::default()));
        assert!(registry.get("langchain").is_some());
        assert!(registry.get("LangChain").is_some());
        assert!(registry.get("lightwood").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["langchain"]);
    }
}
