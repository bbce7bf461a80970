//! The `langchain` engine: prompt templates answered by a chat model.

use super::{push_attribute, CreateArgs, EngineError, MlEngine, ModelArtifact, DESCRIBE_COLUMNS};
use crate::config::EngineConfig;
use crate::provider::models::infer_provider;
use crate::provider::{
    ChatModelFactory, ChatRequest, HttpChatModelFactory, Provider, ProviderEndpoint,
    ProviderError,
};
use crate::redact::redact_options;
use crate::templater::{render_prompt, template_variables, validate_template};
use crate::types::{Bindings, OptionMap, OptionValue, PredictorRecord, ResultSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const LANGCHAIN_ENGINE: &str = "langchain";

const MAX_TEMPERATURE: f64 = 2.0;

/// `USING` keys consumed by the engine itself; shown resolved in `DESCRIBE`.
const SETTING_KEYS: &[&str] = &[
    "engine",
    "provider",
    "model_name",
    "prompt_template",
    "system_prompt",
    "temperature",
    "max_tokens",
    "timeout",
    "base_url",
];

/// Resolved model settings, stored as the predictor's artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangchainSettings {
    pub provider: Provider,
    pub model_name: String,
    pub prompt_template: String,
    pub template_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub base_url: String,
}

impl LangchainSettings {
    fn from_artifact(artifact: Option<&Value>) -> Result<Self, EngineError> {
        let artifact =
            artifact.ok_or_else(|| EngineError::Artifact("model has no artifact".to_string()))?;
        serde_json::from_value(artifact.clone())
            .map_err(|err| EngineError::Artifact(err.to_string()))
    }
}

pub struct LangchainEngine {
    config: Arc<EngineConfig>,
    factory: Arc<dyn ChatModelFactory>,
}

impl LangchainEngine {
    /// An engine calling the provider HTTP APIs.
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self::with_factory(config, Arc::new(HttpChatModelFactory))
    }

    /// An engine whose chat models come from `factory`.
    pub fn with_factory(config: Arc<EngineConfig>, factory: Arc<dyn ChatModelFactory>) -> Self {
        Self { config, factory }
    }

    fn resolve_settings(&self, options: &OptionMap) -> Result<LangchainSettings, EngineError> {
        let prompt_template = string_option(options, "prompt_template")?
            .filter(|t| !t.trim().is_empty())
            .ok_or(EngineError::MissingArgument("prompt_template"))?;
        validate_template(&prompt_template)?;

        let provider = string_option(options, "provider")?
            .map(|name| {
                name.parse::<Provider>()
                    .map_err(|err| EngineError::invalid("provider", err.to_string()))
            })
            .transpose()?;
        let model_name = string_option(options, "model_name")?.filter(|m| !m.trim().is_empty());

        let (provider, model_name) = match (provider, model_name) {
            (Some(provider), Some(model)) => (provider, model),
            (Some(provider), None) => {
                let model = if infer_provider(&self.config.default_model) == provider {
                    self.config.default_model.clone()
                } else {
                    provider.default_model().to_string()
                };
                (provider, model)
            }
            (None, Some(model)) => (infer_provider(&model), model),
            (None, None) => (
                infer_provider(&self.config.default_model),
                self.config.default_model.clone(),
            ),
        };

        let temperature = match number_option(options, "temperature")? {
            Some(t) if !(0.0..=MAX_TEMPERATURE).contains(&t) => {
                return Err(EngineError::invalid(
                    "temperature",
                    format!("must be between 0 and {MAX_TEMPERATURE}"),
                ));
            }
            Some(t) => t,
            None => self.config.default_temperature,
        };

        let max_tokens = match number_option(options, "max_tokens")? {
            Some(n) => Some(positive_integer("max_tokens", n)?),
            None => self.config.default_max_tokens,
        };

        let timeout_secs = match number_option(options, "timeout")? {
            Some(n) => u64::from(positive_integer("timeout", n)?),
            None => self.config.request_timeout_secs,
        };

        let base_url = match string_option(options, "base_url")? {
            Some(url) => crate::provider::normalize_base_url(&url),
            None => self.config.base_url(provider),
        };

        Ok(LangchainSettings {
            provider,
            model_name,
            template_variables: template_variables(&prompt_template),
            prompt_template,
            system_prompt: string_option(options, "system_prompt")?,
            temperature,
            max_tokens,
            timeout_secs,
            base_url,
        })
    }

    /// `<provider>_api_key` or `api_key` from `USING`, then config and environment.
    fn api_key(&self, provider: Provider, options: &OptionMap) -> Option<String> {
        [provider.api_key_option(), "api_key"]
            .iter()
            .filter_map(|key| options.get(*key).and_then(OptionValue::as_str))
            .find(|key| !key.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.config.api_key(provider))
    }
}

impl MlEngine for LangchainEngine {
    fn name(&self) -> &str {
        LANGCHAIN_ENGINE
    }

    fn create(&self, args: &CreateArgs) -> Result<ModelArtifact, EngineError> {
        let settings = self.resolve_settings(&args.options)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            model = %format!("{}.{}", args.project, args.name),
            provider = %settings.provider,
            model_name = %settings.model_name,
            "Resolved langchain settings"
        );

        serde_json::to_value(&settings).map_err(|err| EngineError::Artifact(err.to_string()))
    }

    fn predict(
        &self,
        record: &PredictorRecord,
        bindings: &Bindings,
    ) -> Result<ResultSet, EngineError> {
        let settings = LangchainSettings::from_artifact(record.artifact.as_ref())?;

        let values: BTreeMap<String, Value> = bindings
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        let prompt = render_prompt(&settings.prompt_template, &values)?;

        let provider = settings.provider;
        let mut endpoint = ProviderEndpoint::new(
            provider,
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
        );
        match self.api_key(provider, &record.options) {
            Some(key) => endpoint = endpoint.with_api_key(key),
            None if provider.requires_api_key() => {
                return Err(ProviderError::MissingApiKey {
                    provider,
                    option: provider.api_key_option(),
                    env: provider.api_key_env(),
                }
                .into());
            }
            None => {}
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            model = %record.qualified_name(),
            provider = %provider,
            model_name = %settings.model_name,
            prompt_chars = prompt.len(),
            "Sending prompt"
        );

        let chat = self.factory.connect(&endpoint)?;
        let answer = chat.complete(&ChatRequest {
            model: settings.model_name.clone(),
            prompt,
            system: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })?;

        let inputs: Vec<(&String, &Value)> = values
            .iter()
            .filter(|(key, _)| !key.eq_ignore_ascii_case(&record.target))
            .collect();

        let mut result = ResultSet::new(
            std::iter::once(record.target.clone()).chain(inputs.iter().map(|(k, _)| (*k).clone())),
        );
        result.push_row(
            std::iter::once(Value::String(answer))
                .chain(inputs.into_iter().map(|(_, v)| v.clone()))
                .collect(),
        );
        Ok(result)
    }

    fn describe(&self, record: &PredictorRecord) -> ResultSet {
        let mut table = ResultSet::new(DESCRIBE_COLUMNS);

        if let Ok(settings) = LangchainSettings::from_artifact(record.artifact.as_ref()) {
            push_attribute(&mut table, "provider", settings.provider.as_str());
            push_attribute(&mut table, "model_name", settings.model_name);
            push_attribute(&mut table, "prompt_template", settings.prompt_template);
            push_attribute(
                &mut table,
                "template_variables",
                settings.template_variables.join(", "),
            );
            if let Some(system_prompt) = settings.system_prompt {
                push_attribute(&mut table, "system_prompt", system_prompt);
            }
            push_attribute(&mut table, "temperature", settings.temperature);
            push_attribute(&mut table, "max_tokens", settings.max_tokens);
            push_attribute(&mut table, "timeout", settings.timeout_secs);
            push_attribute(&mut table, "base_url", settings.base_url);
        } else if let Some(template) = record
            .options
            .get("prompt_template")
            .and_then(OptionValue::as_str)
        {
            push_attribute(&mut table, "prompt_template", template);
            push_attribute(
                &mut table,
                "template_variables",
                template_variables(template).join(", "),
            );
        }

        for (key, value) in redact_options(&record.options) {
            if !SETTING_KEYS.contains(&key.as_str()) {
                push_attribute(&mut table, &key, value.to_json());
            }
        }
        table
    }
}

fn string_option(options: &OptionMap, key: &'static str) -> Result<Option<String>, EngineError> {
    match options.get(key) {
        None | Some(OptionValue::Null) => Ok(None),
        Some(OptionValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(EngineError::invalid(
            key,
            format!("expected a string, got {other}"),
        )),
    }
}

fn number_option(options: &OptionMap, key: &'static str) -> Result<Option<f64>, EngineError> {
    match options.get(key) {
        None | Some(OptionValue::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| EngineError::invalid(key, format!("expected a number, got {value}"))),
    }
}

fn positive_integer(key: &'static str, value: f64) -> Result<u32, EngineError> {
    if value.fract() != 0.0 || value < 1.0 || value > f64::from(u32::MAX) {
        return Err(EngineError::invalid(key, "must be a positive integer"));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatModel;
    use std::sync::Mutex;

    /// Records requests and answers with the prompt.
    #[derive(Default)]
    struct EchoFactory {
        endpoints: Mutex<Vec<ProviderEndpoint>>,
    }

    struct Echo;

    impl ChatModel for Echo {
        fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
            Ok(format!("[{}] {}", request.model, request.prompt))
        }
    }

    impl ChatModelFactory for EchoFactory {
        fn connect(
            &self,
            endpoint: &ProviderEndpoint,
        ) -> Result<Box<dyn ChatModel>, ProviderError> {
            self.endpoints.lock().unwrap().push(endpoint.clone());
            Ok(Box::new(Echo))
        }
    }

    fn options(pairs: &[(&str, OptionValue)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> OptionValue {
        OptionValue::String(s.to_string())
    }

    fn engine() -> (LangchainEngine, Arc<EchoFactory>) {
        let factory = Arc::new(EchoFactory::default());
        let engine = LangchainEngine::with_factory(Arc::new(EngineConfig::default()), factory.clone());
        (engine, factory)
    }

    fn trained(engine: &LangchainEngine, opts: OptionMap) -> PredictorRecord {
        let args = CreateArgs {
            project: "proj".into(),
            name: "m".into(),
            target: "answer".into(),
            options: opts.clone(),
        };
        let artifact = engine.create(&args).unwrap();
        let mut record = PredictorRecord::new("proj", "m", LANGCHAIN_ENGINE, "answer", opts);
        record.artifact = Some(artifact);
        record
    }

    fn settings(engine: &LangchainEngine, opts: OptionMap) -> LangchainSettings {
        engine.resolve_settings(&opts).unwrap()
    }

    #[test]
    fn defaults_to_configured_model() {
        let (engine, _) = engine();
        let s = settings(&engine, options(&[("prompt_template", text("{{question}}"))]));
        assert_eq!(s.provider, Provider::OpenAi);
        assert_eq!(s.model_name, "gpt-4o");
        assert_eq!(s.temperature, 0.0);
        assert_eq!(s.max_tokens, None);
        assert_eq!(s.timeout_secs, 300);
        assert_eq!(s.template_variables, vec!["question"]);
    }

    #[test]
    fn infers_provider_from_model_name() {
        let (engine, _) = engine();
        let s = settings(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("model_name", text("claude-2.1")),
            ]),
        );
        assert_eq!(s.provider, Provider::Anthropic);
        assert!(s.base_url.starts_with("http"));
    }

    #[test]
    fn explicit_provider_wins() {
        let (engine, _) = engine();
        let s = settings(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("google")),
                ("model_name", text("gemini-1.5-pro")),
            ]),
        );
        assert_eq!(s.provider, Provider::Google);

        let s = settings(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("ollama")),
            ]),
        );
        assert_eq!(s.model_name, Provider::Ollama.default_model());
    }

    #[test]
    fn rejects_bad_arguments() {
        let (engine, _) = engine();

        let err = engine.resolve_settings(&OptionMap::new()).unwrap_err();
        assert!(matches!(err, EngineError::MissingArgument("prompt_template")));

        let err = engine
            .resolve_settings(&options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("bedrock")),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("provider"));

        let err = engine
            .resolve_settings(&options(&[
                ("prompt_template", text("{{question}}")),
                ("temperature", OptionValue::Number(3.5)),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));

        let err = engine
            .resolve_settings(&options(&[
                ("prompt_template", text("{{question}}")),
                ("max_tokens", OptionValue::Number(0.0)),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("max_tokens"));

        let err = engine
            .resolve_settings(&options(&[("prompt_template", text("{% if %}"))]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Template(_)));
    }

    #[test]
    fn predict_renders_prompt_and_echoes_inputs() {
        let (engine, factory) = engine();
        let record = trained(
            &engine,
            options(&[
                ("prompt_template", text("Your name is {{name}}. {{question}}")),
                ("openai_api_key", text("sk-test")),
            ]),
        );

        let mut bindings = Bindings::new();
        bindings.insert("question".into(), text("Who are you?"));
        bindings.insert("name".into(), text("professor farnsworth"));

        let result = engine.predict(&record, &bindings).unwrap();
        assert_eq!(result.columns, vec!["answer", "name", "question"]);
        assert_eq!(
            result.first_text("answer"),
            Some("[gpt-4o] Your name is professor farnsworth. Who are you?")
        );

        let endpoints = factory.endpoints.lock().unwrap();
        assert_eq!(endpoints[0].api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn predict_requires_every_binding() {
        let (engine, _) = engine();
        let record = trained(
            &engine,
            options(&[
                ("prompt_template", text("{{name}}: {{question}}")),
                ("openai_api_key", text("sk-test")),
            ]),
        );
        let mut bindings = Bindings::new();
        bindings.insert("question".into(), text("hi"));

        let err = engine.predict(&record, &bindings).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let (engine, _) = engine();
        let record = trained(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("model_name", text("mistral")),
            ]),
        );
        let mut bindings = Bindings::new();
        bindings.insert("question".into(), text("hi"));

        let result = engine.predict(&record, &bindings).unwrap();
        assert_eq!(result.first_text("answer"), Some("[mistral] hi"));
    }

    #[test]
    fn openai_compatible_providers() {
        let (engine, factory) = engine();
        let record = trained(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("vllm")),
                ("model_name", text("mistralai/Mistral-7B-Instruct-v0.3")),
            ]),
        );
        let mut bindings = Bindings::new();
        bindings.insert("question".into(), text("hi"));

        let result = engine.predict(&record, &bindings).unwrap();
        assert_eq!(
            result.first_text("answer"),
            Some("[mistralai/Mistral-7B-Instruct-v0.3] hi")
        );
        {
            let endpoints = factory.endpoints.lock().unwrap();
            assert_eq!(endpoints[0].provider, Provider::Vllm);
            assert_eq!(endpoints[0].base_url, "http://127.0.0.1:8000/v1");
        }

        let s = settings(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("model_name", text("meta/llama-3_1-8b-instruct")),
            ]),
        );
        assert_eq!(s.provider, Provider::NvidiaNim);

        let s = settings(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("writer")),
            ]),
        );
        assert_eq!(s.model_name, "palmyra-x5");
        assert_eq!(s.base_url, "https://api.writer.com/v1");
    }

    #[test]
    fn writer_key_comes_from_its_own_option() {
        let (engine, factory) = engine();
        let record = trained(
            &engine,
            options(&[
                ("prompt_template", text("{{question}}")),
                ("provider", text("writer")),
                ("writer_api_key", text("wr-test")),
            ]),
        );
        let mut bindings = Bindings::new();
        bindings.insert("question".into(), text("hi"));

        engine.predict(&record, &bindings).unwrap();
        let endpoints = factory.endpoints.lock().unwrap();
        assert_eq!(endpoints[0].api_key.as_deref(), Some("wr-test"));
    }

    #[test]
    fn describe_hides_secrets() {
        let (engine, _) = engine();
        let record = trained(
            &engine,
            options(&[
                ("engine", text("langchain")),
                ("prompt_template", text("{{question}}")),
                ("anthropic_api_key", text("sk-ant-secret")),
                ("model_name", text("claude-2.1")),
            ]),
        );

        let table = engine.describe(&record);
        assert_eq!(table.columns, vec!["attribute", "value"]);
        let rendered = serde_json::to_string(&table).unwrap();
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("anthropic"));
        assert!(rendered.contains("claude-2.1"));
    }
}
