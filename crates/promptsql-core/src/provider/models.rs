//! Known chat model names per provider, used to infer the provider from `model_name`.

use super::Provider;

pub const OPENAI_CHAT_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-16k",
    "gpt-3.5-turbo-instruct",
    "gpt-4",
    "gpt-4-32k",
    "gpt-4-1106-preview",
    "gpt-4-0125-preview",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4o",
    "o4-mini",
    "o3-mini",
    "o1-mini",
];

pub const ANTHROPIC_CHAT_MODELS: &[&str] = &[
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
    "claude-2.1",
    "claude-2.0",
    "claude-instant-1.2",
];

pub const GOOGLE_GEMINI_CHAT_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
];

pub const OLLAMA_CHAT_MODELS: &[&str] = &[
    "gemma",
    "llama2",
    "llama3",
    "mistral",
    "mixtral",
    "llava",
    "neural-chat",
    "codellama",
    "dolphin-mixtral",
    "qwen",
    "llama2-uncensored",
    "mistral-openorca",
    "deepseek-coder",
    "nous-hermes2",
    "phi",
    "orca-mini",
    "dolphin-mistral",
    "vicuna",
    "tinydolphin",
    "openhermes",
    "zephyr",
    "tinyllama",
    "openchat",
    "wizardcoder",
    "starcoder",
    "starcoder2",
    "yi",
    "orca2",
    "falcon",
    "solar",
    "sqlcoder",
    "meditron",
    "stablelm2",
    "magicoder",
    "mistrallite",
    "wizardlm",
    "duckdb-nsql",
];

pub const NVIDIA_NIM_CHAT_MODELS: &[&str] = &[
    "microsoft/phi-3-mini-4k-instruct",
    "mistralai/mistral-7b-instruct-v0.2",
    "writer/palmyra-med-70b",
    "mistralai/mistral-large",
    "mistralai/codestral-22b-instruct-v0.1",
    "nvidia/llama3-chatqa-1.5-70b",
    "upstage/solar-10.7b-instruct",
    "google/gemma-2-9b-it",
    "adept/fuyu-8b",
    "google/gemma-2b",
    "databricks/dbrx-instruct",
    "meta/llama-3_1-8b-instruct",
    "microsoft/phi-3-medium-128k-instruct",
    "01-ai/yi-large",
    "nvidia/neva-22b",
    "meta/llama-3_1-70b-instruct",
    "google/codegemma-7b",
    "google/recurrentgemma-2b",
    "google/gemma-2-27b-it",
    "deepseek-ai/deepseek-coder-6.7b-instruct",
    "mediatek/breeze-7b-instruct",
    "microsoft/kosmos-2",
    "microsoft/phi-3-mini-128k-instruct",
    "nvidia/llama3-chatqa-1.5-8b",
    "writer/palmyra-med-70b-32k",
    "google/deplot",
    "meta/llama-3_1-405b-instruct",
    "aisingapore/sea-lion-7b-instruct",
    "liuhaotian/llava-v1.6-mistral-7b",
    "microsoft/phi-3-small-8k-instruct",
    "meta/codellama-70b",
    "liuhaotian/llava-v1.6-34b",
    "nv-mistralai/mistral-nemo-12b-instruct",
    "microsoft/phi-3-medium-4k-instruct",
    "seallms/seallm-7b-v2.5",
    "mistralai/mixtral-8x7b-instruct-v0.1",
    "mistralai/mistral-7b-instruct-v0.3",
    "google/paligemma",
    "google/gemma-7b",
    "mistralai/mixtral-8x22b-instruct-v0.1",
    "google/codegemma-1.1-7b",
    "nvidia/nemotron-4-340b-instruct",
    "meta/llama3-70b-instruct",
    "microsoft/phi-3-small-128k-instruct",
    "ibm/granite-8b-code-instruct",
    "meta/llama3-8b-instruct",
    "snowflake/arctic",
    "microsoft/phi-3-vision-128k-instruct",
    "meta/llama2-70b",
    "ibm/granite-34b-code-instruct",
];

pub const WRITER_CHAT_MODELS: &[&str] = &["palmyra-x5", "palmyra-x4"];

/// Infers the provider serving `model_name`.
///
/// Exact catalog matches win, then name-family prefixes (`claude`, `gemini`,
/// `palmyra`). Ollama tags (`mistral:7b`) are matched on the family before
/// the colon. Unknown names fall back to OpenAI.
pub fn infer_provider(model_name: &str) -> Provider {
    let name = model_name.trim().to_ascii_lowercase();

    if ANTHROPIC_CHAT_MODELS.contains(&name.as_str()) || name.starts_with("claude") {
        return Provider::Anthropic;
    }
    if GOOGLE_GEMINI_CHAT_MODELS.contains(&name.as_str()) || name.starts_with("gemini") {
        return Provider::Google;
    }
    if OPENAI_CHAT_MODELS.contains(&name.as_str()) {
        return Provider::OpenAi;
    }
    if NVIDIA_NIM_CHAT_MODELS.contains(&name.as_str()) {
        return Provider::NvidiaNim;
    }
    if WRITER_CHAT_MODELS.contains(&name.as_str()) || name.starts_with("palmyra") {
        return Provider::Writer;
    }

    let family = name.split(':').next().unwrap_or_default();
    if OLLAMA_CHAT_MODELS.contains(&family) {
        return Provider::Ollama;
    }

    Provider::OpenAi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_known_models() {
        assert_eq!(infer_provider("claude-2.1"), Provider::Anthropic);
        assert_eq!(infer_provider("gemini-1.5-pro"), Provider::Google);
        assert_eq!(infer_provider("mistral"), Provider::Ollama);
        assert_eq!(infer_provider("gpt-4o"), Provider::OpenAi);
        assert_eq!(
            infer_provider("meta/llama-3_1-70b-instruct"),
            Provider::NvidiaNim
        );
        assert_eq!(infer_provider("writer/palmyra-med-70b"), Provider::NvidiaNim);
        assert_eq!(infer_provider("palmyra-x5"), Provider::Writer);
    }

    #[test]
    fn infers_families_and_tags() {
        assert_eq!(infer_provider("claude-sonnet-4-5"), Provider::Anthropic);
        assert_eq!(infer_provider("Gemini-Exp"), Provider::Google);
        assert_eq!(infer_provider("mistral:7b-instruct"), Provider::Ollama);
        assert_eq!(infer_provider("Palmyra-Creative"), Provider::Writer);
    }

    #[test]
    fn unknown_models_default_to_openai() {
        assert_eq!(infer_provider("my-finetune"), Provider::OpenAi);
        assert_eq!(infer_provider(""), Provider::OpenAi);
    }
}
