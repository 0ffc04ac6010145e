//! Generation config: the tagged variant that makes a column "output" (spec §3, §4.C).

use crate::{RagParams, Template};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Configuration for an `LLMGen` output column.
///
/// # Examples
///
/// ```
/// use gentable_core::LlmConfig;
///
/// let cfg = LlmConfig::new(
///     "gemini-2.0-flash-lite".to_string(),
///     "You are a helpful assistant.".to_string(),
///     "Summarize: ${body}".to_string(),
///     Some(512),
///     Some(0.7),
///     Some(0.9),
///     None,
///     None,
///     false,
/// );
/// assert_eq!(cfg.user_prompt_template().references(), vec!["body".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct LlmConfig {
    /// Model identifier.
    model: String,
    /// Raw system prompt template.
    system_prompt: String,
    /// Raw user prompt template.
    user_prompt: String,
    /// Maximum tokens to generate.
    max_tokens: Option<u32>,
    /// Sampling temperature.
    temperature: Option<f32>,
    /// Nucleus sampling parameter.
    top_p: Option<f32>,
    /// Tool/function definitions offered to the model, as raw JSON.
    tools: Option<Vec<serde_json::Value>>,
    /// Retrieval parameters, if this column consults a knowledge table.
    rag_params: Option<RagParams>,
    /// Whether this column's prompt context spans prior rows (Chat tables).
    multi_turn: bool,
    #[serde(skip)]
    #[getter(skip)]
    system_prompt_template: Option<Template>,
    #[serde(skip)]
    #[getter(skip)]
    user_prompt_template: Option<Template>,
}

impl LlmConfig {
    /// Construct a new LLM generation config, compiling both prompt templates
    /// immediately (spec §9: compile at table-load time, not per row).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: String,
        system_prompt: String,
        user_prompt: String,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        top_p: Option<f32>,
        tools: Option<Vec<serde_json::Value>>,
        rag_params: Option<RagParams>,
        multi_turn: bool,
    ) -> Self {
        let system_prompt_template = Some(Template::compile(&system_prompt));
        let user_prompt_template = Some(Template::compile(&user_prompt));
        Self {
            model,
            system_prompt,
            user_prompt,
            max_tokens,
            temperature,
            top_p,
            tools,
            rag_params,
            multi_turn,
            system_prompt_template,
            user_prompt_template,
        }
    }

    /// The compiled system prompt template, compiling lazily if this config
    /// was deserialized rather than constructed via [`LlmConfig::new`].
    pub fn system_prompt_template(&self) -> Template {
        self.system_prompt_template
            .clone()
            .unwrap_or_else(|| Template::compile(&self.system_prompt))
    }

    /// The compiled user prompt template, compiling lazily if needed.
    pub fn user_prompt_template(&self) -> Template {
        self.user_prompt_template
            .clone()
            .unwrap_or_else(|| Template::compile(&self.user_prompt))
    }

    /// Every column name referenced by either prompt template, deduplicated.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut refs = self.system_prompt_template().references();
        for r in self.user_prompt_template().references() {
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
        refs
    }
}

/// Configuration for an `EmbedGen` output column.
///
/// # Examples
///
/// ```
/// use gentable_core::EmbedConfig;
///
/// let cfg = EmbedConfig::new("text-embedding-3-small".to_string(), "body".to_string());
/// assert_eq!(cfg.source_column(), "body");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct EmbedConfig {
    /// Embedding model identifier.
    embedding_model: String,
    /// The column whose rendered text is embedded.
    source_column: String,
}

impl EmbedConfig {
    /// Construct a new embedding generation config.
    pub fn new(embedding_model: String, source_column: String) -> Self {
        Self {
            embedding_model,
            source_column,
        }
    }
}

/// Configuration for a `PythonGen` output column.
///
/// # Examples
///
/// ```
/// use gentable_core::PythonConfig;
///
/// let cfg = PythonConfig::new("result = row['a'] + row['b']".to_string());
/// assert!(cfg.referenced_columns().contains(&"a".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct PythonConfig {
    /// The sandboxed snippet source.
    code: String,
}

impl PythonConfig {
    /// Construct a new Python generation config.
    pub fn new(code: String) -> Self {
        Self { code }
    }

    /// Conservatively extract every `row['col']` / `row["col"]` occurrence in
    /// the snippet as a dependency, even if runtime-dead (spec §4.A).
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut refs = Vec::new();
        let bytes = self.code.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if self.code[i..].starts_with("row[") {
                let rest = &self.code[i + 4..];
                let quote = rest.chars().next();
                if let Some(q) = quote {
                    if q == '\'' || q == '"' {
                        if let Some(end) = rest[1..].find(q) {
                            let name = rest[1..1 + end].to_string();
                            if !refs.contains(&name) {
                                refs.push(name);
                            }
                            i += 4 + 1 + end + 1;
                            continue;
                        }
                    }
                }
            }
            i += 1;
        }
        refs
    }
}

/// The tagged variant discriminating how an output column's value is produced.
///
/// # Examples
///
/// ```
/// use gentable_core::{GenConfig, EmbedConfig};
///
/// let cfg = GenConfig::Embed(EmbedConfig::new("model-x".to_string(), "body".to_string()));
/// assert!(cfg.referenced_columns().contains(&"body".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", content = "config")]
#[serde(rename_all = "snake_case")]
pub enum GenConfig {
    /// Language-model generation.
    Llm(LlmConfig),
    /// Embedding generation.
    Embed(EmbedConfig),
    /// Sandboxed Python generation.
    Python(PythonConfig),
}

impl GenConfig {
    /// The columns this generation config depends on (spec §4.A).
    pub fn referenced_columns(&self) -> Vec<String> {
        match self {
            GenConfig::Llm(cfg) => cfg.referenced_columns(),
            GenConfig::Embed(cfg) => vec![cfg.source_column().clone()],
            GenConfig::Python(cfg) => cfg.referenced_columns(),
        }
    }

    /// Whether this is a multi-turn LLM column.
    pub fn is_multi_turn(&self) -> bool {
        matches!(self, GenConfig::Llm(cfg) if *cfg.multi_turn())
    }
}
