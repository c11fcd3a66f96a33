// convoscan-core/src/classifier.rs
//! The model-based classification collaborator.
//!
//! Engines that substitute rule matching with a learned classifier talk to it
//! through `TextClassifier`. The classifier is a black box returning a label
//! from a two-value domain and a confidence score. `HttpClassifier` is the
//! stock implementation for a model served over HTTP.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use tinytemplate::TinyTemplate;

use crate::config::ClassifierConfig;
use crate::errors::ConvoscanError;

/// What the classifier is asked to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTask {
    /// A single utterance's text.
    Profanity,
    /// A formatted conversation rendered into the privacy prompt.
    Privacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    Clean,
    Violation,
}

impl ClassificationLabel {
    /// Maps the raw labels models commonly emit onto the two-value domain.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "label_0" | "clean" | "compliant" => Some(ClassificationLabel::Clean),
            "label_1" | "violation" | "profanity" => Some(ClassificationLabel::Violation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: ClassificationLabel,
    pub score: f64,
    pub model: String,
}

impl Classification {
    pub fn is_violation(&self) -> bool {
        self.label == ClassificationLabel::Violation
    }
}

/// A learned text classifier.
pub trait TextClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Classifies `text`. Callers never pass blank text.
    fn classify(&self, text: &str, task: ClassificationTask) -> Result<Classification>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    task: ClassificationTask,
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    label: String,
    score: f64,
    #[serde(default)]
    model: Option<String>,
}

/// Calls a classification endpoint with `POST {"task", "text"}` and expects
/// `{"label", "score", "model"?}` back.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ConvoscanError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConvoscanError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConvoscanError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ConvoscanError::Configuration("classifier engine selected but no `engines.classifier.endpoint` set".to_string())
        })?;
        Self::new(endpoint, Duration::from_millis(config.timeout_ms()))
    }
}

impl TextClassifier for HttpClassifier {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, text: &str, task: ClassificationTask) -> Result<Classification> {
        debug!("Requesting {:?} classification from {}", task, self.endpoint);
        let response: ClassifyResponse = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { task, text })
            .send()
            .with_context(|| format!("request to {} failed", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.endpoint))?
            .json()
            .context("classifier response was not the expected JSON shape")?;

        let label = ClassificationLabel::from_raw(&response.label)
            .ok_or_else(|| anyhow!("classifier returned unknown label '{}'", response.label))?;

        Ok(Classification {
            label,
            score: response.score,
            model: response.model.unwrap_or_else(|| self.endpoint.clone()),
        })
    }
}

#[derive(Serialize)]
struct PromptContext<'a> {
    text: &'a str,
}

/// Renders the privacy prompt template with the formatted conversation.
pub fn render_privacy_prompt(template: &str, conversation: &str) -> Result<String, ConvoscanError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("privacy", template)
        .map_err(|e| ConvoscanError::Configuration(format!("invalid privacy prompt template: {}", e)))?;
    tt.render("privacy", &PromptContext { text: conversation })
        .map_err(|e| ConvoscanError::Configuration(format!("failed to render privacy prompt: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRIVACY_PROMPT;

    #[test]
    fn test_label_mapping() {
        assert_eq!(ClassificationLabel::from_raw("LABEL_1"), Some(ClassificationLabel::Violation));
        assert_eq!(ClassificationLabel::from_raw("Compliant"), Some(ClassificationLabel::Clean));
        assert_eq!(ClassificationLabel::from_raw("maybe"), None);
    }

    #[test]
    fn test_prompt_is_rendered_without_html_escaping() {
        let prompt = render_privacy_prompt(DEFAULT_PRIVACY_PROMPT, "Agent: balance <$300> & \"due\"").unwrap();
        assert!(prompt.starts_with("Analyze for privacy violations:"));
        assert!(prompt.contains("Text: \"Agent: balance <$300> & \"due\"\""));
        assert!(prompt.ends_with("Label:"));
    }

    #[test]
    fn test_bad_template_is_a_configuration_error() {
        let err = render_privacy_prompt("{unclosed", "x").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_missing_endpoint_is_a_configuration_error() {
        let err = HttpClassifier::from_config(&ClassifierConfig::default()).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
