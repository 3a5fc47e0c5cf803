use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::value::Value;

pub const SOURCE_ATTRIBUTE: &str = "x-calculator-source";
pub const EXPRESSION_ATTRIBUTE: &str = "x-calculator-expression";
pub const SCOPE_ATTRIBUTE: &str = "x-calculator-scope";
pub const PRECISION_ATTRIBUTE: &str = "x-calculator-precision";
pub const LOCALE_ATTRIBUTE: &str = "x-calculator-locale";

/// How a changed source identifier selects the expressions to recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyMatching {
    /// The expression text contains the identifier anywhere, so `price`
    /// also wakes `priceTotal * 2`.
    #[default]
    Substring,
    /// The formula reads a variable with exactly that name.
    Referenced,
}

/// Replaces results that are not numbers before they are written.
#[derive(Clone)]
pub struct NanHandler(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl NanHandler {
    pub fn new(handler: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    pub fn handle(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl Default for NanHandler {
    fn default() -> Self {
        Self::new(|value| value)
    }
}

impl fmt::Debug for NanHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("NanHandler")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub nan_handler: NanHandler,
    pub source_attribute: String,
    pub expression_attribute: String,
    pub scope_attribute: String,
    pub precision_attribute: String,
    pub locale_attribute: String,
    /// Locale when no attribute names one. `None` detects the system locale.
    pub default_locale: Option<String>,
    pub dependency_matching: DependencyMatching,
    /// Bound on source-to-expression-to-source cascades.
    pub max_cascade_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nan_handler: NanHandler::default(),
            source_attribute: SOURCE_ATTRIBUTE.to_owned(),
            expression_attribute: EXPRESSION_ATTRIBUTE.to_owned(),
            scope_attribute: SCOPE_ATTRIBUTE.to_owned(),
            precision_attribute: PRECISION_ATTRIBUTE.to_owned(),
            locale_attribute: LOCALE_ATTRIBUTE.to_owned(),
            default_locale: None,
            dependency_matching: DependencyMatching::default(),
            max_cascade_depth: 64,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(json)?;
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.max_cascade_depth == 0 {
            return Err(ConfigError::ZeroCascadeDepth);
        }
        Ok(self)
    }

    pub fn with_nan_handler(mut self, handler: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.nan_handler = NanHandler::new(handler);
        self
    }

    pub fn with_locale_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.locale_attribute = attribute.into();
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn with_dependency_matching(mut self, matching: DependencyMatching) -> Self {
        self.dependency_matching = matching;
        self
    }

    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth.max(1);
        self
    }
}
