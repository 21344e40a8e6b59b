//! Merges per-request overrides with process-wide generation defaults.

use chat_relay_common::ChatRequest;

use crate::catalog::ModelCatalog;
use crate::error::{Error, Result};

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Generation parameters configured for the whole process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDefaults {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Optional per-request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterOverrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl From<&ChatRequest> for ParameterOverrides {
    fn from(request: &ChatRequest) -> Self {
        Self {
            model: request.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Concrete parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParameters {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Resolve the parameters of one call.
///
/// A present, non-blank model override wins. A temperature override must lie
/// in `[0.0, 2.0]`. A `max_tokens` override is used only when it lies in
/// `[1, ceiling]` for the chosen model; otherwise the default applies.
pub fn resolve(
    overrides: &ParameterOverrides,
    defaults: &ProcessDefaults,
    catalog: &ModelCatalog,
) -> Result<EffectiveParameters> {
    let model = chosen_model(overrides, defaults).to_string();

    let temperature = match overrides.temperature {
        Some(t) => check_temperature(t)?,
        None => defaults.temperature,
    };

    let ceiling = catalog.ceiling_for(&model);
    let max_tokens = overrides
        .max_tokens
        .filter(|n| (1..=ceiling).contains(n))
        .unwrap_or(defaults.max_tokens);

    Ok(EffectiveParameters {
        model,
        temperature,
        max_tokens,
    })
}

/// Reject an explicit `max_tokens` the provider would not accept.
///
/// Used at the HTTP boundary so an out-of-range value is reported to the
/// caller instead of being replaced by the default.
pub fn check_max_tokens(
    overrides: &ParameterOverrides,
    defaults: &ProcessDefaults,
    catalog: &ModelCatalog,
) -> Result<()> {
    let Some(max_tokens) = overrides.max_tokens else {
        return Ok(());
    };
    let model = chosen_model(overrides, defaults);
    let ceiling = catalog.ceiling_for(model);
    if !(1..=ceiling).contains(&max_tokens) {
        return Err(Error::InvalidParameter(format!(
            "max_tokens must be between 1 and {} for model '{}', got {}",
            ceiling, model, max_tokens
        )));
    }
    Ok(())
}

fn chosen_model<'a>(overrides: &'a ParameterOverrides, defaults: &'a ProcessDefaults) -> &'a str {
    overrides
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(&defaults.model)
}

pub(crate) fn check_temperature(t: f64) -> Result<f64> {
    // NaN fails the range check.
    if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&t) {
        Ok(t)
    } else {
        Err(Error::InvalidParameter(format!(
            "temperature must be between {:.1} and {:.1}, got {}",
            MIN_TEMPERATURE, MAX_TEMPERATURE, t
        )))
    }
}
