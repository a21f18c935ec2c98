// ABOUTME: Input validation for the API key, form fields and the initial request
// ABOUTME: Rejects empty input with validation errors and warns about unusual key formats

use partlens_sdk::PartlensError;
use secrecy::SecretString;
use std::path::PathBuf;

use crate::conversation::FormField;

/// A trimmed API key plus a warning when its format looks unusual.
#[derive(Debug)]
pub struct ValidatedKey {
    pub key: SecretString,
    pub warning: Option<String>,
}

pub fn validate_api_key(key: Option<&str>) -> Result<ValidatedKey, PartlensError> {
    let key = key.map(str::trim).unwrap_or_default();
    if key.is_empty() {
        return Err(PartlensError::Validation(
            "Provide an OpenAI API key with --api-key or OPENAI_API_KEY.".to_string(),
        ));
    }

    let warning = (!key.starts_with("sk-"))
        .then(|| "API key does not start with sk- (it may use a different format).".to_string());

    Ok(ValidatedKey {
        key: SecretString::new(key.to_string().into_boxed_str()),
        warning,
    })
}

/// Parse a `Label=Value` command-line field. Used as a clap value parser.
pub fn parse_field(raw: &str) -> Result<FormField, String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Label=Value, got '{}'", raw))?;

    let (label, value) = (label.trim(), value.trim());
    if label.is_empty() {
        return Err("field label cannot be empty".to_string());
    }
    if value.is_empty() {
        return Err(format!("field '{}' has no value", label));
    }

    Ok(FormField::new(label, value))
}

/// The initial request needs at least one field and one image.
pub fn validate_form(fields: &[FormField], images: &[PathBuf]) -> Result<(), PartlensError> {
    if fields.is_empty() {
        return Err(PartlensError::Validation(
            "Add at least one field with a value.".to_string(),
        ));
    }
    if images.is_empty() {
        return Err(PartlensError::Validation(
            "Add at least one image.".to_string(),
        ));
    }
    Ok(())
}
