//! Parameter validation.
//!
//! One pass over the whole parameter set, collecting every violation instead
//! of stopping at the first, so a caller can report all problems at once.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{ConsistencyError, ValidationError};
use crate::schema::{ParamDef, ParamKind, Schema};

/// Raw input: a flat name → string-value map, exactly as supplied by the
/// caller (parameter files, CLI flags, test scenarios).
pub type RawParameters = BTreeMap<String, String>;

/// Parameters after validation, with defaults applied. Immutable for the rest
/// of the resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParameters {
    values: BTreeMap<String, String>,
}

impl ValidatedParameters {
    /// Look up a parameter. Absence after validation is a defect in the
    /// resolution logic, not user input, hence `ConsistencyError`.
    pub fn get(&self, name: &str) -> Result<&str, ConsistencyError> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConsistencyError::UnknownParameter(name.to_string()))
    }

    /// Numeric parameter as a day count. The range check already happened
    /// during validation; a parse failure here means the schema lied.
    pub fn get_days(&self, name: &str) -> Result<u32, ConsistencyError> {
        let v = self.get(name)?;
        v.parse().map_err(|_| ConsistencyError::NonNumericValue {
            parameter: name.to_string(),
            value: v.to_string(),
        })
    }

    /// Comma-delimited parameter split into its members.
    pub fn get_list(&self, name: &str) -> Result<Vec<&str>, ConsistencyError> {
        Ok(self.get(name)?.split(',').collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Schema {
    /// Validate a raw parameter map against the schema.
    ///
    /// Returns the validated set, or every violation found across all
    /// parameters. Pure; no state is retained across calls.
    pub fn validate(
        &self,
        raw: &RawParameters,
    ) -> Result<ValidatedParameters, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut values = BTreeMap::new();

        for def in &self.parameters {
            match raw.get(def.name) {
                Some(value) => {
                    if let Err(e) = check_value(def, value) {
                        errors.push(e);
                    } else {
                        values.insert(def.name.to_string(), value.clone());
                    }
                }
                None => match def.default {
                    Some(d) => {
                        values.insert(def.name.to_string(), d.to_string());
                    }
                    None => errors.push(ValidationError {
                        parameter: def.name.to_string(),
                        value: String::new(),
                        message: format!("required parameter is missing ({})", def.message),
                    }),
                },
            }
        }

        // A name the schema does not define is an input error at this layer,
        // never a silent passthrough.
        for name in raw.keys() {
            if self.parameter(name).is_none() {
                errors.push(ValidationError {
                    parameter: name.clone(),
                    value: raw[name].clone(),
                    message: "unknown parameter".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(ValidatedParameters { values })
        } else {
            Err(errors)
        }
    }
}

fn check_value(def: &ParamDef, value: &str) -> Result<(), ValidationError> {
    let violation = |message: String| ValidationError {
        parameter: def.name.to_string(),
        value: value.to_string(),
        message,
    };

    match &def.kind {
        ParamKind::Str { pattern: None } => Ok(()),
        ParamKind::Str { pattern: Some(p) } => {
            if full_match(def.name, p, value)? {
                Ok(())
            } else {
                Err(violation(def.message.to_string()))
            }
        }
        ParamKind::Number { min, max } => match value.parse::<i64>() {
            Ok(n) if (*min..=*max).contains(&n) => Ok(()),
            Ok(n) => Err(violation(format!(
                "{n} is outside the allowed range {min}-{max}"
            ))),
            Err(_) => Err(violation(format!("not a number ({})", def.message))),
        },
        ParamKind::Enum { allowed } => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                Err(violation(format!(
                    "'{value}' is not in the allowed set [{}]",
                    allowed.join(", ")
                )))
            }
        }
        ParamKind::CommaList { member_pattern } => {
            for member in value.split(',') {
                if !full_match(def.name, member_pattern, member)? {
                    return Err(violation(format!(
                        "list member '{member}' rejected: {}",
                        def.message
                    )));
                }
            }
            Ok(())
        }
    }
}

// Anchored full-string match, not a search. A pattern that fails to compile
// is a schema defect reported as such, not a user-input error.
fn full_match(param: &str, pattern: &str, value: &str) -> Result<bool, ValidationError> {
    let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|_| ValidationError {
        parameter: param.to_string(),
        value: value.to_string(),
        message: format!("internal: invalid constraint pattern '{pattern}'"),
    })?;
    Ok(re.is_match(value))
}
