use std::path::{Path, PathBuf};

use crate::foundation::error::{ArtificeError, ArtificeResult};

/// Domain of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    /// Integer in `min..=max`.
    Int {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Finite float in `min..=max`.
    Float {
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// Boolean flag.
    Bool,
    /// One of a fixed set of names.
    Enum {
        /// Accepted names.
        choices: &'static [&'static str],
    },
    /// Filesystem path; not checked for existence.
    Path,
}

/// Current value of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Selected enum name.
    Enum(String),
    /// Path value.
    Path(PathBuf),
}

impl ParamValue {
    /// JSON form used by graph descriptions.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Enum(v) => serde_json::Value::String(v.clone()),
            Self::Path(p) => serde_json::Value::String(p.to_string_lossy().into_owned()),
        }
    }
}

/// Named, typed, bounded configuration slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, unique per operator.
    pub name: &'static str,
    /// Accepted domain.
    pub kind: ParamKind,
    /// Initial value.
    pub default: ParamValue,
}

impl ParamSpec {
    /// Integer parameter.
    pub fn int(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: ParamKind::Int { min, max },
            default: ParamValue::Int(default),
        }
    }

    /// Float parameter.
    pub fn float(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Float { min, max },
            default: ParamValue::Float(default),
        }
    }

    /// Boolean parameter.
    pub fn bool(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: ParamKind::Bool,
            default: ParamValue::Bool(default),
        }
    }

    /// Enum parameter; `default` should be one of `choices`.
    pub fn choice(name: &'static str, default: &str, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: ParamKind::Enum { choices },
            default: ParamValue::Enum(default.to_owned()),
        }
    }

    /// Path parameter.
    pub fn path(name: &'static str, default: impl Into<PathBuf>) -> Self {
        Self {
            name,
            kind: ParamKind::Path,
            default: ParamValue::Path(default.into()),
        }
    }

    /// Validate a JSON value against this parameter's domain.
    pub fn parse(&self, v: &serde_json::Value) -> ArtificeResult<ParamValue> {
        let key = self.name;
        match &self.kind {
            ParamKind::Int { min, max } => {
                let n = v
                    .as_i64()
                    .or_else(|| {
                        v.as_f64()
                            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                            .map(|f| f as i64)
                    })
                    .ok_or_else(|| {
                        ArtificeError::configuration(format!("param '{key}' must be an integer"))
                    })?;
                if n < *min || n > *max {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be in {min}..={max}, got {n}"
                    )));
                }
                Ok(ParamValue::Int(n))
            }
            ParamKind::Float { min, max } => {
                let Some(n) = v.as_f64() else {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be a number"
                    )));
                };
                if !n.is_finite() {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be finite"
                    )));
                }
                if n < *min || n > *max {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be in [{min}, {max}], got {n}"
                    )));
                }
                Ok(ParamValue::Float(n))
            }
            ParamKind::Bool => v.as_bool().map(ParamValue::Bool).ok_or_else(|| {
                ArtificeError::configuration(format!("param '{key}' must be a boolean"))
            }),
            ParamKind::Enum { choices } => {
                let Some(s) = v.as_str() else {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be a string"
                    )));
                };
                if !choices.contains(&s) {
                    return Err(ArtificeError::configuration(format!(
                        "param '{key}' must be one of {choices:?}, got '{s}'"
                    )));
                }
                Ok(ParamValue::Enum(s.to_owned()))
            }
            ParamKind::Path => v
                .as_str()
                .map(|s| ParamValue::Path(PathBuf::from(s)))
                .ok_or_else(|| ArtificeError::configuration(format!("param '{key}' must be a path string"))),
        }
    }
}

/// Ordered parameter set of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    specs: Vec<ParamSpec>,
    values: Vec<ParamValue>,
}

impl Params {
    /// Parameter set initialized to the defaults of `specs`.
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        let values = specs.iter().map(|s| s.default.clone()).collect();
        Self { specs, values }
    }

    /// Declared specs in order.
    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.specs.iter().map(|s| s.name).zip(self.values.iter())
    }

    fn position(&self, name: &str) -> ArtificeResult<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ArtificeError::configuration(format!("unknown param '{name}'")))
    }

    /// Set `name` from JSON. On error the previous value stays in place.
    pub fn set(&mut self, name: &str, value: &serde_json::Value) -> ArtificeResult<()> {
        let i = self.position(name)?;
        self.values[i] = self.specs[i].parse(value)?;
        Ok(())
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.position(name).ok().map(|i| &self.values[i])
    }

    /// Integer value of `name`.
    pub fn int(&self, name: &str) -> ArtificeResult<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            _ => Err(type_error(name, "int")),
        }
    }

    /// Float value of `name`.
    pub fn float(&self, name: &str) -> ArtificeResult<f64> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            _ => Err(type_error(name, "float")),
        }
    }

    /// Boolean value of `name`.
    pub fn bool(&self, name: &str) -> ArtificeResult<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            _ => Err(type_error(name, "bool")),
        }
    }

    /// Selected enum name of `name`.
    pub fn choice(&self, name: &str) -> ArtificeResult<&str> {
        match self.get(name) {
            Some(ParamValue::Enum(v)) => Ok(v),
            _ => Err(type_error(name, "enum")),
        }
    }

    /// Path value of `name`.
    pub fn path(&self, name: &str) -> ArtificeResult<&Path> {
        match self.get(name) {
            Some(ParamValue::Path(p)) => Ok(p),
            _ => Err(type_error(name, "path")),
        }
    }
}

fn type_error(name: &str, want: &str) -> ArtificeError {
    ArtificeError::configuration(format!("param '{name}' is not a declared {want} param"))
}

#[cfg(test)]
#[path = "../../tests/unit/graph/param.rs"]
mod tests;
