use std::f64::consts::{E, PI, TAU};

use thiserror::Error;

use crate::expr::{builtin_constant, identifier_spans, Function};

pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Fractional digits kept when comparing evaluated values.
pub const ROUNDING_DIGITS: i32 = 13;
/// Values outside `[-MAGNITUDE_BOUND, MAGNITUDE_BOUND]` are not interesting.
pub const MAGNITUDE_BOUND: f64 = 1000.0;
/// Variables are named `z`, `y`, `x`, ... and we stop well before `a`.
pub const MAX_VARIABLES: usize = 10;

pub const DEFAULT_PLACEHOLDER: &str = "v";
pub const DEFAULT_MAX_LENGTH: usize = 14;
pub const DEFAULT_NUM_VARIABLES: usize = 3;
pub const DEFAULT_FUNCTIONS: [Function; 5] = [
    Function::Log,
    Function::Log2,
    Function::Log10,
    Function::Sqrt,
    Function::Cbrt,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at most {max} variables are supported, got {requested}")]
    TooManyVariables {
        requested: usize,
        max: usize,
    },
    #[error("at least one variable is required")]
    NoVariables,
    #[error("{witnesses} witnesses cannot fingerprint {variables} variables")]
    NotEnoughWitnesses {
        witnesses: usize,
        variables: usize,
    },
    #[error("witness {0} is used twice")]
    DuplicateWitness(f64),
    #[error("the constant catalog is empty")]
    EmptyCatalog,
    #[error("constant `{name}` has unusable value {value}")]
    BadConstant {
        name: String,
        value: f64,
    },
    #[error("constant `{0}` repeats the value of an earlier constant")]
    DuplicateConstant(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("`{0}` cannot be used as the placeholder")]
    BadPlaceholder(String),
}

/// A named value that may be substituted for a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: f64,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn integer(n: u32) -> Self {
        Self::new(n.to_string(), n as f64)
    }
}

pub fn default_catalog() -> Vec<Constant> {
    let named = [
        Constant::new("tau", TAU),
        Constant::new("pi", PI),
        Constant::new("e", E),
        Constant::new("phi", GOLDEN_RATIO),
    ];

    named.into_iter()
        .chain((1..=10).map(Constant::integer))
        .collect()
}

pub fn default_witnesses() -> Vec<f64> {
    vec![E, PI, GOLDEN_RATIO]
}

pub fn variable_name(index: usize) -> Result<String, ConfigError> {
    if index >= MAX_VARIABLES {
        return Err(ConfigError::TooManyVariables {
            requested: index + 1,
            max: MAX_VARIABLES,
        });
    }

    Ok(char::from(b'z' - index as u8).to_string())
}

/// Names of the first `count` variables, in tokenization order.
pub fn variable_names(count: usize) -> Result<Vec<String>, ConfigError> {
    (0..count).map(variable_name).collect()
}

/// Everything a run depends on. A run never reads anything else, so two
/// runs over equal configs produce equal results.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_length: usize,
    pub num_variables: usize,
    pub placeholder: String,
    pub functions: Vec<Function>,
    pub catalog: Vec<Constant>,
    pub witnesses: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            num_variables: DEFAULT_NUM_VARIABLES,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            functions: DEFAULT_FUNCTIONS.to_vec(),
            catalog: default_catalog(),
            witnesses: default_witnesses(),
        }
    }
}

impl Config {
    pub fn new(max_length: usize, num_variables: usize) -> Self {
        Self {
            max_length,
            num_variables,
            ..Self::default()
        }
    }

    pub fn with_catalog(self, catalog: Vec<Constant>) -> Self {
        Self { catalog, ..self }
    }

    pub fn with_witnesses(self, witnesses: Vec<f64>) -> Self {
        Self { witnesses, ..self }
    }

    /// Replaces the prefix functions by name.
    pub fn with_function_names<'a>(
        self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let functions = names.into_iter()
            .map(|name| Function::from_name(name)
                .ok_or_else(|| ConfigError::UnknownFunction(name.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { functions, ..self })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_variables == 0 {
            return Err(ConfigError::NoVariables);
        }
        let names = variable_names(self.num_variables)?;

        if self.witnesses.len() < self.num_variables {
            return Err(ConfigError::NotEnoughWitnesses {
                witnesses: self.witnesses.len(),
                variables: self.num_variables,
            });
        }
        for (idx, w) in self.witnesses.iter().enumerate() {
            if self.witnesses[..idx].contains(w) {
                return Err(ConfigError::DuplicateWitness(*w));
            }
        }

        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (idx, c) in self.catalog.iter().enumerate() {
            if c.name.is_empty() || !c.value.is_finite() {
                return Err(ConfigError::BadConstant {
                    name: c.name.clone(),
                    value: c.value,
                });
            }
            if self.catalog[..idx].iter().any(|other| other.value == c.value) {
                return Err(ConfigError::DuplicateConstant(c.name.clone()));
            }
        }

        self.validate_placeholder(&names)
    }

    fn validate_placeholder(&self, names: &[String]) -> Result<(), ConfigError> {
        let p = self.placeholder.as_str();
        let is_identifier = identifier_spans(p)
            .first()
            .is_some_and(|span| *span == (0..p.len()));
        let collides = names.iter().any(|n| n == p)
            || builtin_constant(p).is_some()
            || Function::from_name(p).is_some();

        if !is_identifier || collides {
            return Err(ConfigError::BadPlaceholder(p.to_string()));
        }

        Ok(())
    }
}
