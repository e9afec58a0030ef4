//! Runtime configuration. Settings are read from an optional JSON file named
//! by `QCHEM_G16_CONFIG` and then overridden by individual environment
//! variables, since Gaussian gives no way to pass extra arguments to an
//! External program.

use std::{fmt::Display, fs::read_to_string};

use serde::{Deserialize, Serialize};

use crate::program::Template;

pub const CONFIG_VAR: &str = "QCHEM_G16_CONFIG";
pub const RUNDIR_VAR: &str = "QCHEM_RUNDIR";
pub const COMMAND_VAR: &str = "QCHEM_G16_COMMAND";
pub const THREADS_VAR: &str = "QCHEM_G16_NT";
pub const TEMPLATE_VAR: &str = "QCHEM_G16_TEMPLATE";
pub const SKIP_RUN_VAR: &str = "QCHEM_G16_SKIP_RUN";
pub const KEEP_VAR: &str = "QCHEM_G16_KEEP";

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Read(String, String),
    Json(String, String),
    BadValue { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(file, e) => {
                write!(f, "failed to read {file} with {e}")
            }
            ConfigError::Json(file, e) => {
                write!(f, "failed to deserialize {file} with {e}")
            }
            ConfigError::BadValue { var, value } => {
                write!(f, "invalid value `{value}` for {var}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// the directory Q-Chem runs in and writes its results to
    pub rundir: String,

    /// the Q-Chem executable
    pub command: String,

    /// number of threads passed to Q-Chem with `-nt`
    pub threads: Option<usize>,

    /// path to a Q-Chem input template. The built-in template is used if
    /// this is None
    pub template: Option<String>,

    /// only translate the results already in `rundir`
    pub skip_run: bool,

    /// leave the results of earlier runs in place instead of deleting them
    /// before running
    pub keep_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rundir: String::from("."),
            command: String::from("qchem"),
            threads: None,
            template: None,
            skip_run: false,
            keep_files: false,
        }
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::BadValue { var, value }),
    }
}

impl Config {
    pub fn load(filename: &str) -> Result<Self, ConfigError> {
        let contents = read_to_string(filename)
            .map_err(|e| ConfigError::Read(filename.to_owned(), e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Json(filename.to_owned(), e.to_string()))
    }

    /// build a [Config] from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// build a [Config] from the variables returned by `get`, starting from
    /// the file named by [CONFIG_VAR] if it is set
    pub fn from_vars(
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut ret = match get(CONFIG_VAR) {
            Some(f) => Self::load(&f)?,
            None => Self::default(),
        };
        if let Some(v) = get(RUNDIR_VAR) {
            ret.rundir = v;
        }
        if let Some(v) = get(COMMAND_VAR) {
            ret.command = v;
        }
        if let Some(v) = get(THREADS_VAR) {
            let n = v.trim().parse().map_err(|_| ConfigError::BadValue {
                var: THREADS_VAR,
                value: v.clone(),
            })?;
            ret.threads = Some(n);
        }
        if let Some(v) = get(TEMPLATE_VAR) {
            ret.template = Some(v);
        }
        if let Some(v) = get(SKIP_RUN_VAR) {
            ret.skip_run = parse_bool(SKIP_RUN_VAR, v)?;
        }
        if let Some(v) = get(KEEP_VAR) {
            ret.keep_files = parse_bool(KEEP_VAR, v)?;
        }
        Ok(ret)
    }

    /// the [Template] named by `self.template` or the default
    pub fn template(&self) -> Result<Template, ConfigError> {
        match &self.template {
            Some(f) => read_to_string(f)
                .map(|s| Template::from(&s))
                .map_err(|e| ConfigError::Read(f.clone(), e.to_string())),
            None => Ok(Template::default()),
        }
    }
}
