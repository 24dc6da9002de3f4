use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::domain::Error;
use crate::fraud::FraudPolicy;
use crate::nacha::Originator;

/// Runtime settings. Any field left out of the file keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fraud: FraudPolicy,
    pub originator: Originator,
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self, Error> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
