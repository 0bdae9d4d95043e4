use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to parse JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to marshal YAML: {0}")]
    Emit(#[source] serde_yaml::Error),
}

/// Errors of the plain file conversion path.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("input file is required")]
    MissingInput,

    #[error("error reading file: {0}")]
    Read(#[source] std::io::Error),

    #[error("error writing output file: {0}")]
    Write(#[source] std::io::Error),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Convert a JSON document to YAML.
pub fn json_to_yaml(json: &str) -> Result<String, ConvertError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(ConvertError::Parse)?;
    serde_yaml::to_string(&value).map_err(ConvertError::Emit)
}

/// Convert `input` and write the YAML to `output`, or return it for stdout.
pub fn convert_file(input: &Path, output: Option<&Path>) -> Result<Option<String>, CliError> {
    let json = std::fs::read_to_string(input).map_err(CliError::Read)?;
    let yaml = json_to_yaml(&json)?;
    debug!(input = %input.display(), bytes = yaml.len(), "Converted file");

    match output {
        Some(path) => {
            std::fs::write(path, yaml).map_err(CliError::Write)?;
            Ok(None)
        }
        None => Ok(Some(yaml)),
    }
}
