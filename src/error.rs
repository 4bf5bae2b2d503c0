//! Error type for block export and network parameter resolution.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Block '{0}' not found in PLC software")]
    BlockNotFound(String),
    #[error("Block '{block}' cannot be exported: {reason}{}", compiler_suffix(.diagnostics))]
    NotExportable {
        block: String,
        reason: String,
        diagnostics: Vec<String>,
    },
    #[error("Failed to prepare export file {path}: {source}")]
    ExportFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse exported XML {path}: {reason}")]
    Normalize { path: Utf8PathBuf, reason: String },
    #[error("Unexpected block XML structure: {0}")]
    StructuralMismatch(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(&'static str),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Failed to get parameter value at part {part_uid} port '{port}': {source}")]
    ParameterValue {
        part_uid: String,
        port: String,
        #[source]
        source: Box<ResolveError>,
    },
    #[error("Parameter '{parameter}' not found in block '{block}'")]
    ParameterNotFound { block: String, parameter: String },
}

fn compiler_suffix(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(" (compiler: {})", diagnostics.join("; "))
    }
}
