//! Flow document parsing (YAML, the format the `PseudoFlow` CRD's
//! `spec` is typically authored in, and JSON for the escape hatch of
//! custom resources submitted as JSON).

use crate::Result;
use crate::model::FlowSpec;
use std::path::Path;

/// Parse a flow spec from a YAML string.
pub fn parse_flow_str(content: &str) -> Result<FlowSpec> {
    Ok(serde_yaml::from_str(content)?)
}

/// Parse a flow spec from a file on disk.
pub fn parse_flow_file<P: AsRef<Path>>(path: P) -> Result<FlowSpec> {
    let content = std::fs::read_to_string(path)?;
    parse_flow_str(&content)
}
