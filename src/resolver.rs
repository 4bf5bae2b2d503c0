//! Block parameter resolution.
//!
//! Given a block and a parameter name, find the tag or named constant called
//! `parameter` in one of the block's networks, follow its wire to the part
//! port it is attached to, hop to the internally linked port through the
//! [`FunctionPortTable`], and read the literal constant wired there.
//!
//! ```text
//!   '3.1.0' ──▶ in ┌──────┐ out1 ──▶ "libVersion"
//!                  │ MOVE │
//!                  └──────┘
//! ```
//!
//! A named constant (`GlobalConstant`, `LocalConstant`) matched by name
//! returns its own value without following any wire.

use crate::error::ResolveError;
use crate::export::{PlcSoftware, export_block};
use crate::network::{NetworkDocument, NetworkScope};
use crate::normalize;
use crate::port_table::FunctionPortTable;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// Resolves network parameters of the blocks of one PLC.
pub struct BlockParameterResolver<P: PlcSoftware> {
    software: P,
    export_dir: Utf8PathBuf,
    port_table: FunctionPortTable,
}

impl<P: PlcSoftware> BlockParameterResolver<P> {
    pub fn new(software: P, export_dir: impl AsRef<Utf8Path>, port_table: FunctionPortTable) -> Self {
        Self {
            software,
            export_dir: export_dir.as_ref().to_path_buf(),
            port_table,
        }
    }

    pub fn software(&self) -> &P {
        &self.software
    }

    pub fn software_mut(&mut self) -> &mut P {
        &mut self.software
    }

    pub fn port_table(&self) -> &FunctionPortTable {
        &self.port_table
    }

    pub fn export_dir(&self) -> &Utf8Path {
        &self.export_dir
    }

    /// Export `block_name` into the export directory and parse it.
    ///
    /// The block is re-exported on every call.
    pub fn export_document(&mut self, block_name: &str) -> Result<NetworkDocument, ResolveError> {
        let block = self
            .software
            .find_block(block_name)
            .ok_or_else(|| ResolveError::BlockNotFound(block_name.to_string()))?;
        std::fs::create_dir_all(self.export_dir.as_std_path()).map_err(|source| {
            ResolveError::ExportFile {
                path: self.export_dir.clone(),
                source,
            }
        })?;
        let path = self.export_dir.join(block.export_file_name());
        export_block(&mut self.software, &block, &path)?;
        let doc = normalize::parse_file(&path).map_err(|e| ResolveError::Normalize {
            path: path.clone(),
            reason: format!("{:#}", e),
        })?;
        NetworkDocument::from_value(doc)
    }

    /// Literal value feeding the network parameter `parameter` of `block_name`.
    pub fn get_nwk_para(&mut self, block_name: &str, parameter: &str) -> Result<String, ResolveError> {
        let doc = self.export_document(block_name)?;
        find_parameter(&doc, parameter, &self.port_table)?.ok_or_else(|| {
            ResolveError::ParameterNotFound {
                block: block_name.to_string(),
                parameter: parameter.to_string(),
            }
        })
    }
}

/// Scan the networks of `doc` for `parameter` and resolve its value.
///
/// Networks are visited in document order; the first complete chain wins.
/// `Ok(None)` means no network yields a value. Structural problems with the
/// document are returned as errors.
pub fn find_parameter(
    doc: &NetworkDocument,
    parameter: &str,
    table: &FunctionPortTable,
) -> Result<Option<String>, ResolveError> {
    let ns_count = doc.namespace_count();
    for network in doc.networks()? {
        let Some(scope) = network.resolve_scope(ns_count)? else {
            continue;
        };
        match resolve_in_scope(&scope, parameter, table) {
            Ok(Some(value)) => {
                debug!(network = network.index(), ns = scope.prefix(), %parameter, %value, "parameter resolved");
                return Ok(Some(value));
            }
            Ok(None) => {}
            Err(e) => {
                debug!(network = network.index(), ns = scope.prefix(), %parameter, "chain incomplete: {}", e);
            }
        }
    }
    Ok(None)
}

/// One (network, namespace) step of [`find_parameter`].
pub fn resolve_in_scope(
    scope: &NetworkScope<'_>,
    parameter: &str,
    table: &FunctionPortTable,
) -> Result<Option<String>, ResolveError> {
    let Some(component) = scope.search_component(None, Some(parameter))? else {
        return Ok(None);
    };
    // A named constant carries its own value.
    if let Some(value) = component.literal_value() {
        return Ok(Some(value));
    }
    let Some(dest) = scope.search_wire(Some(&component.uid), None)? else {
        return Ok(None);
    };
    let Some(port) = dest.port.as_deref() else {
        debug!(part = %dest.uid, %parameter, "wire destination has no port name");
        return Ok(None);
    };
    get_para_value(scope, table, &dest.uid, port).map(Some)
}

/// Literal value feeding `port` of part `part_uid` indirectly, through the
/// port linked to it in `table`.
pub fn get_para_value(
    scope: &NetworkScope<'_>,
    table: &FunctionPortTable,
    part_uid: &str,
    port: &str,
) -> Result<String, ResolveError> {
    linked_constant(scope, table, part_uid, port).map_err(|e| ResolveError::ParameterValue {
        part_uid: part_uid.to_string(),
        port: port.to_string(),
        source: Box::new(e),
    })
}

fn linked_constant(
    scope: &NetworkScope<'_>,
    table: &FunctionPortTable,
    part_uid: &str,
    port: &str,
) -> Result<String, ResolveError> {
    let part = scope
        .search_part(part_uid)
        .ok_or_else(|| ResolveError::NotFound(format!("Part {}", part_uid)))?;
    let linked = table.linked_port(&part.name, port);
    if linked.is_none() {
        debug!(part = %part.name, %port, "no linked port in function-port table");
    }
    let source = match linked {
        Some(linked) => scope.search_wire(None, Some((part_uid, linked)))?,
        None => None,
    };
    let source = source.ok_or_else(|| {
        ResolveError::NotFound(format!(
            "Wire into {} (UId {}) port '{}'",
            part.name,
            part_uid,
            linked.unwrap_or(port)
        ))
    })?;
    let access = scope
        .search_component(Some(&source.uid), None)?
        .ok_or_else(|| ResolveError::NotFound(format!("Component {}", source.uid)))?;
    access
        .literal_value()
        .ok_or_else(|| ResolveError::NotFound(format!("Literal constant at component {}", access.uid)))
}
