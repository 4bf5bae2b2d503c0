//! Block export.
//!
//! - [`PlcSoftware`] – the block tree, exporter, and compiler of one PLC
//! - [`export_block`] – export with a single compile-and-retry step
//! - [`offline`] – [`PlcSoftware`] over previously exported XML files
//! - [`source`] – File I/O abstraction (filesystem vs. ZIP)

pub mod offline;
pub mod source;

pub use offline::ExportedProject;
pub use source::*;

use crate::error::ResolveError;
use crate::model::{BlockGroup, BlockInfo};
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Severity of a compiler message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageState {
    Success,
    Information,
    Warning,
    Error,
}

/// One diagnostic produced by compiling a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerMessage {
    /// Location inside the project (block, network, ...).
    pub path: String,
    pub description: String,
    pub state: MessageState,
}

impl fmt::Display for CompilerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.description)
        } else {
            write!(f, "{}: {}", self.path, self.description)
        }
    }
}

/// The program side of one PLC: its block tree, an exporter, and a compiler.
pub trait PlcSoftware {
    /// Root of the program block tree.
    fn block_tree(&self) -> &BlockGroup;

    fn find_block(&self, name: &str) -> Option<BlockInfo> {
        self.block_tree().find_block(name).cloned()
    }

    /// Write the block's SimaticML export to `path`.
    ///
    /// Fails for blocks that must be compiled before they can be exported.
    fn export_block(&mut self, block: &BlockInfo, path: &Utf8Path) -> Result<()>;

    /// Compile the block and return the compiler's messages.
    fn compile_block(&mut self, block: &BlockInfo) -> Result<Vec<CompilerMessage>>;

    /// Local file the block is read from, when the software exports by copying.
    fn source_file(&self, _block: &BlockInfo) -> Option<Utf8PathBuf> {
        None
    }
}

fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn remove_stale(path: &Utf8Path) -> Result<(), ResolveError> {
    match std::fs::remove_file(path.as_std_path()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ResolveError::ExportFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Export `block` to `path`, replacing any file already there.
///
/// A failed export triggers one compile, then one more export attempt. The
/// second failure is terminal and carries the compiler's messages.
///
/// When `path` is the file the software reads the block from, it is left
/// untouched and used as is.
pub fn export_block<P: PlcSoftware + ?Sized>(
    software: &mut P,
    block: &BlockInfo,
    path: &Utf8Path,
) -> Result<(), ResolveError> {
    if software
        .source_file(block)
        .is_some_and(|source| same_file(&source, path))
    {
        info!(block = %block.name, %path, "export path is the source file, reusing it");
        return Ok(());
    }
    remove_stale(path)?;
    let first = match software.export_block(block, path) {
        Ok(()) => {
            info!(block = %block.name, %path, "exported");
            return Ok(());
        }
        Err(e) => e,
    };
    warn!(block = %block.name, "export failed, compiling before retry: {:#}", first);

    let messages = software
        .compile_block(block)
        .map_err(|e| ResolveError::NotExportable {
            block: block.name.clone(),
            reason: format!("compile failed: {:#}", e),
            diagnostics: Vec::new(),
        })?;
    let diagnostics: Vec<String> = messages.iter().map(|m| m.to_string()).collect();

    remove_stale(path)?;
    software
        .export_block(block, path)
        .map_err(|e| ResolveError::NotExportable {
            block: block.name.clone(),
            reason: format!("{:#}", e),
            diagnostics,
        })?;
    info!(block = %block.name, %path, "exported after compile");
    Ok(())
}
