//! TIA Portal block inspection.
//!
//! This crate reads SimaticML exports of PLC program blocks and resolves
//! network parameters: given a block and the name of a tag, it follows the
//! block's ladder/FBD wiring to the literal constant feeding that tag. The
//! central block library check in [`library`] is built on top of it.
//!
//! The binary `tiaprobe` works on a directory or ZIP archive of exported
//! blocks.

pub mod config;
pub mod error;
pub mod export;
pub mod library;
pub mod model;
pub mod network;
pub mod normalize;
pub mod port_table;
pub mod resolver;

pub use error::ResolveError;
pub use export::{ExportedProject, PlcSoftware};
pub use port_table::FunctionPortTable;
pub use resolver::BlockParameterResolver;
