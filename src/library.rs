//! Central block library check.
//!
//! Each library block publishes its version as a constant moved into a
//! version parameter (by default `libVersion`). The check resolves that
//! parameter in the program's copy of every library block and compares it
//! with the version the central library expects.

use crate::config::LibraryConfig;
use crate::export::PlcSoftware;
use crate::resolver::BlockParameterResolver;
use serde::Serialize;
use tracing::info;

/// Outcome for one library block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LibraryStatus {
    Current,
    Outdated { found: String },
    Missing,
    Unresolved { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryFinding {
    pub block: String,
    pub expected: String,
    #[serde(flatten)]
    pub status: LibraryStatus,
}

impl LibraryFinding {
    pub fn is_current(&self) -> bool {
        self.status == LibraryStatus::Current
    }
}

/// Check every block listed in `library` against the program.
///
/// Blocks the program does not contain are reported as missing.
pub fn check_library<P: PlcSoftware>(
    resolver: &mut BlockParameterResolver<P>,
    library: &LibraryConfig,
    version_parameter: &str,
) -> Vec<LibraryFinding> {
    let mut findings = Vec::new();
    for (block, expected) in &library.blocks {
        let status = if resolver.software().find_block(block).is_none() {
            LibraryStatus::Missing
        } else {
            match resolver.get_nwk_para(block, version_parameter) {
                Ok(found) if found == *expected => LibraryStatus::Current,
                Ok(found) => LibraryStatus::Outdated { found },
                Err(e) => LibraryStatus::Unresolved {
                    reason: e.to_string(),
                },
            }
        };
        findings.push(LibraryFinding {
            block: block.clone(),
            expected: expected.clone(),
            status,
        });
    }
    let current = findings.iter().filter(|f| f.is_current()).count();
    info!(checked = findings.len(), current, "library check finished");
    findings
}
