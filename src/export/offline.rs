//! [`PlcSoftware`] backed by block XML files that were exported earlier.
//!
//! The directory layout below the root becomes the block group tree, so an
//! export of `Program blocks/Library/Version/FC_12.xml` places `FC_12` in
//! group `Library/Version`.

use super::source::ContentSource;
use super::{CompilerMessage, MessageState, PlcSoftware};
use crate::model::{BlockGroup, BlockInfo};
use crate::network::NetworkDocument;
use crate::normalize;
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Name of the root block group.
pub const PROGRAM_BLOCKS: &str = "Program blocks";

/// A project made of previously exported block XML files.
pub struct ExportedProject<S: ContentSource> {
    source: S,
    tree: BlockGroup,
    files: BTreeMap<String, Utf8PathBuf>,
}

fn block_info_from_text(text: &str) -> Option<BlockInfo> {
    let doc = normalize::parse_str(text).ok()?;
    NetworkDocument::from_value(doc).ok()?.block_info()
}

fn group_path(root: &Utf8Path, file: &Utf8Path) -> Vec<String> {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Utf8Component::Normal(name) => Some(name.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

impl<S: ContentSource> ExportedProject<S> {
    /// Index every `*.xml` below `root` that is a program block export.
    pub fn open(mut source: S, root: impl AsRef<Utf8Path>) -> Result<Self> {
        let root = root.as_ref();
        let paths: Vec<Utf8PathBuf> = source
            .list_files(root)
            .with_context(|| format!("Failed to list exports in {}", root))?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("xml")))
            .collect();

        let mut texts: Vec<(Utf8PathBuf, String)> = Vec::new();
        for p in paths {
            match source.read_to_string(&p) {
                Ok(t) => texts.push((p, t)),
                Err(e) => warn!(path = %p, "skipping unreadable export: {:#}", e),
            }
        }
        let parsed: Vec<(Utf8PathBuf, Option<BlockInfo>)> = texts
            .par_iter()
            .map(|(p, t)| (p.clone(), block_info_from_text(t)))
            .collect();

        let mut tree = BlockGroup::new(PROGRAM_BLOCKS);
        let mut files = BTreeMap::new();
        for (path, info) in parsed {
            let Some(info) = info else {
                debug!(%path, "not a program block export");
                continue;
            };
            if let Some(existing) = files.get(&info.name) {
                warn!(block = %info.name, %path, %existing, "duplicate block export ignored");
                continue;
            }
            let groups = group_path(root, &path);
            let groups: Vec<&str> = groups.iter().map(String::as_str).collect();
            tree.group_mut(&groups).blocks.push(info.clone());
            files.insert(info.name, path);
        }
        info!(blocks = files.len(), %root, "indexed exported blocks");
        Ok(Self {
            source,
            tree,
            files,
        })
    }

    /// Source file a block was indexed from.
    pub fn file_of(&self, block_name: &str) -> Option<&Utf8Path> {
        self.files.get(block_name).map(|p| p.as_path())
    }
}

impl<S: ContentSource> PlcSoftware for ExportedProject<S> {
    fn block_tree(&self) -> &BlockGroup {
        &self.tree
    }

    fn source_file(&self, block: &BlockInfo) -> Option<Utf8PathBuf> {
        self.files
            .get(&block.name)
            .and_then(|file| self.source.local_path(file))
    }

    fn export_block(&mut self, block: &BlockInfo, path: &Utf8Path) -> Result<()> {
        let file = self
            .files
            .get(&block.name)
            .ok_or_else(|| anyhow!("Block {} has no export file", block.name))?;
        let text = self.source.read_to_string(file)?;
        std::fs::write(path.as_std_path(), text).with_context(|| format!("Failed to write {}", path))
    }

    fn compile_block(&mut self, block: &BlockInfo) -> Result<Vec<CompilerMessage>> {
        Ok(vec![CompilerMessage {
            path: block.name.clone(),
            description: "offline project cannot compile, re-export the block from the engineering system".to_string(),
            state: MessageState::Warning,
        }])
    }
}
