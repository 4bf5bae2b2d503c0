use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

/// Category of a program block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// `FC`
    Function,
    /// `FB`
    FunctionBlock,
    /// `OB`
    OrganizationBlock,
    /// Global, instance, and array data blocks.
    DataBlock,
}

impl BlockKind {
    /// Map the SimaticML element name (e.g. `SW.Blocks.FB`) to a block kind.
    pub fn from_element(element: &str) -> Option<Self> {
        match element.strip_prefix("SW.Blocks.")? {
            "FC" => Some(BlockKind::Function),
            "FB" => Some(BlockKind::FunctionBlock),
            "OB" => Some(BlockKind::OrganizationBlock),
            "GlobalDB" | "InstanceDB" | "ArrayDB" => Some(BlockKind::DataBlock),
            _ => None,
        }
    }

    /// Short prefix used for export file names.
    pub fn prefix(self) -> &'static str {
        match self {
            BlockKind::Function => "FC",
            BlockKind::FunctionBlock => "FB",
            BlockKind::OrganizationBlock => "OB",
            BlockKind::DataBlock => "DB",
        }
    }
}

/// A named, numbered program unit belonging to one PLC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub name: String,
    pub number: u32,
    pub kind: BlockKind,
    /// Programming language of the block body (`LAD`, `FBD`, `SCL`, ...).
    #[serde(default)]
    pub language: Option<String>,
    pub consistent: bool,
    /// Last modification timestamp as reported by the engineering system.
    #[serde(default)]
    pub modified: Option<String>,
}

impl BlockInfo {
    /// File name the block is exported to, e.g. `FC_12.xml`.
    pub fn export_file_name(&self) -> String {
        format!("{}_{}.xml", self.kind.prefix(), self.number)
    }
}

/// A folder in the PLC's program block tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGroup {
    pub name: String,
    pub blocks: Vec<BlockInfo>,
    pub groups: Vec<BlockGroup>,
}

impl BlockGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// All blocks in this group and its subgroups, depth first.
    pub fn all_blocks(&self) -> Vec<&BlockInfo> {
        let mut out: Vec<&BlockInfo> = self.blocks.iter().collect();
        for group in &self.groups {
            out.extend(group.all_blocks());
        }
        out
    }

    pub fn find_block(&self, name: &str) -> Option<&BlockInfo> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .or_else(|| self.groups.iter().find_map(|g| g.find_block(name)))
    }

    /// Return the subgroup at `path`, creating missing groups along the way.
    pub fn group_mut(&mut self, path: &[&str]) -> &mut BlockGroup {
        let Some((first, rest)) = path.split_first() else {
            return self;
        };
        let idx = match self.groups.iter().position(|g| g.name == *first) {
            Some(idx) => idx,
            None => {
                self.groups.push(BlockGroup::new(*first));
                self.groups.len() - 1
            }
        };
        self.groups[idx].group_mut(rest)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Network elements
// ────────────────────────────────────────────────────────────────────────────

/// A functional element placed in a network: an instruction (`Part`) or a
/// block call (`Call`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    pub uid: String,
    /// Instruction name (e.g. `Move`) or the called block's name.
    pub name: String,
    pub disabled: bool,
}

/// Literal or named constant carried by an access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    /// Set for global/local named constants.
    pub name: Option<String>,
    pub constant_type: Option<String>,
    pub value: Option<String>,
}

/// A reference to a tag, literal constant, or other value bound to a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Access {
    pub uid: String,
    pub scope: String,
    /// Symbol components, outermost first (`"Data".version` → `["Data", "version"]`).
    pub symbol: Vec<String>,
    pub constant: Option<Constant>,
}

impl Access {
    /// Literal constants carry no name and can only be addressed by UId.
    pub fn is_literal(&self) -> bool {
        matches!(self.scope.as_str(), "LiteralConstant" | "TypedConstant")
    }

    pub fn matches_name(&self, name: &str) -> bool {
        if self.is_literal() {
            return false;
        }
        if let Some(constant_name) = self.constant.as_ref().and_then(|c| c.name.as_deref()) {
            if constant_name == name {
                return true;
            }
        }
        self.symbol.iter().any(|c| c == name) || self.symbol.join(".") == name
    }

    /// Literal value with one pair of surrounding single quotes removed.
    pub fn literal_value(&self) -> Option<String> {
        let raw = self.constant.as_ref()?.value.as_deref()?.trim();
        let unquoted = raw
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .unwrap_or(raw);
        Some(unquoted.to_string())
    }
}

/// One end of a wire: `IdentCon` carries only a UId, `NameCon` also names a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireEnd {
    pub uid: String,
    pub port: Option<String>,
}
