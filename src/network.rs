//! Views over a normalized SimaticML block document.
//!
//! A [`NetworkDocument`] wraps the normalized mapping of one exported block.
//! Its networks (`SW.Blocks.CompileUnit`) keep their parts and wires under a
//! namespace prefix (`ns0`, `ns1`, ...) that depends on which namespaces the
//! export happened to declare. [`Network::resolve_scope`] is the only place
//! that guesses the prefix; everything below it works on a [`NetworkScope`]
//! that already knows it.

use crate::error::ResolveError;
use crate::model::*;
use crate::normalize::{as_list, attr, root_element, text_of};
use serde_json::Value;
use tracing::debug;

/// Network bodies written in a textual language; they carry no FlgNet.
const TEXTUAL_BODIES: &[&str] = &["StructuredText", "StatementList"];

/// Normalized XML of one exported block.
#[derive(Debug, Clone)]
pub struct NetworkDocument {
    root_name: String,
    root: Value,
}

impl NetworkDocument {
    /// Wrap a normalized document (a mapping with a single root element).
    pub fn from_value(doc: Value) -> Result<Self, ResolveError> {
        let (name, _) =
            root_element(&doc).map_err(|e| ResolveError::StructuralMismatch(e.to_string()))?;
        let root_name = name.to_string();
        let root = match doc {
            Value::Object(mut map) => map.remove(&root_name).unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Ok(Self { root_name, root })
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Number of contiguous namespace bindings `ns0`, `ns1`, ... declared on
    /// the root, stopping at the first missing index.
    pub fn namespace_count(&self) -> usize {
        (0..)
            .take_while(|idx| self.root.get(format!("@xmlns:ns{}", idx)).is_some())
            .count()
    }

    /// The block element (`SW.Blocks.FC`, `SW.Blocks.FB`, ...) and its kind.
    fn block_element(&self) -> Option<(BlockKind, &Value)> {
        let map = self.root.as_object()?;
        map.iter()
            .find_map(|(key, value)| BlockKind::from_element(key).map(|kind| (kind, value)))
    }

    /// Block metadata from the block element's `AttributeList`.
    pub fn block_info(&self) -> Option<BlockInfo> {
        let (kind, block) = self.block_element()?;
        let attrs = block.get("AttributeList")?;
        let field = |name: &str| attrs.get(name).and_then(text_of).map(|s| s.trim().to_string());
        let name = field("Name")?;
        let number = field("Number")?.parse::<u32>().ok()?;
        let consistent = field("IsConsistent")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        Some(BlockInfo {
            name,
            number,
            kind,
            language: field("ProgrammingLanguage"),
            consistent,
            modified: field("ModifiedDate"),
        })
    }

    /// Networks in document order.
    pub fn networks(&self) -> Result<Vec<Network<'_>>, ResolveError> {
        let (_, block) = self.block_element().ok_or_else(|| {
            ResolveError::StructuralMismatch(format!(
                "no program block element under <{}>",
                self.root_name
            ))
        })?;
        let units = block
            .get("ObjectList")
            .and_then(|list| list.get("SW.Blocks.CompileUnit"))
            .ok_or_else(|| {
                ResolveError::StructuralMismatch("block has no networks".to_string())
            })?;
        Ok(as_list(Some(units))
            .into_iter()
            .enumerate()
            .map(|(index, unit)| Network { index, unit })
            .collect())
    }
}

/// One compile unit of a block.
#[derive(Debug, Clone, Copy)]
pub struct Network<'a> {
    index: usize,
    unit: &'a Value,
}

impl<'a> Network<'a> {
    /// Position in the document (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Network ID; the export writes it in hexadecimal.
    pub fn id(&self) -> Option<u32> {
        attr(self.unit, "ID").and_then(|id| u32::from_str_radix(id, 16).ok())
    }

    fn source(&self) -> Option<&'a Value> {
        self.unit
            .get("AttributeList")
            .and_then(|a| a.get("NetworkSource"))
            .filter(|s| !s.is_null())
    }

    /// Parts and wires of this network under namespace `ns{ns}`, if its
    /// FlgNet lives there.
    pub fn scope(&self, ns: usize) -> Result<Option<NetworkScope<'a>>, ResolveError> {
        let prefix = format!("ns{}", ns);
        let Some(flgnet) = self.source().and_then(|s| s.get(format!("{}:FlgNet", prefix))) else {
            return Ok(None);
        };
        let parts = flgnet.get(format!("{}:Parts", prefix)).ok_or_else(|| {
            ResolveError::StructuralMismatch(format!(
                "network {} has no {}:Parts container",
                self.label(),
                prefix
            ))
        })?;
        let wires = flgnet.get(format!("{}:Wires", prefix));
        Ok(Some(NetworkScope {
            prefix,
            parts,
            wires,
        }))
    }

    /// Find the namespace that holds this network's FlgNet by trying
    /// `ns0..ns{count}` in ascending order.
    ///
    /// Empty networks and textual (SCL/STL) bodies yield `None`. A body that
    /// is neither is reported as a structural mismatch.
    pub fn resolve_scope(&self, ns_count: usize) -> Result<Option<NetworkScope<'a>>, ResolveError> {
        for ns in 0..ns_count {
            if let Some(scope) = self.scope(ns)? {
                return Ok(Some(scope));
            }
        }
        let Some(source) = self.source() else {
            debug!(network = %self.label(), "empty network");
            return Ok(None);
        };
        let textual = source.as_object().is_some_and(|map| {
            map.keys()
                .any(|k| TEXTUAL_BODIES.contains(&local_name(k)))
        });
        if textual {
            debug!(network = %self.label(), "textual network body, skipped");
            return Ok(None);
        }
        Err(ResolveError::StructuralMismatch(format!(
            "network {} has no FlgNet under any of {} declared namespaces",
            self.label(),
            ns_count
        )))
    }

    fn label(&self) -> String {
        match self.id() {
            Some(id) => format!("#{} (ID {:X})", self.index + 1, id),
            None => format!("#{}", self.index + 1),
        }
    }
}

fn local_name(key: &str) -> &str {
    key.split_once(':').map(|(_, local)| local).unwrap_or(key)
}

#[derive(Clone, Copy)]
enum ComponentKey<'k> {
    Uid(&'k str),
    Name(&'k str),
}

/// The parts and wires of one network under a known namespace prefix.
#[derive(Debug, Clone)]
pub struct NetworkScope<'a> {
    prefix: String,
    parts: &'a Value,
    wires: Option<&'a Value>,
}

impl<'a> NetworkScope<'a> {
    /// Scope over a FlgNet's `Parts` and `Wires` containers keyed under `prefix`.
    pub fn new(prefix: impl Into<String>, parts: &'a Value, wires: Option<&'a Value>) -> Self {
        Self {
            prefix: prefix.into(),
            parts,
            wires,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, local: &str) -> String {
        format!("{}:{}", self.prefix, local)
    }

    fn child<'v>(&self, value: &'v Value, local: &str) -> Option<&'v Value> {
        value.get(self.key(local))
    }

    fn children<'v>(&self, value: &'v Value, local: &str) -> Vec<&'v Value> {
        as_list(self.child(value, local))
    }

    fn access_from(&self, entry: &Value) -> Option<Access> {
        let uid = attr(entry, "UId")?.to_string();
        let scope = attr(entry, "Scope").unwrap_or_default().to_string();
        let symbol = self
            .child(entry, "Symbol")
            .map(|s| {
                self.children(s, "Component")
                    .into_iter()
                    .filter_map(|c| attr(c, "Name").map(str::to_string))
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();
        let constant = self.child(entry, "Constant").map(|c| Constant {
            name: attr(c, "Name").map(str::to_string),
            constant_type: self
                .child(c, "ConstantType")
                .and_then(text_of)
                .map(str::to_string),
            value: self
                .child(c, "ConstantValue")
                .and_then(text_of)
                .map(str::to_string),
        });
        Some(Access {
            uid,
            scope,
            symbol,
            constant,
        })
    }

    /// Find an access by UId or by name. Exactly one selector must be given.
    ///
    /// Literal constants are only matched by UId.
    pub fn search_component(
        &self,
        uid: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<Access>, ResolveError> {
        let key = match (uid, name) {
            (Some(uid), None) => ComponentKey::Uid(uid),
            (None, Some(name)) => ComponentKey::Name(name),
            (Some(_), Some(_)) => {
                return Err(ResolveError::InvalidArguments(
                    "search_component takes a UId or a name, not both",
                ));
            }
            (None, None) => {
                return Err(ResolveError::InvalidArguments(
                    "search_component needs a UId or a name",
                ));
            }
        };
        Ok(self
            .children(self.parts, "Access")
            .into_iter()
            .filter_map(|entry| self.access_from(entry))
            .find(|access| match key {
                ComponentKey::Uid(uid) => access.uid == uid,
                ComponentKey::Name(name) => access.matches_name(name),
            }))
    }

    /// Follow a wire in one of two modes:
    ///
    /// - `comp_uid`: wire whose `IdentCon` is this component; returns its
    ///   destination `NameCon` (part UId and port).
    /// - `target`: wire into `(part UId, port)`; returns the `IdentCon` source.
    ///
    /// Wires without an `IdentCon` are skipped.
    pub fn search_wire(
        &self,
        comp_uid: Option<&str>,
        target: Option<(&str, &str)>,
    ) -> Result<Option<WireEnd>, ResolveError> {
        if comp_uid.is_some() == target.is_some() {
            return Err(ResolveError::InvalidArguments(
                "search_wire takes either a component UId or a target part and port",
            ));
        }
        let Some(wires) = self.wires else {
            return Ok(None);
        };
        for wire in self.children(wires, "Wire") {
            let Some(source_uid) = self.child(wire, "IdentCon").and_then(|c| attr(c, "UId"))
            else {
                continue;
            };
            let destinations: Vec<WireEnd> = self
                .children(wire, "NameCon")
                .into_iter()
                .filter_map(|c| {
                    Some(WireEnd {
                        uid: attr(c, "UId")?.to_string(),
                        port: attr(c, "Name").map(str::to_string),
                    })
                })
                .collect();
            match (comp_uid, target) {
                (Some(comp_uid), _) if source_uid == comp_uid => {
                    if let Some(dest) = destinations.into_iter().next() {
                        return Ok(Some(dest));
                    }
                }
                (_, Some((part_uid, port))) => {
                    let hit = destinations.iter().any(|d| {
                        d.uid == part_uid && d.port.as_deref().is_some_and(|p| p.eq_ignore_ascii_case(port))
                    });
                    if hit {
                        return Ok(Some(WireEnd {
                            uid: source_uid.to_string(),
                            port: None,
                        }));
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Find a part (instruction or block call) by UId.
    pub fn search_part(&self, uid: &str) -> Option<Part> {
        let parts = self.children(self.parts, "Part").into_iter().filter_map(|p| {
            Some(Part {
                uid: attr(p, "UId")?.to_string(),
                name: attr(p, "Name")?.to_string(),
                disabled: attr(p, "DisabledENO").is_some_and(|v| v == "true"),
            })
        });
        let calls = self.children(self.parts, "Call").into_iter().filter_map(|c| {
            let info = self.child(c, "CallInfo")?;
            Some(Part {
                uid: attr(c, "UId")?.to_string(),
                name: attr(info, "Name")?.to_string(),
                disabled: attr(c, "DisabledENO").is_some_and(|v| v == "true"),
            })
        });
        parts.chain(calls).find(|p| p.uid == uid)
    }
}
