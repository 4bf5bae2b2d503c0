//! Function-port table: for each instruction or block type, which port is
//! internally linked to which other port.
//!
//! Resolving a parameter lands on the port a tag is wired to (usually an
//! output). The value of interest sits on the linked port (usually the input),
//! e.g. for `MOVE` the value written to `out1` comes from `in`.

use std::collections::BTreeMap;

/// Static lookup `part name (lower case) → port → linked port`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionPortTable {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl FunctionPortTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the instructions libraries commonly use to
    /// publish a version or configuration constant.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for instruction in ["move", "s_move", "convert", "round", "trunc", "ceil", "floor"] {
            table.insert(instruction, "out", "in");
        }
        for comparator in ["eq", "ne", "gt", "ge", "lt", "le", "cmp"] {
            table.insert(comparator, "in1", "in2");
            table.insert(comparator, "in2", "in1");
        }
        table.insert("sel", "out", "in1");
        table.insert("s_conv", "out", "in");
        table
    }

    /// Add or replace one entry. Part and port names are stored lower-cased.
    pub fn insert(&mut self, part: &str, port: &str, linked: impl Into<String>) {
        self.entries
            .entry(part.to_lowercase())
            .or_default()
            .insert(port.to_lowercase(), linked.into());
    }

    /// Merge a `part → port → linked port` mapping on top of this table.
    pub fn extend(&mut self, overrides: &BTreeMap<String, BTreeMap<String, String>>) {
        for (part, ports) in overrides {
            for (port, linked) in ports {
                self.insert(part, port, linked.clone());
            }
        }
    }

    pub fn contains_part(&self, part: &str) -> bool {
        self.entries.contains_key(&part.to_lowercase())
    }

    /// Port internally linked to `port` on a part named `part`.
    ///
    /// Matching ignores case. The full port name is tried first, then the
    /// name with trailing digits removed, so indexed ports (`IN1`, `IN2`,
    /// `out3`) share one entry.
    pub fn linked_port(&self, part: &str, port: &str) -> Option<&str> {
        let ports = self.entries.get(&part.to_lowercase())?;
        ports
            .get(&port.to_lowercase())
            .or_else(|| ports.get(&strip_index(port)))
            .map(String::as_str)
    }
}

/// Lower-case a port name and drop its trailing digit sequence.
fn strip_index(port: &str) -> String {
    port.to_lowercase()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_index_drops_trailing_digits_only() {
        assert_eq!(strip_index("IN12"), "in");
        assert_eq!(strip_index("out"), "out");
        assert_eq!(strip_index("in2a"), "in2a");
    }

    #[test]
    fn builtin_covers_move_outputs() {
        let table = FunctionPortTable::builtin();
        assert_eq!(table.linked_port("Move", "out1"), Some("in"));
        assert_eq!(table.linked_port("MOVE", "out2"), Some("in"));
        assert_eq!(table.linked_port("Eq", "in1"), Some("in2"));
        assert_eq!(table.linked_port("Add", "out"), None);
    }
}
