#![allow(dead_code)]

use anyhow::Result;
use camino::Utf8Path;
use std::collections::HashMap;
use tiaprobe::PlcSoftware;
use tiaprobe::export::{CompilerMessage, MessageState};
use tiaprobe::model::{BlockGroup, BlockInfo, BlockKind};
use tiaprobe::network::NetworkDocument;
use tiaprobe::normalize;

pub const INTERFACE_NS: &str = "http://www.siemens.com/automation/Openness/SW/Interface/v5";
pub const FLGNET_NS: &str = "http://www.siemens.com/automation/Openness/SW/NetworkSource/FlgNet/v4";

/// A SimaticML block export. Each network is the inner XML of a FlgNet, or
/// a complete `<NetworkSource>` when it starts with `<NetworkSource`.
pub fn block_xml(element: &str, name: &str, number: u32, networks: &[String]) -> String {
    let mut units = String::new();
    for (i, body) in networks.iter().enumerate() {
        let source = if body.trim_start().starts_with("<NetworkSource") {
            body.clone()
        } else {
            format!(r#"<NetworkSource><FlgNet xmlns="{FLGNET_NS}">{body}</FlgNet></NetworkSource>"#)
        };
        units.push_str(&format!(
            r#"
      <SW.Blocks.CompileUnit ID="{:X}" CompositionName="CompileUnits">
        <AttributeList>
          {source}
          <ProgrammingLanguage>LAD</ProgrammingLanguage>
        </AttributeList>
      </SW.Blocks.CompileUnit>"#,
            3 + i * 5
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Document>
  <Engineering version="V17" />
  <{element} ID="0">
    <AttributeList>
      <Interface><Sections xmlns="{INTERFACE_NS}"><Section Name="Input" /><Section Name="Output" /></Sections></Interface>
      <MemoryLayout>Optimized</MemoryLayout>
      <Name>{name}</Name>
      <Number>{number}</Number>
      <ProgrammingLanguage>LAD</ProgrammingLanguage>
    </AttributeList>
    <ObjectList>{units}
    </ObjectList>
  </{element}>
</Document>
"#
    )
}

/// `'value' → MOVE.in`, `MOVE.out1 → tag`.
pub fn move_network(value: &str, tag: &str) -> String {
    format!(
        r#"
<Parts>
  <Access Scope="LiteralConstant" UId="21">
    <Constant>
      <ConstantType>String</ConstantType>
      <ConstantValue>'{value}'</ConstantValue>
    </Constant>
  </Access>
  <Access Scope="GlobalVariable" UId="22">
    <Symbol>
      <Component Name="{tag}" />
    </Symbol>
  </Access>
  <Part Name="Move" UId="23" DisabledENO="false">
    <TemplateValue Name="Card" Type="Cardinality">1</TemplateValue>
  </Part>
</Parts>
<Wires>
  <Wire UId="24">
    <Powerrail />
    <NameCon UId="23" Name="en" />
  </Wire>
  <Wire UId="25">
    <IdentCon UId="21" />
    <NameCon UId="23" Name="in" />
  </Wire>
  <Wire UId="26">
    <NameCon UId="23" Name="out1" />
    <IdentCon UId="22" />
  </Wire>
</Wires>"#
    )
}

/// A network with a single coil and no parameter of interest.
pub fn coil_network(tag: &str) -> String {
    format!(
        r#"
<Parts>
  <Access Scope="GlobalVariable" UId="21">
    <Symbol>
      <Component Name="{tag}" />
    </Symbol>
  </Access>
  <Part Name="Coil" UId="22" />
</Parts>
<Wires>
  <Wire UId="23">
    <Powerrail />
    <NameCon UId="22" Name="in" />
  </Wire>
  <Wire UId="24">
    <IdentCon UId="21" />
    <NameCon UId="22" Name="operand" />
  </Wire>
</Wires>"#
    )
}

pub fn parse_doc(xml: &str) -> NetworkDocument {
    NetworkDocument::from_value(normalize::parse_str(xml).expect("normalize")).expect("document")
}

pub fn block(name: &str, kind: BlockKind, number: u32) -> BlockInfo {
    BlockInfo {
        name: name.to_string(),
        number,
        kind,
        language: Some("LAD".to_string()),
        consistent: true,
        modified: None,
    }
}

/// In-memory PLC software. Export fails `failures_left` times before it
/// starts writing the stored XML.
pub struct FakeSoftware {
    pub tree: BlockGroup,
    pub exports: HashMap<String, String>,
    pub failures_left: usize,
    pub export_calls: usize,
    pub compile_calls: usize,
}

impl FakeSoftware {
    pub fn new(blocks: Vec<(BlockInfo, String)>) -> Self {
        let mut tree = BlockGroup::new("Program blocks");
        let mut exports = HashMap::new();
        for (info, xml) in blocks {
            exports.insert(info.name.clone(), xml);
            tree.blocks.push(info);
        }
        Self {
            tree,
            exports,
            failures_left: 0,
            export_calls: 0,
            compile_calls: 0,
        }
    }
}

impl PlcSoftware for FakeSoftware {
    fn block_tree(&self) -> &BlockGroup {
        &self.tree
    }

    fn export_block(&mut self, block: &BlockInfo, path: &Utf8Path) -> Result<()> {
        self.export_calls += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            anyhow::bail!("Block {} must be compiled before it can be exported", block.name);
        }
        let text = self
            .exports
            .get(&block.name)
            .ok_or_else(|| anyhow::anyhow!("no export for {}", block.name))?;
        std::fs::write(path.as_std_path(), text)?;
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockInfo) -> Result<Vec<CompilerMessage>> {
        self.compile_calls += 1;
        Ok(vec![CompilerMessage {
            path: block.name.clone(),
            description: "Compiling finished (errors: 0; warnings: 1)".to_string(),
            state: MessageState::Warning,
        }])
    }
}
