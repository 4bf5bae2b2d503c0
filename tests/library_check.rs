mod common;

use camino::Utf8PathBuf;
use common::*;
use tempfile::tempdir;
use tiaprobe::config::LibraryConfig;
use tiaprobe::library::{LibraryStatus, check_library};
use tiaprobe::model::BlockKind;
use tiaprobe::{BlockParameterResolver, FunctionPortTable};

#[test]
fn library_blocks_are_compared_with_expected_versions() {
    let sw = FakeSoftware::new(vec![
        (
            block("Move_Version", BlockKind::Function, 12),
            block_xml("SW.Blocks.FC", "Move_Version", 12, &[move_network("3.1.0", "libVersion")]),
        ),
        (
            block("Valve", BlockKind::FunctionBlock, 30),
            block_xml("SW.Blocks.FB", "Valve", 30, &[move_network("1.9.0", "libVersion")]),
        ),
        (
            block("Pump", BlockKind::FunctionBlock, 31),
            block_xml("SW.Blocks.FB", "Pump", 31, &[coil_network("Run")]),
        ),
    ]);
    let tmp = tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    let mut resolver = BlockParameterResolver::new(sw, &dir, FunctionPortTable::builtin());

    let mut library = LibraryConfig::default();
    for (name, version) in [("Move_Version", "3.1.0"), ("Valve", "2.0.0"), ("Pump", "1.0.0"), ("Mixer", "1.0.0")] {
        library.blocks.insert(name.to_string(), version.to_string());
    }

    let findings = check_library(&mut resolver, &library, "libVersion");
    // BTreeMap order: Mixer, Move_Version, Pump, Valve
    let statuses: Vec<(&str, &LibraryStatus)> =
        findings.iter().map(|f| (f.block.as_str(), &f.status)).collect();
    assert_eq!(statuses[0], ("Mixer", &LibraryStatus::Missing));
    assert_eq!(statuses[1], ("Move_Version", &LibraryStatus::Current));
    assert!(matches!(statuses[2].1, LibraryStatus::Unresolved { reason } if reason.contains("not found")));
    assert_eq!(
        statuses[3],
        ("Valve", &LibraryStatus::Outdated { found: "1.9.0".to_string() })
    );

    let json = serde_json::to_value(&findings[3]).unwrap();
    assert_eq!(json["status"], "outdated");
    assert_eq!(json["found"], "1.9.0");
    assert_eq!(json["expected"], "2.0.0");
}
