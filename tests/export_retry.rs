mod common;

use camino::Utf8PathBuf;
use common::*;
use tempfile::tempdir;
use tiaprobe::model::BlockKind;
use tiaprobe::{BlockParameterResolver, FunctionPortTable, ResolveError};

fn software() -> FakeSoftware {
    let xml = block_xml("SW.Blocks.FC", "Move_Version", 12, &[move_network("3.1.0", "libVersion")]);
    FakeSoftware::new(vec![(block("Move_Version", BlockKind::Function, 12), xml)])
}

fn export_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().join("exports")).unwrap();
    (tmp, dir)
}

#[test]
fn get_nwk_para_exports_and_resolves() {
    let (_tmp, dir) = export_dir();
    let mut resolver = BlockParameterResolver::new(software(), &dir, FunctionPortTable::builtin());
    let value = resolver.get_nwk_para("Move_Version", "libVersion").unwrap();
    assert_eq!(value, "3.1.0");
    assert!(dir.join("FC_12.xml").exists());
    assert_eq!(resolver.software().export_calls, 1);
    assert_eq!(resolver.software().compile_calls, 0);
}

#[test]
fn failed_export_is_retried_once_after_compiling() {
    let (_tmp, dir) = export_dir();
    let mut sw = software();
    sw.failures_left = 1;
    let mut resolver = BlockParameterResolver::new(sw, &dir, FunctionPortTable::builtin());
    let value = resolver.get_nwk_para("Move_Version", "libVersion").unwrap();
    assert_eq!(value, "3.1.0");
    assert_eq!(resolver.software().export_calls, 2);
    assert_eq!(resolver.software().compile_calls, 1);
}

#[test]
fn second_export_failure_is_terminal() {
    let (_tmp, dir) = export_dir();
    let mut sw = software();
    sw.failures_left = 5;
    let mut resolver = BlockParameterResolver::new(sw, &dir, FunctionPortTable::builtin());
    let err = resolver.get_nwk_para("Move_Version", "libVersion").unwrap_err();
    match &err {
        ResolveError::NotExportable { block, diagnostics, .. } => {
            assert_eq!(block, "Move_Version");
            assert_eq!(diagnostics.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Compiling finished"));
    assert_eq!(resolver.software().export_calls, 2);
    assert_eq!(resolver.software().compile_calls, 1);
}

#[test]
fn stale_export_file_is_replaced() {
    let (_tmp, dir) = export_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("FC_12.xml"), "<stale/>").unwrap();
    let mut resolver = BlockParameterResolver::new(software(), &dir, FunctionPortTable::builtin());
    assert_eq!(resolver.get_nwk_para("Move_Version", "libVersion").unwrap(), "3.1.0");
    let text = std::fs::read_to_string(dir.join("FC_12.xml")).unwrap();
    assert!(text.contains("Move_Version"));
}

#[test]
fn every_call_exports_again() {
    let (_tmp, dir) = export_dir();
    let mut resolver = BlockParameterResolver::new(software(), &dir, FunctionPortTable::builtin());
    resolver.get_nwk_para("Move_Version", "libVersion").unwrap();
    resolver.get_nwk_para("Move_Version", "libVersion").unwrap();
    assert_eq!(resolver.software().export_calls, 2);
}

#[test]
fn unknown_block_and_parameter_are_reported() {
    let (_tmp, dir) = export_dir();
    let mut resolver = BlockParameterResolver::new(software(), &dir, FunctionPortTable::builtin());
    assert!(matches!(
        resolver.get_nwk_para("Nope", "libVersion"),
        Err(ResolveError::BlockNotFound(_))
    ));
    let err = resolver.get_nwk_para("Move_Version", "buildNumber").unwrap_err();
    assert!(matches!(err, ResolveError::ParameterNotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Parameter 'buildNumber' not found in block 'Move_Version'"
    );
}
