//! Batch extraction through a stand-in for the external tool.
//!
//! The stand-in is a shell script run as `sh <stub> -o -Q <script> <archive> <out>`. It writes
//! every quoted name of the script as a file containing that name, skipping names containing
//! `fail`, and records each run next to itself.
#![cfg(unix)]

use std::{fs, path::Path, sync::Arc};

use arcx_core::{
    error::Result,
    export::{export_all, ExportOptions},
    exporter::{ExternalTool, ExternalToolExporter, ToolMode},
    BatchExporter, CancellationToken, Container, Exporter, ExtractStatus, Resource,
    ResourceTable,
};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

const WRITING_STUB: &str = r#"echo run >> "$(dirname "$0")/runs"
shift 2
if [ "$1" = "-f" ]; then shift 2; fi
script="$1"
out="$3"
grep -o '"[^"]*"' "$script" | tr -d '"' | while IFS= read -r name; do
    case "$name" in *fail*) continue ;; esac
    mkdir -p "$out/$(dirname "$name")"
    printf '%s' "$name" > "$out/$name"
done
"#;

const FAILING_STUB: &str = "exit 3\n";

fn exporter(dir: &Path, stub: &str) -> Result<Arc<dyn Exporter>> {
    let path = dir.join("stub.sh");
    fs::write(&path, stub)?;
    let tool = ExternalTool::new("sh", vec![path.display().to_string()]);
    Ok(Arc::new(ExternalToolExporter::new(
        Arc::new(tool),
        ToolMode::SingleRun {
            comtype: "lzss".to_owned(),
        },
    )))
}

fn table(names: &[&str], exporter: &Arc<dyn Exporter>) -> ResourceTable {
    let container = Arc::new(Container::from_bytes("packed.bin", vec![0u8; 64]));
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Resource::builder()
                .name(*name)
                .offset(i as u64 * 8)
                .compressed_length(8)
                .decompressed_length(16)
                .exporter(exporter.clone())
                .container(container.clone())
                .build()
        })
        .collect()
}

fn export(table: &mut ResourceTable, out_dir: &Path) -> Result<arcx_core::export::ExportReport> {
    export_all(
        table,
        &ExportOptions::builder().out_dir(out_dir).build(),
        &CancellationToken::new(),
    )
}

#[traced_test]
#[test]
fn every_resource_produced() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), WRITING_STUB)?;
    let mut table = table(&["one.txt", "nested/two.txt"], &exporter);

    let out_dir = dir.path().join("out");
    let report = export(&mut table, &out_dir)?;

    assert_eq!(report.status, ExtractStatus::All);
    assert_eq!(report.exported, 2);
    assert_eq!(fs::read_to_string(out_dir.join("one.txt"))?, "one.txt");
    assert_eq!(fs::read_to_string(out_dir.join("nested/two.txt"))?, "nested/two.txt");
    assert_eq!(table[1].exported_path(), Some(out_dir.join("nested/two.txt").as_path()));

    // one run for the whole batch
    assert_eq!(fs::read_to_string(dir.path().join("runs"))?.lines().count(), 1);
    Ok(())
}

#[traced_test]
#[test]
fn some_resources_produced() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), WRITING_STUB)?;
    let mut table = table(&["one.txt", "fail.txt", "three.txt"], &exporter);

    let out_dir = dir.path().join("out");
    let report = export(&mut table, &out_dir)?;

    assert_eq!(report.status, ExtractStatus::Some);
    assert_eq!(report.exported, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].name, "fail.txt");
    assert!(!table[1].is_exported());
    assert!(table[2].is_exported());
    assert!(!out_dir.join("fail.txt").exists());
    Ok(())
}

#[traced_test]
#[test]
fn failing_tool_produces_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), FAILING_STUB)?;
    let mut table = table(&["one.txt", "two.txt"], &exporter);

    let out_dir = dir.path().join("out");
    let report = export(&mut table, &out_dir)?;

    assert_eq!(report.status, ExtractStatus::None);
    assert_eq!(report.exported, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(table.iter().all(|r| !r.is_exported()));
    Ok(())
}

#[test]
fn missing_tool_fails_every_member() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let tool = ExternalTool::new(dir.path().join("no-such-tool"), Vec::new());
    let exporter: Arc<dyn Exporter> = Arc::new(ExternalToolExporter::new(
        Arc::new(tool),
        ToolMode::SingleRun {
            comtype: "lzss".to_owned(),
        },
    ));
    let mut table = table(&["one.txt", "two.txt"], &exporter);

    let report = export(&mut table, dir.path())?;
    assert_eq!(report.status, ExtractStatus::None);
    assert!(report
        .failures
        .iter()
        .all(|f| f.reason.contains("unavailable")));
    Ok(())
}

#[test]
fn single_resource_through_the_tool() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), WRITING_STUB)?;
    let table = table(&["solo.bin"], &exporter);

    assert_eq!(table[0].read()?, b"solo.bin");
    Ok(())
}

#[traced_test]
#[test]
fn names_escaping_the_output_never_reach_the_tool() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), WRITING_STUB)?;
    let table = table(&["kept.txt", "../escaped.txt", "/abs/escaped.txt"], &exporter);

    let out_dir = dir.path().join("a/out");
    let resources: Vec<&Resource> = table.iter().collect();
    let batch = exporter.as_batch().expect("external exporter batches");
    let outcome = batch.produce_batch(table[0].container(), &resources, &out_dir)?;

    assert_eq!(outcome.status, ExtractStatus::Some);
    assert_eq!(outcome.outputs, vec![Some(out_dir.join("kept.txt")), None, None]);
    assert!(!dir.path().join("a/escaped.txt").exists());
    assert!(logs_contain("refusing to extract resource"));

    assert!(table[1].read().is_err());
    Ok(())
}

#[traced_test]
#[test]
fn failed_move_only_fails_its_own_resource() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let exporter = exporter(dir.path(), WRITING_STUB)?;
    let mut table = table(&["one.txt", "blocked.txt", "three.txt"], &exporter);

    // a non-empty directory where a file should go
    let out_dir = dir.path().join("out");
    fs::create_dir_all(out_dir.join("blocked.txt/inner"))?;

    let report = export_all(
        &mut table,
        &ExportOptions::builder().out_dir(&out_dir).overwrite(true).build(),
        &CancellationToken::new(),
    )?;

    assert_eq!(report.status, ExtractStatus::Some);
    assert_eq!(report.exported, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "blocked.txt");
    assert!(table[0].is_exported());
    assert!(!table[1].is_exported());
    assert!(table[2].is_exported());
    assert_eq!(fs::read_to_string(out_dir.join("three.txt"))?, "three.txt");
    assert!(logs_contain("unable to move resource into place"));
    Ok(())
}
