use std::sync::Arc;

use arcx_core::{
    export::{export_all, ExportOptions},
    CancellationToken, Container, Error, ExtractStatus, Result, Settings,
};
use arcx_etc::{decode_image, BlockFormat};
use arcx_formats::builtin_registry;
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

#[rustfmt::skip]
const INDIVIDUAL: [u8; 8] = [0x8F, 0x40, 0x1C, 0x24, 0x0F, 0x0F, 0x33, 0x55];

fn pkm(version: &[u8; 2], format: u16, padded: (u16, u16), size: (u16, u16), blocks: &[u8]) -> Vec<u8> {
    let mut bytes = b"PKM ".to_vec();
    bytes.extend(version);
    for field in [format, padded.0, padded.1, size.0, size.1] {
        bytes.extend(field.to_be_bytes());
    }
    bytes.extend(blocks);
    bytes
}

fn container(name: &str, bytes: Vec<u8>) -> Arc<Container> {
    Arc::new(Container::from_bytes(name, bytes))
}

#[traced_test]
#[test]
fn single_block_texture() -> Result<()> {
    let bytes = pkm(b"10", 0, (4, 4), (4, 4), &INDIVIDUAL);
    let opened = builtin_registry().open(container("stone.pkm", bytes), &Settings::default())?;

    assert_eq!(opened.plugin, "pkm");
    assert_eq!(opened.table.len(), 1);

    let resource = &opened.table[0];
    assert_eq!(resource.name(), "stone.rgba");
    assert_eq!(resource.offset(), 16);
    assert_eq!(resource.compressed_length(), 8);
    assert_eq!(resource.decompressed_length(), 64);
    assert_eq!(resource.compression_tag(), "etc1");

    let rgba = resource.read()?;
    assert_eq!(rgba.len(), 64);
    assert_eq!(&rgba[..4], &[0x77, 0x33, 0x00, 0xFF]);
    assert_eq!(rgba, decode_image(BlockFormat::Etc1, &INDIVIDUAL, 4, 4)?);
    Ok(())
}

#[test]
fn partial_blocks_are_cropped() -> Result<()> {
    let blocks = INDIVIDUAL.repeat(4);
    let bytes = pkm(b"20", 1, (8, 8), (6, 5), &blocks);
    let opened = builtin_registry().open(container("wall.pkm", bytes), &Settings::default())?;

    let resource = &opened.table[0];
    assert_eq!(resource.compression_tag(), "etc2");
    assert_eq!(resource.decompressed_length(), 6 * 5 * 4);

    let rgba = resource.read()?;
    assert_eq!(rgba.len(), 120);
    // column 4 starts the second block again
    assert_eq!(&rgba[16..20], &rgba[..4]);
    Ok(())
}

#[test]
fn export_writes_rgba() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bytes = pkm(b"10", 0, (4, 4), (4, 4), &INDIVIDUAL);
    let mut opened = builtin_registry().open(container("stone.pkm", bytes), &Settings::default())?;

    let report = export_all(
        &mut opened.table,
        &ExportOptions::builder().out_dir(dir.path()).build(),
        &CancellationToken::new(),
    )?;

    assert_eq!(report.status, ExtractStatus::All);
    assert_eq!(std::fs::read(dir.path().join("stone.rgba"))?.len(), 64);
    assert!(opened.table[0].is_exported());
    Ok(())
}

#[test]
fn truncated_blocks() {
    let bytes = pkm(b"10", 0, (8, 8), (8, 8), &INDIVIDUAL);
    let result = builtin_registry().open_with("pkm", container("stone.pkm", bytes), &Settings::default());
    assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
}

#[test]
fn zero_width() {
    let bytes = pkm(b"10", 0, (0, 4), (0, 4), &INDIVIDUAL);
    let result = builtin_registry().open_with("pkm", container("stone.pkm", bytes), &Settings::default());
    assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
}

#[test]
fn padding_must_cover_the_image() {
    let bytes = pkm(b"10", 0, (4, 4), (8, 4), &INDIVIDUAL.repeat(2));
    let result = builtin_registry().open_with("pkm", container("stone.pkm", bytes), &Settings::default());
    assert!(matches!(result, Err(Error::Malformed { format: "PKM", .. })), "{result:?}");
}

#[test]
fn unsupported_format() {
    let bytes = pkm(b"20", 9, (4, 4), (4, 4), &INDIVIDUAL);
    let registry = builtin_registry();

    let result = registry.open_with("pkm", container("stone.pkm", bytes.clone()), &Settings::default());
    assert!(matches!(result, Err(Error::Malformed { format: "PKM", .. })), "{result:?}");

    assert!(matches!(
        registry.open(container("stone.pkm", bytes), &Settings::default()),
        Err(Error::NoMatchingFormat(_))
    ));
}
