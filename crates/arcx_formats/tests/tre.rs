use std::{
    io::{Cursor, Write},
    sync::Arc,
};

use arcx_core::{
    export::{export_all, ExportOptions},
    matcher::Outcome,
    CancellationToken, Container, Error, ExtractStatus, Limits, Result, Settings,
};
use arcx_formats::{
    builtin_registry,
    tre::{CompressionMethod, TreHeader, TreRecord, HEADER_SIZE, NAME_CRC},
};
use binrw::BinWrite;
use flate2::{write::ZlibEncoder, Compression};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

#[rustfmt::skip]
const HELLO_RAW: [u8; 81] = [
    // Header (36)
    0x45, 0x45, 0x52, 0x54, 0x35, 0x30, 0x30, 0x30, 0x01, 0x00, 0x00, 0x00, 0x2F, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x0A, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
    // Data (11)
    0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64,
    // Records (24)
    0x00, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // Names (10)
    0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2E, 0x74, 0x78, 0x74, 0x00,
];

#[rustfmt::skip]
const HELLO_ZLIB: [u8; 89] = [
    // Header (36)
    0x45, 0x45, 0x52, 0x54, 0x35, 0x30, 0x30, 0x30, 0x01, 0x00, 0x00, 0x00, 0x37, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x0A, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
    // Data (19)
    0x78, 0x9C, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x01,
    0x00, 0x18, 0x0B, 0x04, 0x1D,
    // Records (24)
    0xAA, 0x30, 0x7E, 0x52, 0x0B, 0x00, 0x00, 0x00, 0x24, 0x00, 0x00, 0x00, 0x02, 0x00,
    0x00, 0x00, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // Names (10)
    0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2E, 0x74, 0x78, 0x74, 0x00,
];

#[rustfmt::skip]
const HELLO_WORLD: [u8; 142] = [
    // Header (36)
    0x45, 0x45, 0x52, 0x54, 0x35, 0x30, 0x30, 0x30, 0x02, 0x00, 0x00, 0x00, 0x4A, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x14, 0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00,
    // Data (38)
    0x78, 0x9C, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x01,
    0x00, 0x18, 0x0B, 0x04, 0x1D, 0x78, 0x9C, 0x0B, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0xF0,
    0x48, 0xCD, 0xC9, 0xC9, 0x07, 0x00, 0x18, 0x83, 0x04, 0x1D,
    // Records (48)
    0x00, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x24, 0x00, 0x00, 0x00, 0x02, 0x00,
    0x00, 0x00, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x0B, 0x00, 0x00, 0x00, 0x37, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x13, 0x00,
    0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
    // Names (20)
    0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2E, 0x74, 0x78, 0x74, 0x00, 0x77, 0x6F, 0x72, 0x6C,
    0x64, 0x2E, 0x74, 0x78, 0x74, 0x00,
];

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Assemble an archive with correct checksums
fn build_tre(entries: &[(&str, &str, CompressionMethod)], directory: CompressionMethod) -> Vec<u8> {
    let mut data = Vec::new();
    let mut records = Cursor::new(Vec::new());
    let mut names = Vec::new();

    for (name, content, method) in entries {
        let stored = match method {
            CompressionMethod::Zlib => zlib(content.as_bytes()),
            CompressionMethod::None => content.as_bytes().to_vec(),
        };
        TreRecord {
            checksum: NAME_CRC.checksum(name.as_bytes()),
            data_uncompressed: content.len() as u32,
            data_offset: (HEADER_SIZE as usize + data.len()) as u32,
            data_compression: *method,
            data_compressed: stored.len() as u32,
            name_offset: names.len() as u32,
        }
        .write(&mut records)
        .unwrap();
        data.extend(stored);
        names.extend(name.as_bytes());
        names.push(0);
    }

    let pack = |block: Vec<u8>| match directory {
        CompressionMethod::Zlib => zlib(&block),
        CompressionMethod::None => block,
    };
    let stored_records = pack(records.into_inner());
    let stored_names = pack(names.clone());

    let header = TreHeader {
        records: entries.len() as u32,
        record_start: (HEADER_SIZE as usize + data.len()) as u32,
        record_compression: directory,
        record_compressed: stored_records.len() as u32,
        name_compression: directory,
        name_compressed: stored_names.len() as u32,
        name_uncompressed: names.len() as u32,
    };

    let mut out = Cursor::new(Vec::new());
    header.write(&mut out).unwrap();
    let mut out = out.into_inner();
    out.extend(data);
    out.extend(stored_records);
    out.extend(stored_names);
    out
}

fn container(name: &str, bytes: &[u8]) -> Arc<Container> {
    Arc::new(Container::from_bytes(name, bytes.to_vec()))
}

#[traced_test]
#[test]
fn uncompressed_entry() -> Result<()> {
    let opened = builtin_registry().open(container("hello.tre", &HELLO_RAW), &Settings::default())?;

    assert_eq!(opened.plugin, "tre");
    assert_eq!(opened.table.len(), 1);

    let resource = &opened.table[0];
    assert_eq!(resource.name(), "hello.txt");
    assert_eq!(resource.offset(), 36);
    assert_eq!(resource.compression_tag(), "raw");
    assert_eq!(resource.read()?, b"Hello World");

    // fixtures without checksums still open
    assert!(logs_contain("name checksum mismatch"));
    Ok(())
}

#[traced_test]
#[test]
fn compressed_entry() -> Result<()> {
    let opened = builtin_registry().open(container("hello.tre", &HELLO_ZLIB), &Settings::default())?;

    let resource = &opened.table[0];
    assert_eq!(resource.compression_tag(), "zlib");
    assert_eq!(resource.compressed_length(), 19);
    assert_eq!(resource.decompressed_length(), 11);
    assert!(resource.is_compressed());
    assert_eq!(resource.read()?, b"Hello World");
    assert!(!logs_contain("name checksum mismatch"));
    Ok(())
}

#[test]
fn multiple_entries_keep_their_order() -> Result<()> {
    let opened =
        builtin_registry().open(container("two.tre", &HELLO_WORLD), &Settings::default())?;

    let names: Vec<_> = opened.table.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["hello.txt", "world.txt"]);
    assert_eq!(opened.table[1].offset(), 55);
    assert_eq!(opened.table[0].read()?, b"Hello World");
    assert_eq!(opened.table[1].read()?, b"World Hello");
    Ok(())
}

#[traced_test]
#[test]
fn compressed_directory_round_trip() -> Result<()> {
    let bytes = build_tre(
        &[
            ("texture/stone.dds", "stone stone stone stone", CompressionMethod::Zlib),
            ("readme.txt", "plain", CompressionMethod::None),
            ("empty.bin", "", CompressionMethod::None),
        ],
        CompressionMethod::Zlib,
    );

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("patch_01.tre");
    std::fs::write(&path, &bytes)?;

    let container = Arc::new(Container::from_path(&path)?);
    let mut opened = builtin_registry().open(container, &Settings::default())?;
    assert_eq!(opened.table.len(), 3);
    assert!(!logs_contain("name checksum mismatch"));

    let out_dir = dir.path().join("out");
    let report = export_all(
        &mut opened.table,
        &ExportOptions::builder().out_dir(&out_dir).build(),
        &CancellationToken::new(),
    )?;

    assert_eq!(report.status, ExtractStatus::All);
    assert_eq!(
        std::fs::read(out_dir.join("texture/stone.dds"))?,
        b"stone stone stone stone"
    );
    assert_eq!(std::fs::read(out_dir.join("readme.txt"))?, b"plain");
    assert_eq!(std::fs::read(out_dir.join("empty.bin"))?, b"");
    Ok(())
}

#[test]
fn empty_zlib_entry_inflates_to_nothing() -> Result<()> {
    let bytes = build_tre(
        &[
            ("empty.bin", "", CompressionMethod::Zlib),
            ("after.txt", "after", CompressionMethod::Zlib),
        ],
        CompressionMethod::None,
    );
    let opened = builtin_registry().open(container("empty.tre", &bytes), &Settings::default())?;

    let empty = &opened.table[0];
    assert_eq!(empty.compression_tag(), "zlib");
    assert_eq!(empty.decompressed_length(), 0);
    assert!(empty.compressed_length() > 0);
    assert_eq!(empty.read()?, b"");
    assert_eq!(opened.table[1].read()?, b"after");
    Ok(())
}

#[test]
fn rating() -> Result<()> {
    let registry = builtin_registry();

    let named = container("hello.tre", &HELLO_RAW);
    let ratings = registry.rate_all(&named, &mut named.open()?);
    assert_eq!(ratings[0].plugin, "tre");
    assert_eq!(ratings[0].confidence, 100);
    assert_eq!(ratings[1].confidence, 0);

    let unnamed = container("hello.bin", &HELLO_RAW);
    let ratings = registry.rate_all(&unnamed, &mut unnamed.open()?);
    assert_eq!(ratings[0].confidence, 70);
    Ok(())
}

#[test]
fn wrong_magic() {
    let mut bytes = HELLO_RAW;
    bytes[0] = 0x40;
    let registry = builtin_registry();

    assert!(matches!(
        registry.open(container("hello.tre", &bytes), &Settings::default()),
        Err(Error::NoMatchingFormat(_))
    ));
    assert!(matches!(
        registry.open_with("tre", container("hello.tre", &bytes), &Settings::default()),
        Err(Error::FormatMismatch(_))
    ));
}

#[test]
fn empty_archive() -> Result<()> {
    let bytes = build_tre(&[], CompressionMethod::Zlib);
    let registry = builtin_registry();

    assert!(matches!(
        registry.open(container("empty.tre", &bytes), &Settings::default()),
        Err(Error::NoMatchingFormat(_))
    ));

    let opened = registry.open_with("tre", container("empty.tre", &bytes), &Settings::default())?;
    assert!(opened.table.is_empty());
    assert_eq!(opened.report.attempts[0].outcome, Outcome::Empty);
    Ok(())
}

#[test]
fn entry_past_the_end() {
    let mut bytes = HELLO_RAW;
    // data_compressed of the only record
    bytes[63] = 0xFF;

    let result = builtin_registry().open_with("tre", container("hello.tre", &bytes), &Settings::default());
    assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
}

#[test]
fn name_offset_outside_the_name_block() {
    let mut bytes = HELLO_RAW;
    // name_offset of the only record
    bytes[67] = 0x40;

    let result = builtin_registry().open_with("tre", container("hello.tre", &bytes), &Settings::default());
    assert!(matches!(result, Err(Error::Malformed { format: "TRE", .. })), "{result:?}");
}

#[test]
fn entry_count_limit() {
    let settings = Settings::builder()
        .limits(Limits::builder().max_entry_count(1).build())
        .build();

    let result = builtin_registry().open_with("tre", container("two.tre", &HELLO_WORLD), &settings);
    assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
}
