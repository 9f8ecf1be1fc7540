use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

pub mod read {
    use std::{
        io::{Cursor, Write},
        sync::Arc,
    };

    use arcx_core::{matcher::Opened, Container, Settings};
    use arcx_formats::{
        builtin_registry,
        tre::{CompressionMethod, TreHeader, TreRecord, HEADER_SIZE, NAME_CRC},
    };
    use binrw::BinWrite;
    use divan::Bencher;
    use flate2::{write::ZlibEncoder, Compression};

    const ENTRIES: usize = 256;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// An archive of compressed text entries with a compressed directory
    fn get_input() -> Vec<u8> {
        let mut data = Vec::new();
        let mut records = Cursor::new(Vec::new());
        let mut names = Vec::new();

        for i in 0..ENTRIES {
            let name = format!("datatables/entry_{i:04}.iff");
            let content = format!("entry {i} ").repeat(64);
            let stored = zlib(content.as_bytes());

            TreRecord {
                checksum: NAME_CRC.checksum(name.as_bytes()),
                data_uncompressed: content.len() as u32,
                data_offset: (HEADER_SIZE as usize + data.len()) as u32,
                data_compression: CompressionMethod::Zlib,
                data_compressed: stored.len() as u32,
                name_offset: names.len() as u32,
            }
            .write(&mut records)
            .unwrap();
            data.extend(stored);
            names.extend(name.as_bytes());
            names.push(0);
        }

        let records = zlib(&records.into_inner());
        let stored_names = zlib(&names);
        let header = TreHeader {
            records: ENTRIES as u32,
            record_start: (HEADER_SIZE as usize + data.len()) as u32,
            record_compression: CompressionMethod::Zlib,
            record_compressed: records.len() as u32,
            name_compression: CompressionMethod::Zlib,
            name_compressed: stored_names.len() as u32,
            name_uncompressed: names.len() as u32,
        };

        let mut out = Cursor::new(Vec::new());
        header.write(&mut out).unwrap();
        let mut out = out.into_inner();
        out.extend(data);
        out.extend(records);
        out.extend(stored_names);
        out
    }

    fn open_input() -> Opened {
        let container = Arc::new(Container::from_bytes("bench.tre", get_input()));
        builtin_registry()
            .open(container, &Settings::default())
            .unwrap()
    }

    #[divan::bench]
    fn open(bencher: Bencher) {
        let registry = builtin_registry();
        let settings = Settings::default();

        bencher
            .with_inputs(|| Arc::new(Container::from_bytes("bench.tre", get_input())))
            .bench_values(|container| {
                divan::black_box(registry.open(container, &settings).unwrap());
            });
    }

    #[divan::bench]
    fn read_file_first(bencher: Bencher) {
        bencher.with_inputs(open_input).bench_refs(|opened| {
            divan::black_box(opened.table[0].read().unwrap());
        });
    }

    #[divan::bench(sample_count = 10)]
    fn read_file_all(bencher: Bencher) {
        let opened = open_input();
        bencher.bench_local(move || {
            for resource in &opened.table {
                divan::black_box(resource.read().unwrap());
            }
        });
    }
}
