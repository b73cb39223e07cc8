use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use srec_core::{encoder::encode_record, encoder::encode_to_vec, EncoderConfig, RecordType};

fn bench_encode_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_image");

    for size in [256, 4096, 65536, 1 << 20] {
        let image: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let config = EncoderConfig::builder(0)
            .address_bits(32)
            .with_count_record()
            .build()
            .unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &image, |b, data| {
            b.iter(|| encode_to_vec(&config, black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_encode_record(c: &mut Criterion) {
    let payload = [0x42u8; 27];

    c.bench_function("encode_record_s3", |b| {
        b.iter(|| encode_record(RecordType::S3, black_box(0x0800_0000), black_box(&payload)).unwrap());
    });
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_size");
    let image = vec![0x5Au8; 65536];

    for chunk in [8u8, 16, 32] {
        let config = EncoderConfig::builder(0)
            .address_bits(16)
            .chunk_size(chunk)
            .build()
            .unwrap();

        group.throughput(Throughput::Bytes(image.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &config, |b, config| {
            b.iter(|| encode_to_vec(config, black_box(&image)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_image, bench_encode_record, bench_chunk_sizes);
criterion_main!(benches);
