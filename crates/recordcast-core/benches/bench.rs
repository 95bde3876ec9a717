use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use recordcast_core::{
    encode,
    types::{Format, Record, Salary},
};

// Number of records encoded per benchmark iteration.
const TOTAL_RECORDS: usize = 1024;

fn records() -> Vec<Record> {
    (0..TOTAL_RECORDS)
        .map(|i| Record {
            name: format!("user-{i}"),
            age: (i % 90) as i32,
            salary: Salary::from_cents(i as i64 * 1_337),
            occupation: "Engineer".to_string(),
        })
        .collect()
}

fn bench_format(c: &mut Criterion, format: Format) {
    let records = records();
    let mut group = c.benchmark_group(format!("encode/{format}"));
    group.throughput(Throughput::Elements(TOTAL_RECORDS as u64));

    group.bench_function(format!("elems/{TOTAL_RECORDS}"), |b| {
        b.iter(|| {
            for record in &records {
                black_box(encode(black_box(record), format).unwrap());
            }
        });
    });

    group.finish();
}

fn bench_all_formats(c: &mut Criterion) {
    let records = records();
    let mut group = c.benchmark_group("encode/all");
    group.throughput(Throughput::Elements(
        (TOTAL_RECORDS * Format::ALL.len()) as u64,
    ));

    group.bench_function(format!("elems/{TOTAL_RECORDS}"), |b| {
        b.iter(|| {
            for record in &records {
                for format in Format::ALL {
                    black_box(encode(black_box(record), format).unwrap());
                }
            }
        });
    });

    group.finish();
}

fn benches(c: &mut Criterion) {
    for format in Format::ALL {
        bench_format(c, format);
    }
    bench_all_formats(c);
}

criterion_group!(encode_benches, benches);
criterion_main!(encode_benches);
