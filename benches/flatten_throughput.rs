//! Benchmarks for packet flattening
//!
//! Measures points per second for:
//! - Car-array packets (per-driver fan-out with corner arrays)
//! - Lap-data packets against a partially populated registry
//! - Decoding recorded structured records with the built-in schemas
//! - Line protocol rendering
//!
//! Platform: Cross-platform (synthetic packets plus the recorded capture, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lapflux::test_utils::{car_packet, context_with_drivers, lap_data_packet, require_capture};
use lapflux::{Decoder, Flattener, LapSnapshot, PacketKind, ReplaySource};
use std::hint::black_box;
use std::sync::Arc;

fn bench_car_array(c: &mut Criterion) {
    let flattener = Flattener::new(Arc::new(context_with_drivers(22)));
    let laps = LapSnapshot::new(vec![12; 22]);

    let mut group = c.benchmark_group("car_array");
    for cars in [1usize, 10, 22] {
        let packet = car_packet(PacketKind::CarTelemetry, cars);
        group.throughput(Throughput::Elements(cars as u64 * 11));
        group.bench_with_input(BenchmarkId::from_parameter(cars), &packet, |b, packet| {
            b.iter(|| black_box(flattener.flatten(black_box(packet), &laps).expect("flatten")))
        });
    }
    group.finish();
}

fn bench_lap_data(c: &mut Criterion) {
    let flattener = Flattener::new(Arc::new(context_with_drivers(20)));
    let packet = lap_data_packet(22, 16);

    let mut group = c.benchmark_group("lap_data");
    group.throughput(Throughput::Elements(20 * 16));
    group.bench_function("22_records_20_drivers", |b| {
        b.iter(|| black_box(flattener.flatten(black_box(&packet), &LapSnapshot::default()).expect("flatten")))
    });

    group.bench_function("callback_sink", |b| {
        b.iter(|| {
            let mut count = 0usize;
            flattener
                .flatten_with(black_box(&packet), &LapSnapshot::default(), &mut |point| {
                    count += black_box(point).field_key.len()
                })
                .expect("flatten");
            black_box(count)
        })
    });
    group.finish();
}

fn bench_decode_capture(c: &mut Criterion) {
    let path = require_capture("austria_race.yaml").expect("capture fixture");
    let text = std::fs::read_to_string(path).expect("readable capture");
    let decoder = Decoder::new();

    c.bench_function("decode_capture", |b| {
        b.iter(|| {
            let source = ReplaySource::parse(black_box(&text)).expect("parse capture");
            black_box(source.total())
        })
    });

    let packets: Vec<_> = {
        let mut source = ReplaySource::parse(&text).expect("parse capture");
        let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
        runtime.block_on(async {
            use lapflux::PacketSource;
            let mut packets = Vec::new();
            while let Some(packet) = source.next_packet().await.expect("next packet") {
                packets.push(packet);
            }
            packets
        })
    };

    c.bench_function("decode_records", |b| {
        b.iter(|| {
            for raw in &packets {
                let _ = black_box(decoder.decode(black_box(raw)));
            }
        })
    });
}

fn bench_line_protocol(c: &mut Criterion) {
    let flattener = Flattener::new(Arc::new(context_with_drivers(22)));
    let points = flattener
        .flatten(&car_packet(PacketKind::CarDamage, 22), &LapSnapshot::default())
        .expect("flatten")
        .points;

    let mut group = c.benchmark_group("line_protocol");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("render", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for point in &points {
                bytes += black_box(point.line_protocol().to_string()).len();
            }
            black_box(bytes)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_car_array, bench_lap_data, bench_decode_capture, bench_line_protocol);
criterion_main!(benches);
