//! Benchmarks for telegram decoding and calendar arithmetic

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wordclock_sync::core::DecoderConfig;
use wordclock_sync::line::SimulatedTransmitter;
use wordclock_sync::protocol::{encode, RadioTelegramDecoder, TelegramFlags};
use wordclock_sync::sync::SyncQualityGate;
use wordclock_sync::time::CalendarTimestamp;

fn bench_telegram_decode(c: &mut Criterion) {
    let timestamp = CalendarTimestamp::new(30, 12, 1, 0, 1, 24);
    let telegram = encode(&timestamp, TelegramFlags::default());

    c.bench_function("telegram_decode", |b| {
        b.iter(|| black_box(telegram.decode()))
    });
}

fn bench_decoder_second(c: &mut Criterion) {
    let config = DecoderConfig::default();
    let mut tx =
        SimulatedTransmitter::new(CalendarTimestamp::default(), &config).with_phase(config.bins / 2);
    let mut decoder = match RadioTelegramDecoder::new(config) {
        Ok(decoder) => decoder,
        Err(e) => panic!("default config rejected: {}", e),
    };

    c.bench_function("decoder_second", |b| {
        b.iter(|| {
            for _ in 0..tx.samples_per_second() {
                decoder.poll(tx.next_level());
            }
            black_box(decoder.new_cycle().ok())
        })
    });
}

fn bench_advance_minute(c: &mut Criterion) {
    let mut timestamp = CalendarTimestamp::new(0, 0, 1, 0, 1, 0);

    c.bench_function("advance_minute", |b| {
        b.iter(|| {
            timestamp.advance_minute();
            black_box(timestamp.minutes_of_century())
        })
    });
}

fn bench_add_sub_hours(c: &mut Criterion) {
    let timestamp = CalendarTimestamp::new(30, 0, 1, 0, 3, 24);

    c.bench_function("add_sub_hours_overflow", |b| {
        b.iter(|| {
            let mut shifted = timestamp;
            shifted.add_sub_hours_overflow(black_box(-7));
            black_box(shifted)
        })
    });
}

fn bench_gate_samples_ok(c: &mut Criterion) {
    let mut gate = match SyncQualityGate::new(8) {
        Ok(gate) => gate,
        Err(e) => panic!("gate rejected: {}", e),
    };
    let mut decoded = CalendarTimestamp::new(0, 12, 1, 0, 1, 24);
    let mut local = CalendarTimestamp::new(3, 12, 1, 0, 1, 24);
    for _ in 0..8 {
        gate.add_sample(decoded, local);
        decoded.advance_minute();
        local.advance_minute();
    }

    c.bench_function("gate_samples_ok", |b| {
        b.iter(|| black_box(gate.samples_ok()))
    });
}

criterion_group!(
    benches,
    bench_telegram_decode,
    bench_decoder_second,
    bench_advance_minute,
    bench_add_sub_hours,
    bench_gate_samples_ok,
);
criterion_main!(benches);
