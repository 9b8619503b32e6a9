use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keycast_core::chord_assembler::ChordAssembler;
use keycast_core::stroke_queue::StrokeQueue;
use keycast_core::stroke_renderer::{StrokeRenderer, Tile};
use keycast_core::types::{NamedKey, RawKey};
use std::time::{Duration, Instant};

struct Cap;

impl Tile for Cap {
    fn width(&self) -> u32 {
        200
    }
    fn height(&self) -> u32 {
        120
    }
}

const CTRL: RawKey = RawKey::Named(NamedKey::ControlLeft);
const SHIFT: RawKey = RawKey::Named(NamedKey::ShiftLeft);

fn bench_single_key(c: &mut Criterion) {
    let mut asm = ChordAssembler::new();
    let a = RawKey::from_char('a');
    c.bench_function("assembler/single_key", |b| {
        b.iter(|| {
            black_box(asm.on_press(a));
            asm.on_release(a);
        });
    });
}

fn bench_three_key_chord(c: &mut Criterion) {
    let mut asm = ChordAssembler::new();
    let t = RawKey::from_char('t');
    c.bench_function("assembler/ctrl_shift_t", |b| {
        b.iter(|| {
            asm.on_press(CTRL);
            asm.on_press(SHIFT);
            black_box(asm.on_press(t));
            asm.on_release(t);
            asm.on_release(SHIFT);
            asm.on_release(CTRL);
        });
    });
}

fn bench_auto_repeat(c: &mut Criterion) {
    let mut asm = ChordAssembler::new();
    let x = RawKey::from_char('x');
    asm.on_press(x);
    c.bench_function("assembler/auto_repeat_suppressed", |b| {
        b.iter(|| black_box(asm.on_press(x)));
    });
}

fn bench_plan_full_queue(c: &mut Criterion) {
    let t0 = Instant::now();
    let mut queue = StrokeQueue::new(3, Duration::from_millis(1500));
    for _ in 0..3 {
        queue.insert(vec![Cap, Cap, Cap, Cap], t0);
    }
    let renderer = StrokeRenderer {
        surface_height: 600,
        margin: 0,
        horizontal_spacing: 0,
        vertical_spacing: 10,
        fade_time: Duration::from_millis(500),
    };
    let now = t0 + Duration::from_millis(1200);
    c.bench_function("renderer/plan_three_strokes", |b| {
        b.iter(|| black_box(renderer.plan(&queue, now)));
    });
}

criterion_group!(
    benches,
    bench_single_key,
    bench_three_key_chord,
    bench_auto_repeat,
    bench_plan_full_queue
);
criterion_main!(benches);
