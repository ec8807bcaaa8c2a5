//! Scheduler micro-benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::cell::Cell;
use ws_engine::{AudioClock, ChimeConfig, ChimeScheduler, LookaheadScheduler, SchedulerConfig};

struct BenchClock(Cell<f64>);

impl AudioClock for BenchClock {
    fn now_secs(&self) -> f64 {
        self.0.get()
    }
}

fn lookahead_pump(c: &mut Criterion) {
    c.bench_function("lookahead_pump_1s", |b| {
        b.iter(|| {
            let clock = BenchClock(Cell::new(0.0));
            let mut sched = LookaheadScheduler::new(SchedulerConfig::default());
            sched.start(&clock);
            let mut ticks = 0u32;
            while clock.now_secs() < 1.0 {
                sched.pump(&clock, || Some(60.0 / 240.0), |_| ticks += 1);
                clock.0.set(clock.now_secs() + 0.025);
            }
            black_box(ticks)
        })
    });
}

fn chime_arm(c: &mut Criterion) {
    c.bench_function("chime_arm_cycle", |b| {
        b.iter(|| {
            let mut chime = ChimeScheduler::new(ChimeConfig::default());
            chime.set_interval(Some(1.0), 0.0);
            let mut elapsed = 0.0;
            for _ in 0..100 {
                match chime.arm(black_box(elapsed)) {
                    ws_engine::ChimeArm::After(delay) => elapsed += delay,
                    ws_engine::ChimeArm::FireNow => chime.fired(elapsed),
                    _ => {}
                }
            }
            black_box(elapsed)
        })
    });
}

criterion_group!(benches, lookahead_pump, chime_arm);
criterion_main!(benches);
