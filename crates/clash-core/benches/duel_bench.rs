use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use clash_core::ai::{AiProfile, Archetype};
use clash_core::Simulation;

const DT: f32 = 1.0 / 60.0;

fn duel(seed: u64) -> Simulation {
    let mut sim = Simulation::new(seed);
    sim.spawn_ai("Red", 0, Vec2::ZERO, AiProfile::archetype(Archetype::Aggressive));
    sim.spawn_ai("Blue", 1, Vec2::new(4.0, 0.0), AiProfile::archetype(Archetype::Defensive));
    sim
}

fn bench_duel_step(c: &mut Criterion) {
    let mut sim = duel(42);

    c.bench_function("duel_step", |b| {
        b.iter(|| {
            if sim.is_finished() {
                sim = duel(42);
            }
            sim.step(black_box(DT));
            black_box(sim.take_events());
        })
    });
}

fn bench_duel_to_finish(c: &mut Criterion) {
    c.bench_function("duel_to_finish", |b| {
        b.iter(|| {
            let mut sim = duel(black_box(7));
            black_box(sim.run(DT, 60 * 180))
        })
    });
}

fn bench_melee_step(c: &mut Criterion) {
    // Eight fighters in a ring, two teams
    let mut sim = Simulation::new(3);
    for i in 0..8u8 {
        let angle = f32::from(i) * std::f32::consts::TAU / 8.0;
        let position = Vec2::from_angle(angle) * 3.0;
        sim.spawn_ai("Brawler", u32::from(i % 2), position, AiProfile::default());
    }

    c.bench_function("melee_step", |b| {
        b.iter(|| {
            sim.step(black_box(DT));
            black_box(sim.take_events());
        })
    });
}

criterion_group!(benches, bench_duel_step, bench_duel_to_finish, bench_melee_step);
criterion_main!(benches);
