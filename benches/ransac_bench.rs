use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use pointfit::segmentation;
use rand::{distributions::Uniform, thread_rng, Rng};

const NUM_POINTS_SMALL: usize = 1000;
const NUM_POINTS_MEDIUM: usize = 10000;

fn noisy_plane_cloud(num_points: usize) -> Vec<Vector3<f64>> {
    let mut rng = thread_rng();
    let mut points: Vec<Vector3<f64>> = (0..num_points * 9 / 10)
        .map(|_| {
            Vector3::new(
                rng.sample(Uniform::new(-100.0, 100.0)),
                rng.sample(Uniform::new(-100.0, 100.0)),
                rng.sample(Uniform::new(-0.1, 0.1)),
            )
        })
        .collect();
    for _ in 0..num_points / 10 {
        points.push(Vector3::new(
            rng.sample(Uniform::new(-100.0, 100.0)),
            rng.sample(Uniform::new(-100.0, 100.0)),
            rng.sample(Uniform::new(-100.0, 100.0)),
        ));
    }
    points
}

fn bench(c: &mut Criterion) {
    let small = noisy_plane_cloud(NUM_POINTS_SMALL);
    let medium = noisy_plane_cloud(NUM_POINTS_MEDIUM);

    c.bench_function("detect_plane_small", |b| {
        let mut rng = thread_rng();
        b.iter(|| segmentation::detect_plane(&small, 0.2, 100, 100, &mut rng))
    });
    c.bench_function("detect_plane_par_small", |b| {
        b.iter(|| segmentation::detect_plane_par(&small, 0.2, 100, 100, 42))
    });
    c.bench_function("detect_plane_medium", |b| {
        let mut rng = thread_rng();
        b.iter(|| segmentation::detect_plane(&medium, 0.2, 100, 100, &mut rng))
    });
    c.bench_function("detect_plane_par_medium", |b| {
        b.iter(|| segmentation::detect_plane_par(&medium, 0.2, 100, 100, 42))
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
