use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use contourfit::conic::Ellipse;
use contourfit::{
    convex_hull, fit_ellipse, fit_line, min_area_rect, min_enclosing_circle,
    min_enclosing_triangle, DistanceKind, Orientation, PointSeq,
};

fn random_cloud(n: usize, seed: u64) -> PointSeq {
    let mut rng = StdRng::seed_from_u64(seed);
    PointSeq::from_f32(
        &(0..n)
            .map(|_| {
                [
                    rng.gen_range(-1000.0f32..1000.0),
                    rng.gen_range(-1000.0f32..1000.0),
                ]
            })
            .collect::<Vec<_>>(),
    )
}

fn bench_hull(c: &mut Criterion) {
    let pts = random_cloud(1000, 7);
    c.bench_function("convex_hull_1k", |b| {
        b.iter(|| convex_hull(black_box(&pts), Orientation::CounterClockwise))
    });
}

fn bench_min_area_rect(c: &mut Criterion) {
    let pts = random_cloud(1000, 11);
    c.bench_function("min_area_rect_1k", |b| {
        b.iter(|| min_area_rect(black_box(&pts)).unwrap())
    });
}

fn bench_min_enclosing_circle(c: &mut Criterion) {
    let pts = random_cloud(1000, 13);
    c.bench_function("min_enclosing_circle_1k", |b| {
        b.iter(|| min_enclosing_circle(black_box(&pts)).unwrap())
    });
}

fn bench_min_enclosing_triangle(c: &mut Criterion) {
    let pts = random_cloud(1000, 17);
    c.bench_function("min_enclosing_triangle_1k", |b| {
        b.iter(|| min_enclosing_triangle(black_box(&pts)).unwrap())
    });
}

fn bench_fit_line(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(19);
    let pts = PointSeq::from_f32(
        &(0..500)
            .map(|i| {
                let t = i as f32;
                [
                    3.0 + 0.8 * t + rng.gen_range(-1.0..1.0),
                    -2.0 + 0.6 * t + rng.gen_range(-1.0..1.0),
                ]
            })
            .collect::<Vec<_>>(),
    );
    c.bench_function("fit_line_huber_500", |b| {
        b.iter(|| fit_line(black_box(&pts), DistanceKind::Huber, 0.0, 0.01, 0.01).unwrap())
    });
}

fn bench_fit_ellipse(c: &mut Criterion) {
    let truth = Ellipse {
        cx: 320.0,
        cy: 240.0,
        a: 120.0,
        b: 70.0,
        angle: 0.5,
    };
    let mut rng = StdRng::seed_from_u64(23);
    let pts = PointSeq::from_f32(
        &truth
            .sample_points(400)
            .iter()
            .map(|p| {
                [
                    (p[0] + rng.gen_range(-0.5..0.5)) as f32,
                    (p[1] + rng.gen_range(-0.5..0.5)) as f32,
                ]
            })
            .collect::<Vec<_>>(),
    );
    c.bench_function("fit_ellipse_400", |b| {
        b.iter(|| fit_ellipse(black_box(&pts)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_hull,
    bench_min_area_rect,
    bench_min_enclosing_circle,
    bench_min_enclosing_triangle,
    bench_fit_line,
    bench_fit_ellipse
);
criterion_main!(benches);
