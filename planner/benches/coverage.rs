use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gonio_math::EulerAngles;
use nalgebra::Matrix3;
use planner::detector::{DetectorInstrument, PaneDefinition};
use planner::grid::{QGrids, UniformGridParameters};
use planner::search::{
    AngleRange, EulerAngleRanges, ExhaustiveGridSearch, ProposalStrategy, SearchContext,
};
use planner::symmetry::{hkl_box, SymmetryOperation};

fn make_instrument() -> DetectorInstrument {
    let panes = [1.0, -1.0]
        .iter()
        .enumerate()
        .map(|(id, s)| {
            PaneDefinition::rectangle(
                id,
                [
                    [s * 300.0, -200.0, -200.0],
                    [s * 300.0, 200.0, -200.0],
                    [s * 300.0, 200.0, 200.0],
                    [s * 300.0, -200.0, 200.0],
                ],
                1000.0,
                16000.0,
            )
        })
        .collect();
    DetectorInstrument::new(panes).unwrap()
}

fn make_uniform_grid(n: usize) -> QGrids {
    QGrids::uniform(&UniformGridParameters {
        nx: n,
        ny: n,
        nz: n,
        q_max: 5.0,
        q_min: 0.0,
    })
    .unwrap()
}

fn bench_visible(c: &mut Criterion) {
    let instrument = make_instrument();
    let grid_small = make_uniform_grid(10);
    let grid_large = make_uniform_grid(30);

    let ops: Vec<SymmetryOperation> = ["h,k,l", "-h,-k,-l", "-k,h-k,l", "k,-h+k,-l"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    let ub = Matrix3::from_diagonal_element(0.2);
    let grid_symmetric = QGrids::symmetric(&hkl_box(10, 10, 10), &ops, &ub).unwrap();

    let mut group = c.benchmark_group("visible");
    group.bench_function("uniform_20x20x20", |b| {
        b.iter(|| grid_small.visible(black_box(&instrument)))
    });
    group.bench_function("uniform_60x60x60", |b| {
        b.iter(|| grid_large.visible(black_box(&instrument)))
    });
    group.bench_function("hkl_10_4_ops", |b| {
        b.iter(|| grid_symmetric.visible(black_box(&instrument)))
    });
    group.finish();
}

fn bench_rotated_instrument(c: &mut Criterion) {
    let instrument = make_instrument();
    let angles = EulerAngles::new(30.0, 135.0, 60.0);

    c.bench_function("instrument_rotated", |b| {
        b.iter(|| instrument.rotated(black_box(&angles)).unwrap())
    });
}

fn bench_exhaustive_proposal(c: &mut Criterion) {
    let instrument = make_instrument();
    let mut grid = make_uniform_grid(10);
    grid.accumulate_coverage(&instrument);
    let ranges = EulerAngleRanges::new(
        AngleRange::new(0.0, 360.0, 30.0).unwrap(),
        AngleRange::fixed(135.0),
        AngleRange::new(0.0, 360.0, 30.0).unwrap(),
    );

    c.bench_function("exhaustive_propose_13x13", |b| {
        b.iter(|| {
            let ctx = SearchContext::new(&instrument, &grid, &ranges, 0);
            ExhaustiveGridSearch::new()
                .propose(&ctx, black_box(&EulerAngles::zero()))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_visible,
    bench_rotated_instrument,
    bench_exhaustive_proposal,
);
criterion_main!(benches);
