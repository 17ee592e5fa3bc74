//! Benchmarks for the nonlinear FEA solver

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fea_nonlinear::prelude::*;

/// Straight chain of linear trusses along x, clamped at the first grip
fn create_truss_chain(segments: usize) -> FEModel {
    let mut model = FEModel::new();
    let material = Material::steel(1e-3);

    let mut previous = model
        .add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))
        .unwrap();
    for i in 1..=segments {
        let grip = model
            .add_grip(Grip::new(i as f64, 0.0).with_constraint(Constraint::roller_y()))
            .unwrap();
        model
            .add_element(Truss::linear(previous, grip, material))
            .unwrap();
        previous = grip;
    }
    model.add_grip_load(previous, GripLoad::fx(10_000.0)).unwrap();

    model
}

fn create_von_mises_arch(load: f64) -> (FEModel, usize) {
    let mut model = FEModel::new();
    let material = Material::new(1e8, 1e-2);

    let left = model
        .add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))
        .unwrap();
    let apex = model.add_grip(Grip::new(2.0, 0.5)).unwrap();
    let right = model
        .add_grip(Grip::new(4.0, 0.0).with_constraint(Constraint::fixed()))
        .unwrap();
    model.add_element(Truss::new(left, apex, material)).unwrap();
    model.add_element(Truss::new(apex, right, material)).unwrap();
    model.add_grip_load(apex, GripLoad::fy(-load)).unwrap();

    (model, apex)
}

fn benchmark_truss_chain(c: &mut Criterion) {
    c.bench_function("truss_chain_50_linear", |b| {
        b.iter(|| {
            let mut model = create_truss_chain(50);
            model.analyze_linear().unwrap();
            black_box(&model);
        })
    });

    c.bench_function("truss_chain_50_linear_sparse", |b| {
        b.iter(|| {
            let mut model = create_truss_chain(50);
            model
                .analyze(AnalysisOptions::linear().with_sparse())
                .unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_arch_solvers(c: &mut Criterion) {
    for (name, solver) in [
        ("arch_newton_raphson", SolverKind::NewtonRaphson),
        ("arch_modified_newton_raphson", SolverKind::ModifiedNewtonRaphson),
        ("arch_secant", SolverKind::Secant),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let (mut model, _) = create_von_mises_arch(2000.0);
                let options = AnalysisOptions::nonlinear(10)
                    .with_solver(solver)
                    .with_max_iter(100);
                model.analyze(options).unwrap();
                black_box(&model);
            })
        });
    }
}

fn benchmark_snap_through(c: &mut Criterion) {
    c.bench_function("arch_displacement_control_40", |b| {
        b.iter(|| {
            let (mut model, apex) = create_von_mises_arch(1000.0);
            model.set_monitor(apex, Axis::Y).unwrap();
            model
                .analyze(AnalysisOptions::displacement_controlled(40, -1.0))
                .unwrap();
            black_box(&model);
        })
    });
}

criterion_group!(
    benches,
    benchmark_truss_chain,
    benchmark_arch_solvers,
    benchmark_snap_through,
);

criterion_main!(benches);
