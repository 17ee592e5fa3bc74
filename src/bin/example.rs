//! FEA Nonlinear Example - von Mises two-bar arch snap-through

use anyhow::Result;
use fea_nonlinear::prelude::*;

fn build_arch(span: f64, rise: f64, material: Material, load: f64) -> Result<(FEModel, usize)> {
    let mut model = FEModel::new();

    //            G2
    //          /    \
    //        /        \
    //      G1          G3
    //      ^            ^
    //    Pinned       Pinned
    let g1 = model.add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))?;
    let g2 = model.add_grip(Grip::new(span, rise))?;
    let g3 = model.add_grip(Grip::new(2.0 * span, 0.0).with_constraint(Constraint::fixed()))?;

    model.add_element(Truss::new(g1, g2, material))?;
    model.add_element(Truss::new(g2, g3, material))?;
    model.add_grip_load(g2, GripLoad::fy(-load))?;

    Ok((model, g2))
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== FEA Nonlinear Example: von Mises Arch ===\n");

    // Half span 2 m, rise 0.5 m, EA = 1 MN
    let span = 2.0;
    let rise = 0.5;
    let material = Material::new(1e8, 1e-2);
    let length = f64::hypot(span, rise);
    let ea = material.axial_rigidity();
    let limit = 2.0 * ea * rise.powi(3) / (3.0 * 3.0_f64.sqrt() * length.powi(3));
    println!("Analytic limit load: {:.2} kN\n", limit / 1000.0);

    // Displacement control traces the full snap-through path
    let (mut model, apex) = build_arch(span, rise, material, 1000.0)?;
    model.set_monitor(apex, Axis::Y)?;

    println!("Running displacement-controlled analysis...\n");
    let options = AnalysisOptions::displacement_controlled(40, -2.0 * rise);
    let results = model.analyze(options)?;

    println!("Load-deflection curve at the apex:");
    for sample in results.monitor_samples().iter().step_by(4) {
        println!(
            "  step {:>2}: v = {:8.2}mm, P = {:8.2}kN",
            sample.step,
            sample.displacement * 1000.0,
            -sample.load_factor
        );
    }

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "von_mises_curve.csv".to_string());
    CsvExporter::new(&path)
        .with_units(LengthUnit::Millimeter, ForceUnit::Kilonewton)
        .write_steps(results)?;
    println!("\nCurve written to {}", path);

    let summary = model.summary()?;
    println!("\nSummary:");
    println!(
        "  Max displacement: {:.2}mm at grip {}",
        summary.max_displacement * 1000.0,
        summary.max_disp_grip
    );
    println!(
        "  Max reaction: {:.2}kN at grip {}",
        summary.max_reaction / 1000.0,
        summary.max_reaction_grip
    );
    println!("  Load steps: {}, iterations: {}", summary.load_steps, summary.total_iterations);

    // Force control below the limit load, per solver
    println!("\n=== Solver Comparison at 80% of the Limit Load ===\n");
    for solver in [
        SolverKind::NewtonRaphson,
        SolverKind::ModifiedNewtonRaphson,
        SolverKind::Secant,
    ] {
        let (mut model, apex) = build_arch(span, rise, material, 0.8 * limit)?;
        let options = AnalysisOptions::nonlinear(8)
            .with_solver(solver)
            .with_max_iter(100);
        let results = model.analyze(options)?;
        if let AnalysisStatus::Diverged { step, reason } = results.status {
            println!("  {:<24} diverged at step {}: {}", format!("{:?}", solver), step, reason);
            continue;
        }
        let total = results.total_iterations();
        let disp = model.grip_displacement(apex)?;
        println!(
            "  {:<24} DY = {:8.3}mm after {:>3} iterations",
            format!("{:?}", solver),
            disp.dy * 1000.0,
            total
        );
    }

    println!("\n=== Analysis Complete ===");
    Ok(())
}
