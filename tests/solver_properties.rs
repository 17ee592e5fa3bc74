use approx::assert_relative_eq;
use fea_nonlinear::assembly::{Assembler, DofMap};
use fea_nonlinear::math::{Mat, Vec as FEVec};
use fea_nonlinear::prelude::*;

/// Two-grip element with the global stiffness [[B, -B], [-B, B]]
fn coupled_block_element(i: usize, j: usize) -> LinearElement {
    let b = Mat::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
    let mut k = Mat::zeros(4, 4);
    k.view_mut((0, 0), (2, 2)).copy_from(&b);
    k.view_mut((2, 2), (2, 2)).copy_from(&b);
    k.view_mut((0, 2), (2, 2)).copy_from(&(-&b));
    k.view_mut((2, 0), (2, 2)).copy_from(&(-&b));
    LinearElement::new(vec![i, j], k).unwrap()
}

fn coupled_block_model() -> (FEModel, usize, usize) {
    let mut model = FEModel::new();
    let fixed = model
        .add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))
        .unwrap();
    let free = model.add_grip(Grip::new(1.0, 0.0)).unwrap();
    model.add_element(coupled_block_element(fixed, free)).unwrap();
    model.add_grip_load(free, GripLoad::fx(100.0)).unwrap();
    (model, fixed, free)
}

#[test]
fn force_vector_scatters_grip_loads() {
    let mut model = FEModel::new();
    let a = model.add_grip(Grip::new(0.0, 0.0)).unwrap();
    let b = model.add_grip(Grip::new(1.0, 0.0)).unwrap();
    let c = model.add_grip(Grip::new(2.0, 0.0)).unwrap();
    model.add_grip_load(a, GripLoad::force(1.0, 2.0)).unwrap();
    model.add_grip_load(c, GripLoad::fy(-7.0)).unwrap();
    model.add_grip_load(b, GripLoad::fx(3.0)).unwrap();

    let map = DofMap::from_grips(model.grips()).unwrap();
    let f = map.force_vector(model.grips());
    assert_eq!(f.as_slice(), &[1.0, 2.0, 3.0, 0.0, 0.0, -7.0]);
}

#[test]
fn shared_grip_contributions_superpose() {
    let mut model = FEModel::new();
    let a = model.add_grip(Grip::new(0.0, 0.0)).unwrap();
    let b = model.add_grip(Grip::new(1.0, 0.0)).unwrap();
    let c = model.add_grip(Grip::new(2.0, 0.0)).unwrap();

    let elements: Vec<Box<dyn FiniteElement>> = vec![
        Box::new(LinearElement::spring(a, b, 10.0, [1.0, 0.0]).unwrap()),
        Box::new(LinearElement::spring(b, c, 30.0, [1.0, 0.0]).unwrap()),
    ];
    let map = DofMap::from_grips(model.grips()).unwrap();
    let k = Assembler::new(&map)
        .assemble_stiffness(model.grips(), &elements)
        .unwrap();

    // Grip b collects both springs on its x DoF
    assert_relative_eq!(k[(2, 2)], 40.0);
    assert_relative_eq!(k[(0, 2)], -10.0);
    assert_relative_eq!(k[(2, 4)], -30.0);
    assert_relative_eq!(k[(0, 4)], 0.0);
    assert_relative_eq!(k[(3, 3)], 0.0);
}

#[test]
fn constrained_dofs_become_identity_rows() {
    let (model, _, _) = coupled_block_model();
    let elements: Vec<Box<dyn FiniteElement>> = vec![Box::new(coupled_block_element(1, 2))];
    let map = DofMap::from_grips(model.grips()).unwrap();
    let assembler = Assembler::new(&map);

    let mut k = assembler.assemble_stiffness(model.grips(), &elements).unwrap();
    let mut f = map.force_vector(model.grips());
    assembler.simplify(&mut k, &mut f);

    for dof in [0, 1] {
        for other in 0..4 {
            let expected = if other == dof { 1.0 } else { 0.0 };
            assert_eq!(k[(dof, other)], expected);
            assert_eq!(k[(other, dof)], expected);
        }
        assert_eq!(f[dof], 0.0);
    }
    assert_eq!(k[(2, 3)], 0.5);
    assert_eq!(f[2], 100.0);
}

#[test]
fn linear_analysis_matches_direct_solve() {
    let (mut model, fixed, free) = coupled_block_model();
    let results = model.analyze_linear().unwrap();

    assert!(results.is_complete());
    assert_eq!(results.steps.len(), 1);
    assert_eq!(results.steps[0].iterations, 1);
    assert!(results.steps[0].converged);
    assert_eq!(results.steps[0].load_factor, 1.0);

    // Simplified system: identity on grip 1, B on grip 2
    let mut k = Mat::identity(4, 4);
    k[(2, 2)] = 2.0;
    k[(2, 3)] = 0.5;
    k[(3, 2)] = 0.5;
    k[(3, 3)] = 1.0;
    let f = FEVec::from_vec(vec![0.0, 0.0, 100.0, 0.0]);
    let expected = k.try_inverse().unwrap() * f;

    let u = model.grip_displacement(free).unwrap();
    assert_relative_eq!(u.dx, expected[2], max_relative = 1e-12);
    assert_relative_eq!(u.dy, expected[3], max_relative = 1e-12);
    assert_relative_eq!(u.dx, 100.0 / 1.75, max_relative = 1e-12);

    let fixed_u = model.grip_displacement(fixed).unwrap();
    assert_eq!((fixed_u.dx, fixed_u.dy), (0.0, 0.0));

    // The support carries the whole load
    let r = model.grip_reactions(fixed).unwrap();
    assert_relative_eq!(r.fx, -100.0, epsilon = 1e-9);
    assert_relative_eq!(r.fy, 0.0, epsilon = 1e-9);
}

#[test]
fn equal_steps_on_linear_model_scale_displacement() {
    let (mut model, _, free) = coupled_block_model();
    let results = model.analyze(AnalysisOptions::nonlinear(2)).unwrap();
    assert!(results.is_complete());
    assert_eq!(results.steps.len(), 2);

    let first = results.steps[0].grip_displacement(free).unwrap();
    let second = results.steps[1].grip_displacement(free).unwrap();
    assert_relative_eq!(results.steps[0].load_factor, 0.5);
    assert_relative_eq!(second.dx, 2.0 * first.dx, max_relative = 1e-12);
    assert_relative_eq!(second.dy, 2.0 * first.dy, max_relative = 1e-12);

    // A linear model converges on its first solve
    for step in &results.steps {
        assert_eq!(step.iterations, 1);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let (mut model, _, _) = coupled_block_model();

    let bad_tolerance = AnalysisOptions::nonlinear(2).with_tolerances(0.0, 1e-6);
    assert!(matches!(
        model.analyze(bad_tolerance),
        Err(FEAError::InvalidParameters(_))
    ));

    let inverted = AnalysisOptions::nonlinear(2).with_min_iter(5).with_max_iter(2);
    assert!(matches!(
        model.analyze(inverted),
        Err(FEAError::InvalidParameters(_))
    ));

    let json = r#"{"force_tolerance": -1.0, "displacement_tolerance": 1e-6,
        "min_iterations": 0, "max_iterations": 10,
        "solver": "Secant", "control": "Force"}"#;
    assert!(AnalysisParameters::from_json(json).is_err());
    assert!(!model.is_analyzed());
}

#[test]
fn csv_export_has_one_row_per_step() {
    let (mut model, _, free) = coupled_block_model();
    let results = model.analyze(AnalysisOptions::nonlinear(4)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("steps.csv");
    CsvExporter::new(&path)
        .with_grip(free)
        .write_steps(results)
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("step,load_factor"));
    assert!(lines[4].starts_with("4,1.000000,"));
    assert!(lines.iter().skip(1).all(|l| l.ends_with("true")));
}
