use fragdb_core::geometry::{atomic_distance, fractional_to_cartesian, UnitCell};
use fragdb_core::listing::{parse_disagreeable_restraints, Severity};
use fragdb_core::residue::{is_valid_residue_class, next_free_residue_number};
use fragdb_core::restraints::{resolve_ranges, RangeError};
use fragdb_core::{
    check_sadi_consistency, validate_restraints, Diagnostic, FragmentAtom, RestraintCard,
    RestraintLine,
};

fn toluene() -> Vec<FragmentAtom> {
    ["C1", "C2", "C3", "C4", "C5", "C6", "C7"]
        .iter()
        .enumerate()
        .map(|(index, name)| FragmentAtom::new(*name, "6", [index as f64 * 1.4, 0.0, 0.0]))
        .collect()
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn card_keywords_follow_shelx_four_letter_rule() {
    assert_eq!(RestraintCard::parse("sadi_cf3"), Some(RestraintCard::Sadi));
    assert_eq!(RestraintCard::parse("RIGUx"), Some(RestraintCard::Rigu));
    assert_eq!(RestraintCard::parse("XYZW"), None);
    assert!(RestraintCard::Flat.is_restraint());
    assert!(!RestraintCard::Afix.is_restraint());
}

#[test]
fn ranges_expand_in_both_directions() {
    let order = names(&["C1", "C2", "C3", "C4", "C5"]);

    let forward = resolve_ranges(&names(&["SIMU", "c2", ">", "C4"]), &order).unwrap();
    assert_eq!(forward, names(&["SIMU", "c2", "C3", "C4"]));

    let backward = resolve_ranges(&names(&["C4", "<", "C2", "C5"]), &order).unwrap();
    assert_eq!(backward, names(&["C4", "C3", "C2", "C5"]));

    assert_eq!(
        resolve_ranges(&names(&["C1", ">"]), &order),
        Err(RangeError::DanglingOperator {
            position: 1,
            operator: ">".to_string()
        })
    );
}

#[test]
fn validation_collects_every_problem_with_line_numbers() {
    let report = validate_restraints(
        &[
            "SADI C1 C2 C3 C4",
            "",
            "DFIX 1.4 C1 Q7",
            "SIMU C1 >",
            "HELLO world",
            "AFIX 66 Q9",
        ],
        &toluene(),
        "Toluene, C7H8",
    );

    assert!(!report.is_valid());
    let errors = report.errors().cloned().collect::<Vec<_>>();
    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors[0],
        Diagnostic::UnknownAtom {
            line: 3,
            atom: "Q7".to_string()
        }
    );
    assert!(matches!(errors[1], Diagnostic::InvalidRange { line: 4, .. }));
    assert!(matches!(errors[2], Diagnostic::UnknownCard { line: 5, .. }));
    assert_eq!(report.lines.len(), 4);
}

#[test]
fn sadi_check_flags_the_odd_distance() {
    let mut atoms = toluene();
    atoms[6] = FragmentAtom::new("C7", "6", [8.9, 0.0, 0.0]);
    let lines = [
        RestraintLine::parse("SADI 0.02 C1 C2 C2 C3 C3 C4 C4 C5 C5 C6 C6 C7").unwrap(),
        RestraintLine::parse("SADI C1 C2 C2 C3").unwrap(),
    ];

    let findings = check_sadi_consistency(&atoms, &lines, &UnitCell::cartesian(), "Toluene");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].line, 1);
    assert_eq!(findings[0].sigma, 0.02);
    assert!(findings[0].exceeds_sigma);
    assert_eq!(
        findings[0].outlier_pairs,
        vec![("C6".to_string(), "C7".to_string())]
    );
}

#[test]
fn distances_respect_cell_metrics() {
    let cell = UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 120.0);
    let distance = atomic_distance([0.0, 0.0, 0.0], [0.1, 0.1, 0.0], &cell);
    assert!((distance - 1.0).abs() < 1e-9);

    let cartesian = fractional_to_cartesian([0.1, 0.1, 0.0], &cell);
    assert!((cartesian[0] - 0.5).abs() < 1e-9);
}

#[test]
fn residue_helpers() {
    assert!(is_valid_residue_class("CF3"));
    assert!(!is_valid_residue_class("3CF"));
    assert_eq!(next_free_residue_number(&[1, 2, 4]), 3);
    assert_eq!(next_free_residue_number(&[0, 2, 1]), 3);
}

#[test]
fn listing_severity_is_relative_to_sigma() {
    let listing = "
 Disagreeable restraints before cycle    5

    Observed   Target    Error     Sigma     Restraint

      1.4123   1.3900   0.0223    0.0050    DFIX 1.39 C1 C2
                        0.0310    0.0200    SADI C1 F1 C1 F2
 Summary of restraints applied in cycle     5
";
    let rows = parse_disagreeable_restraints(listing);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].severity(), Severity::Critical);
    assert!(rows[1].is_relative());
    assert_eq!(rows[1].severity(), Severity::Normal);
}
