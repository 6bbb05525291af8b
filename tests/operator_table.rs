//! Integration tests for table loading and registration: a whole authoring
//! table flows through the parser into the operator table, with failures
//! aggregated per operator.

mod common;

use common::types;
use dynsexp::{parse_operator_table, OperatorTable, TableError};

const MIXED_TABLE: &str = r#"
; scripting operators

$Operator: is-armed
$Category: Status
$Subcategory: Weapons
$Description: Whether the ship has any weapon armed.
$Parameter:
  +Description: ship
  +Type: ship
$Return Type: boolean
$End Operator

$Operator: scan-anomaly
$Category: Status
$Parameter:
  +Description: target
  +Type: anomaly          ; not a registered tag
$Return Type: number
$End Operator

$Operator: stagger-arrivals
$Category: Change
$Parameter:
  +Description: wing
  +Type: wing
$Repeat
$Parameter:
  +Description: ship
  +Type: ship
$Parameter:
  +Description: delay
  +Type: number
$End Repeat
$Return Type: none
$End Operator
"#;

#[test]
fn loads_good_operators_and_reports_bad_ones() {
    let types = types();
    let report = parse_operator_table(MIXED_TABLE, &types);

    let names: Vec<&str> = report.definitions.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["is-armed", "stagger-arrivals"]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0],
        TableError::UnknownType {
            operator: "scan-anomaly".to_string(),
            type_name: "anomaly".to_string(),
        }
    );

    let summary = report.summary().unwrap();
    assert!(summary.contains("scan-anomaly"));
    assert!(!summary.contains("is-armed"));
}

#[test]
fn parsed_definitions_register_into_the_table() {
    let types = types();
    let report = parse_operator_table(MIXED_TABLE, &types);

    let mut table = OperatorTable::new();
    for (i, def) in report.definitions.into_iter().enumerate() {
        table.register(1000 + i as u32, def).unwrap();
    }

    assert_eq!(table.len(), 2);
    let stagger = table.lookup(1001).unwrap();
    assert_eq!(stagger.name(), "stagger-arrivals");
    assert_eq!(stagger.min_args(), 1);
    assert_eq!(stagger.max_args(), None);
    assert_eq!(stagger.vararg_pattern().len(), 2);
    // Validation happened at parse time; activation is this separate step.
    assert_eq!(table.handler_kind(1001), None);
}

#[test]
fn vararg_contract_survives_registration() {
    let types = types();
    let ship = types.resolve("ship").unwrap();
    let number = types.resolve("number").unwrap();
    let wing = types.resolve("wing").unwrap();

    let report = parse_operator_table(MIXED_TABLE, &types);
    let stagger = report
        .definitions
        .iter()
        .find(|d| d.name() == "stagger-arrivals")
        .unwrap();

    assert_eq!(stagger.type_for_position(0), Some(wing));
    assert_eq!(stagger.type_for_position(1), Some(ship));
    assert_eq!(stagger.type_for_position(2), Some(number));
    assert_eq!(stagger.type_for_position(3), Some(ship));
}

#[test]
fn whole_table_of_failures_loads_nothing_but_keeps_going() {
    let types = types();
    let source = r#"
$Operator: one
$Parameter:
  +Type: phantom
$End Operator
$Operator: two
$Repeat
$End Repeat
$End Operator
"#;
    let report = parse_operator_table(source, &types);
    assert!(report.definitions.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].operator(), "one");
    assert_eq!(report.failures[1].operator(), "two");
}
