//! Unit tests for the sensor predicate builder.
//!
//! Run with: cargo test --test predicate_unit_test

use tsi_chart::chart::build_predicate_string;

#[test]
fn predicate_lists_every_id_in_order() {
    assert_eq!(
        build_predicate_string(&["a", "b", "c"]),
        "SensorId in ('a', 'b', 'c')"
    );
}

#[test]
fn single_id_has_no_separator() {
    assert_eq!(build_predicate_string(&["x"]), "SensorId in ('x')");
}

#[test]
fn duplicate_ids_are_kept() {
    assert_eq!(
        build_predicate_string(&["m1", "m1"]),
        "SensorId in ('m1', 'm1')"
    );
}

#[test]
fn quotes_in_ids_are_not_escaped() {
    // Known limitation: the quote ends the literal early.
    assert_eq!(
        build_predicate_string(&["o'brien"]),
        "SensorId in ('o'brien')"
    );
}
