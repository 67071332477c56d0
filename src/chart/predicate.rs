/// Build the TSI predicate restricting an aggregate to the given sensors.
///
/// Produces `SensorId in ('a', 'b', 'c')`. An empty slice yields
/// `SensorId in ('')`, which matches nothing.
///
/// Ids are inserted verbatim: a `'` inside an id breaks the predicate.
pub fn build_predicate_string<S: AsRef<str>>(sensor_ids: &[S]) -> String {
    let joined = sensor_ids
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("', '");

    format!("SensorId in ('{joined}')")
}
