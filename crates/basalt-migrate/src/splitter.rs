//! Migration splitting.
//!
//! The splitter takes the unordered operation list produced by a model diff
//! and turns it into the ordered step sequence the executor applies. The
//! target engine has no transactional DDL, so a failed migration leaves
//! partial state; the ordering and the per-step history records produced
//! here are what make migrations safe to run and safe to resume.
//!
//! Scheduling is two-pass. Operations are first partitioned into the nine
//! phase buckets, which alone guarantees the coarse ordering (drops before
//! creates, base tables and columns before the derived objects that read
//! them, indexes and projections last). Then, inside the two phases that can
//! hold mutually dependent materialized views and dictionaries, a stable
//! topological sort orders cascading chains, with edges reversed on the
//! drop side. Ties always keep their input order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::classify::{depends_on, phase_of, provides, Phase};
use crate::error::{MigrateError, Result};
use crate::operations::Operation;
use crate::step::{Step, MAX_STEPS_PER_MIGRATION};

/// Splits one migration's operations into an ordered step sequence.
///
/// The result is all-or-nothing: either every operation is scheduled and
/// numbered, or a typed error is returned. Empty input yields an empty step
/// list, not an error.
///
/// # Errors
///
/// - [`MigrateError::TooManySteps`] if the operation count exceeds the
///   3-digit step-suffix ceiling.
/// - [`MigrateError::DependencyCycle`] if derived objects within one phase
///   depend on each other in a cycle.
pub fn split(operations: Vec<Operation>) -> Result<Vec<Step>> {
    if operations.len() > MAX_STEPS_PER_MIGRATION {
        return Err(MigrateError::TooManySteps {
            count: operations.len(),
            limit: MAX_STEPS_PER_MIGRATION,
        });
    }

    // Pass 1: phase buckets, each preserving input order. Phase derives Ord,
    // so iterating the map visits buckets in execution order.
    let mut buckets: BTreeMap<Phase, Vec<(usize, Operation)>> = BTreeMap::new();
    for (original_index, operation) in operations.into_iter().enumerate() {
        buckets
            .entry(phase_of(&operation))
            .or_default()
            .push((original_index, operation));
    }

    // Pass 2: dependency ordering inside the derived-object phases.
    let mut ordered = Vec::new();
    for (phase, bucket) in buckets {
        debug!(phase = phase.rank(), operations = bucket.len(), "scheduling bucket");
        if phase.needs_dependency_ordering() && bucket.len() > 1 {
            ordered.append(&mut sort_bucket(phase, bucket)?);
        } else {
            ordered.extend(bucket);
        }
    }

    Ok(ordered
        .into_iter()
        .enumerate()
        .map(|(position, (original_index, operation))| {
            Step::new(position + 1, original_index, operation)
        })
        .collect())
}

/// Topologically sorts one bucket of derived-object operations.
///
/// Objects are keyed by name; edges only exist between operations whose
/// provider is present in the same bucket, so a source created by an earlier
/// migration produces no edge and the operation keeps its input position.
/// On the create side a source is scheduled before its dependents; on the
/// drop side a dependent is dropped before its source.
fn sort_bucket(phase: Phase, bucket: Vec<(usize, Operation)>) -> Result<Vec<(usize, Operation)>> {
    let mut in_degree = vec![0usize; bucket.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); bucket.len()];

    {
        let providers: HashMap<&str, usize> = bucket
            .iter()
            .enumerate()
            .filter_map(|(position, (_, operation))| {
                provides(operation).map(|name| (name, position))
            })
            .collect();

        for (position, (_, operation)) in bucket.iter().enumerate() {
            let Some(source) = depends_on(operation) else {
                continue;
            };
            let Some(&source_position) = providers.get(source) else {
                continue;
            };
            if source_position == position {
                continue;
            }
            let (from, to) = if phase.is_drop_side() {
                (position, source_position)
            } else {
                (source_position, position)
            };
            dependents[from].push(to);
            in_degree[to] += 1;
        }
    }

    // Kahn's algorithm. The ready set is keyed by bucket position, which is
    // input order, so unrelated operations keep their relative order.
    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(position, _)| position)
        .collect();
    let mut order = Vec::with_capacity(bucket.len());

    while let Some(position) = ready.pop_first() {
        order.push(position);
        for &dependent in &dependents[position] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != bucket.len() {
        let mut objects: Vec<String> = bucket
            .iter()
            .enumerate()
            .filter(|(position, _)| in_degree[*position] > 0)
            .map(|(_, (_, operation))| {
                operation
                    .target()
                    .unwrap_or_else(|| operation.kind_name())
                    .to_string()
            })
            .collect();
        objects.sort();
        return Err(MigrateError::DependencyCycle { phase, objects });
    }

    let mut slots: Vec<Option<(usize, Operation)>> = bucket.into_iter().map(Some).collect();
    let mut sorted = Vec::with_capacity(slots.len());
    for position in order {
        if let Some(entry) = slots[position].take() {
            sorted.push(entry);
        }
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::TableAnnotations;

    fn ranks(steps: &[Step]) -> Vec<u8> {
        steps.iter().map(|s| phase_of(&s.operation).rank()).collect()
    }

    fn targets(steps: &[Step]) -> Vec<&str> {
        steps
            .iter()
            .map(|s| s.operation.target().unwrap_or(""))
            .collect()
    }

    fn assert_phase_monotonic(steps: &[Step]) {
        let ranks = ranks(steps);
        for window in ranks.windows(2) {
            assert!(window[0] <= window[1], "phase order violated: {ranks:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split(vec![]).unwrap(), vec![]);
    }

    #[test]
    fn test_step_numbering_is_contiguous() {
        let operations: Vec<Operation> = (0..12)
            .map(|i| Operation::raw_statement(format!("STATEMENT {i}")))
            .collect();
        let steps = split(operations).unwrap();

        assert_eq!(steps.len(), 12);
        for (position, step) in steps.iter().enumerate() {
            assert_eq!(step.step_number, position + 1);
        }
        assert_eq!(steps[0].step_suffix, "001");
        assert_eq!(steps[9].step_suffix, "010");
        assert_eq!(steps[11].step_suffix, "012");
    }

    #[test]
    fn test_step_ceiling() {
        let at_limit: Vec<Operation> = (0..999).map(|_| Operation::raw_statement("X")).collect();
        let steps = split(at_limit).unwrap();
        assert_eq!(steps.len(), 999);
        assert_eq!(steps.last().unwrap().step_suffix, "999");

        let over_limit: Vec<Operation> = (0..1000).map(|_| Operation::raw_statement("X")).collect();
        let result = split(over_limit);
        assert!(matches!(
            result,
            Err(MigrateError::TooManySteps { count: 1000, limit: 999 })
        ));
    }

    #[test]
    fn test_index_waits_for_table() {
        // Scenario A: the index arrives before the table it indexes.
        let steps = split(vec![
            Operation::create_index("IX_Orders_Date", "Orders"),
            Operation::create_table("Orders"),
        ])
        .unwrap();

        assert_eq!(steps[0].description, "CreateTable_Orders");
        assert_eq!(steps[1].description, "CreateIndex_Orders_IX_Orders_Date");
        assert_eq!(steps[0].original_index, 1);
        assert_eq!(steps[1].original_index, 0);
    }

    #[test]
    fn test_cascading_views_follow_their_sources() {
        // Scenario B: a view over a view, listed dependent-first.
        let steps = split(vec![
            Operation::create_materialized_view("mv_daily", "mv_hourly"),
            Operation::create_materialized_view("mv_hourly", "raw_events"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["mv_hourly", "mv_daily"]);
    }

    #[test]
    fn test_cascade_of_three_under_permutation() {
        let chain = |names: [&str; 3]| {
            names
                .into_iter()
                .map(|name| match name {
                    "a" => Operation::create_materialized_view("a", "base"),
                    "b" => Operation::create_materialized_view("b", "a"),
                    _ => Operation::create_materialized_view("c", "b"),
                })
                .collect::<Vec<_>>()
        };

        for permutation in [
            ["a", "b", "c"],
            ["c", "b", "a"],
            ["b", "c", "a"],
            ["c", "a", "b"],
        ] {
            let steps = split(chain(permutation)).unwrap();
            assert_eq!(targets(&steps), vec!["a", "b", "c"], "input {permutation:?}");
        }
    }

    #[test]
    fn test_cascade_of_four_reversed_and_shuffled() {
        let op = |name: &str, source: &str| Operation::create_materialized_view(name, source);
        let reversed = vec![
            op("v4", "v3"),
            op("v3", "v2"),
            op("v2", "v1"),
            op("v1", "events"),
        ];
        let shuffled = vec![
            op("v2", "v1"),
            op("v4", "v3"),
            op("v1", "events"),
            op("v3", "v2"),
        ];

        for input in [reversed, shuffled] {
            let steps = split(input).unwrap();
            assert_eq!(targets(&steps), vec!["v1", "v2", "v3", "v4"]);
        }
    }

    #[test]
    fn test_drops_run_dependent_first() {
        // mv_daily reads mv_hourly: the dependent must drop first.
        let steps = split(vec![
            Operation::drop_materialized_view("mv_hourly", "raw_events"),
            Operation::drop_materialized_view("mv_daily", "mv_hourly"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["mv_daily", "mv_hourly"]);
    }

    #[test]
    fn test_drop_chain_fully_reversed() {
        let op = |name: &str, source: &str| Operation::drop_materialized_view(name, source);
        let steps = split(vec![
            op("v1", "events"),
            op("v2", "v1"),
            op("v3", "v2"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["v3", "v2", "v1"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        // Three independent views over tables outside the batch.
        let steps = split(vec![
            Operation::create_materialized_view("mv_c", "t3"),
            Operation::create_materialized_view("mv_a", "t1"),
            Operation::create_materialized_view("mv_b", "t2"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["mv_c", "mv_a", "mv_b"]);
        let original: Vec<usize> = steps.iter().map(|s| s.original_index).collect();
        assert_eq!(original, vec![0, 1, 2]);
    }

    #[test]
    fn test_source_outside_batch_is_ignored() {
        // Cross-migration dependency: the source table was created by an
        // earlier migration, so no same-batch edge exists and phase order
        // alone places the view after everything it could read.
        let steps = split(vec![
            Operation::create_materialized_view("mv", "preexisting"),
            Operation::create_table("unrelated"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["unrelated", "mv"]);
        assert_phase_monotonic(&steps);
    }

    #[test]
    fn test_unresolved_source_sorts_after_base_objects() {
        let steps = split(vec![
            Operation::create_table_with("mv", TableAnnotations::materialized_view(None)),
            Operation::create_table("base"),
            Operation::add_column("base", "value"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["base", "base", "mv"]);
    }

    #[test]
    fn test_dependency_cycle_is_fatal() {
        let result = split(vec![
            Operation::create_materialized_view("mv_a", "mv_b"),
            Operation::create_materialized_view("mv_b", "mv_a"),
            Operation::create_materialized_view("mv_ok", "elsewhere"),
        ]);

        match result {
            Err(MigrateError::DependencyCycle { phase, objects }) => {
                assert_eq!(phase, Phase::CreateDerivedObjects);
                assert_eq!(objects, vec!["mv_a".to_string(), "mv_b".to_string()]);
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_referential_source_is_not_a_cycle() {
        // A view annotated as reading itself carries no usable edge.
        let steps = split(vec![Operation::create_materialized_view("mv", "mv")]).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_dependency_satisfaction_across_phases() {
        let steps = split(vec![
            Operation::add_projection("by_user", "events"),
            Operation::create_index("ix_date", "events"),
            Operation::create_materialized_view("mv", "events"),
            Operation::add_column("events", "user_id"),
            Operation::create_table("events"),
        ])
        .unwrap();

        let position = |description: &str| {
            steps
                .iter()
                .position(|s| s.description == description)
                .unwrap()
        };

        let table = position("CreateTable_events");
        assert!(table < position("AddColumn_events_user_id"));
        assert!(table < position("CreateTable_mv"));
        assert!(table < position("CreateIndex_events_ix_date"));
        assert!(table < position("AddProjection_events_by_user"));
        assert_phase_monotonic(&steps);
    }

    #[test]
    fn test_scrambled_batch_groups_by_phase() {
        // Scenario C: seven operations spanning five phases.
        let steps = split(vec![
            Operation::create_index("ix_new", "orders"),
            Operation::drop_materialized_view("mv_old", "orders"),
            Operation::alter_column("orders", "total"),
            Operation::create_materialized_view("mv_new", "orders"),
            Operation::drop_projection("p_old", "orders"),
            Operation::drop_index("ix_old", "orders"),
            Operation::alter_column("orders", "status"),
        ])
        .unwrap();

        assert_eq!(ranks(&steps), vec![1, 1, 2, 6, 7, 7, 8]);
        assert_eq!(steps[0].description, "DropProjection_orders_p_old");
        assert_eq!(steps[1].description, "DropIndex_orders_ix_old");
        assert_eq!(steps[2].description, "DropTable_mv_old");
        assert_eq!(steps[3].description, "CreateTable_mv_new");
        // Same-phase ties keep input order.
        assert_eq!(steps[4].description, "AlterColumn_orders_total");
        assert_eq!(steps[5].description, "AlterColumn_orders_status");
        assert_eq!(steps[6].description, "CreateIndex_orders_ix_new");
    }

    #[test]
    fn test_mixed_views_and_dictionaries_in_one_cascade() {
        let steps = split(vec![
            Operation::create_dictionary("dim_user", "mv_users"),
            Operation::create_materialized_view("mv_users", "raw_users"),
        ])
        .unwrap();

        assert_eq!(targets(&steps), vec!["mv_users", "dim_user"]);
    }

    #[test]
    fn test_split_never_partially_emits() {
        let result = split(vec![
            Operation::create_table("fine"),
            Operation::create_materialized_view("mv_a", "mv_b"),
            Operation::create_materialized_view("mv_b", "mv_a"),
        ]);
        assert!(result.is_err());
    }
}
