//! Restores the attributes aggregation drops (name, unit id, earnings).

use crate::data::processor::{JoinKind, JoinSpec, Prefer};
use crate::data::records::{
    InstitutionAttributes, NameLink, OutcomeRecord, ReconstructedRecord, WeeklyAggregate,
};
use log::{debug, info};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Crosswalk x outcomes on operator id, keeping links without outcomes;
/// the crosswalk's unit id wins.
pub const ATTRIBUTE_JOIN: JoinSpec = JoinSpec {
    name: "name_link x outcomes",
    keys: &["operator_id"],
    kind: JoinKind::Left,
    prefer: Prefer::Left,
};

/// Weekly totals x attributes on operator id, keeping unmatched weeks.
pub const WEEKLY_JOIN: JoinSpec = JoinSpec {
    name: "weekly x attributes",
    keys: &["operator_id"],
    kind: JoinKind::Left,
    prefer: Prefer::Left,
};

/// `1` at or above the threshold, `0` below, `None` when unreported.
pub fn earnings_class(earnings: Option<f64>, threshold: f64) -> Option<u8> {
    earnings.map(|value| u8::from(value >= threshold))
}

pub struct Reconstructor;

impl Reconstructor {
    /// One attribute row per operator id.
    ///
    /// Among candidates sharing an operator id the first by
    /// `(institution_name, unit_id)` is kept. Ties between outcome rows go to
    /// the outcome whose unit id matches the crosswalk, then to the smallest
    /// outcome unit id. Links without an outcome keep empty attributes.
    pub fn attributes(
        links: &[NameLink],
        outcomes: &[OutcomeRecord],
        earnings_threshold: f64,
    ) -> Vec<InstitutionAttributes> {
        let candidates = ATTRIBUTE_JOIN.execute(
            links,
            outcomes,
            |link| link.operator_id,
            |outcome| outcome.operator_id,
            |link, outcome| {
                let attrs = InstitutionAttributes {
                    operator_id: link.operator_id,
                    unit_id: match outcome {
                        Some(outcome) => ATTRIBUTE_JOIN.resolve(link.unit_id, outcome.unit_id),
                        None => link.unit_id,
                    },
                    institution_name: link.institution_name.clone(),
                    predominant_degree: outcome.and_then(|o| o.predominant_degree),
                    reported_earnings: outcome.and_then(|o| o.reported_earnings),
                    earnings_class: earnings_class(
                        outcome.and_then(|o| o.reported_earnings),
                        earnings_threshold,
                    ),
                };
                let rank = outcome.map(|o| (o.unit_id != link.unit_id, o.unit_id));
                Some((attrs, rank))
            },
        );

        let mut by_operator: BTreeMap<i64, (InstitutionAttributes, Option<(bool, i64)>)> =
            BTreeMap::new();
        for (candidate, rank) in candidates {
            match by_operator.entry(candidate.operator_id) {
                Entry::Vacant(slot) => {
                    slot.insert((candidate, rank));
                }
                Entry::Occupied(mut slot) => {
                    let (kept, kept_rank) = slot.get();
                    let key = (&candidate.institution_name, candidate.unit_id, rank);
                    if key < (&kept.institution_name, kept.unit_id, *kept_rank) {
                        slot.insert((candidate, rank));
                    }
                }
            }
        }

        let attributes: Vec<InstitutionAttributes> =
            by_operator.into_values().map(|(attrs, _)| attrs).collect();
        let without_outcome = attributes
            .iter()
            .filter(|a| a.predominant_degree.is_none() && a.reported_earnings.is_none())
            .count();
        debug!(
            "Built {} attribute rows ({} without outcome data)",
            attributes.len(),
            without_outcome
        );
        attributes
    }

    /// Left-join weekly totals with their attributes.
    pub fn reconstruct(
        weekly: &[WeeklyAggregate],
        attributes: &[InstitutionAttributes],
    ) -> Vec<ReconstructedRecord> {
        let records = WEEKLY_JOIN.execute(
            weekly,
            attributes,
            |week| week.operator_id,
            |attrs| attrs.operator_id,
            |week, attrs| {
                Some(ReconstructedRecord {
                    operator_id: week.operator_id,
                    week_start: week.week_start,
                    total_index: week.total_index,
                    attributes: attrs.cloned(),
                })
            },
        );

        let missing = records.iter().filter(|r| r.attributes.is_none()).count();
        info!(
            "Reconstructed {} institution-weeks ({} without attributes)",
            records.len(),
            missing
        );
        records
    }
}
