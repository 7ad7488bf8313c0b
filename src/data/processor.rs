//! Data Processor Module
//! Crosswalk deduplication and the declared joins that build the joined table.

use crate::data::records::{JoinedRecord, NameLink, OutcomeRecord, PredominantDegree, SearchRecord};
use log::{debug, info};
use std::collections::HashMap;
use std::hash::Hash;

/// Which rows survive a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only rows with a match on both sides.
    Inner,
    /// Every left row; unmatched rows get `None` for the right side.
    Left,
}

/// Which side wins when both tables carry the same non-key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefer {
    Left,
    Right,
}

/// A declared equi-join: keys, kind and conflict rule.
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub name: &'static str,
    pub keys: &'static [&'static str],
    pub kind: JoinKind,
    pub prefer: Prefer,
}

impl JoinSpec {
    /// Pick the value of an overlapping field according to the conflict rule.
    pub fn resolve<T>(&self, left: T, right: T) -> T {
        match self.prefer {
            Prefer::Left => left,
            Prefer::Right => right,
        }
    }

    /// Hash join `left` against `right`.
    ///
    /// Output follows left-table order, then right-table order within a key.
    /// `combine` receives `None` only for unmatched rows of a left join and may
    /// return `None` to drop the row.
    pub fn execute<L, R, K, O>(
        &self,
        left: &[L],
        right: &[R],
        left_key: impl Fn(&L) -> K,
        right_key: impl Fn(&R) -> K,
        mut combine: impl FnMut(&L, Option<&R>) -> Option<O>,
    ) -> Vec<O>
    where
        K: Eq + Hash,
    {
        let mut index: HashMap<K, Vec<usize>> = HashMap::with_capacity(right.len());
        for (i, row) in right.iter().enumerate() {
            index.entry(right_key(row)).or_default().push(i);
        }

        let mut output = Vec::new();
        let mut unmatched = 0usize;
        for row in left {
            match index.get(&left_key(row)) {
                Some(matches) => {
                    output.extend(matches.iter().filter_map(|&i| combine(row, Some(&right[i]))))
                }
                None => {
                    unmatched += 1;
                    if self.kind == JoinKind::Left {
                        output.extend(combine(row, None));
                    }
                }
            }
        }

        debug!(
            "{} on {:?} ({:?}): {} x {} -> {} rows, {} left rows unmatched",
            self.name,
            self.keys,
            self.kind,
            left.len(),
            right.len(),
            output.len(),
            unmatched
        );
        output
    }
}

pub const SEARCH_JOIN: JoinSpec = JoinSpec {
    name: "name_link x search",
    keys: &["institution_name"],
    kind: JoinKind::Inner,
    prefer: Prefer::Left,
};

pub const OUTCOME_JOIN: JoinSpec = JoinSpec {
    name: "linked_search x outcomes",
    keys: &["unit_id", "operator_id"],
    kind: JoinKind::Inner,
    prefer: Prefer::Left,
};

/// A search row paired with its crosswalk entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedSearch {
    pub link: NameLink,
    pub search: SearchRecord,
}

/// Handles crosswalk cleaning and the joins feeding aggregation.
pub struct DataProcessor;

impl DataProcessor {
    /// Keep only names that map to exactly one crosswalk row.
    pub fn deduplicate_links(links: &[NameLink]) -> Vec<NameLink> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for link in links {
            *counts.entry(link.institution_name.as_str()).or_default() += 1;
        }

        let unique: Vec<NameLink> = links
            .iter()
            .filter(|link| counts.get(link.institution_name.as_str()) == Some(&1))
            .cloned()
            .collect();

        debug!(
            "Dropped {} crosswalk rows with ambiguous names",
            links.len() - unique.len()
        );
        unique
    }

    /// Attach identifiers to search rows by institution name.
    pub fn link_search(links: &[NameLink], search: &[SearchRecord]) -> Vec<LinkedSearch> {
        SEARCH_JOIN.execute(
            links,
            search,
            |link| link.institution_name.clone(),
            |record| record.institution_name.clone(),
            |link, record| {
                Some(LinkedSearch {
                    link: link.clone(),
                    search: record?.clone(),
                })
            },
        )
    }

    /// Keep outcome rows of the target degree type.
    pub fn filter_outcomes(
        outcomes: &[OutcomeRecord],
        target: PredominantDegree,
    ) -> Vec<OutcomeRecord> {
        outcomes
            .iter()
            .filter(|outcome| outcome.predominant_degree == Some(target))
            .cloned()
            .collect()
    }

    /// Attach outcomes on the composite `(unit_id, operator_id)` key.
    pub fn attach_outcomes(
        linked: &[LinkedSearch],
        outcomes: &[OutcomeRecord],
    ) -> Vec<JoinedRecord> {
        OUTCOME_JOIN.execute(
            linked,
            outcomes,
            |row| (row.link.unit_id, row.link.operator_id),
            |outcome| (outcome.unit_id, outcome.operator_id),
            |row, outcome| {
                let outcome = outcome?;
                Some(JoinedRecord {
                    institution_name: row.link.institution_name.clone(),
                    unit_id: row.link.unit_id,
                    operator_id: row.link.operator_id,
                    keyword: row.search.keyword.clone(),
                    period_label: row.search.period_label.clone(),
                    search_index: row.search.search_index,
                    predominant_degree: outcome.predominant_degree,
                    reported_earnings: outcome.reported_earnings,
                })
            },
        )
    }

    /// Run deduplication and all three joins.
    ///
    /// Returns the deduplicated crosswalk, the filtered outcomes and the joined table.
    pub fn build_joined(
        links: &[NameLink],
        search: &[SearchRecord],
        outcomes: &[OutcomeRecord],
        target: PredominantDegree,
    ) -> (Vec<NameLink>, Vec<OutcomeRecord>, Vec<JoinedRecord>) {
        let unique_links = Self::deduplicate_links(links);
        let linked = Self::link_search(&unique_links, search);
        let filtered = Self::filter_outcomes(outcomes, target);
        let joined = Self::attach_outcomes(&linked, &filtered);

        info!(
            "Joined table: {} rows ({} unique names, {} {:?} institutions)",
            joined.len(),
            unique_links.len(),
            filtered.len(),
            target
        );
        (unique_links, filtered, joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn link(name: &str, unit_id: i64, operator_id: i64) -> NameLink {
        NameLink {
            institution_name: name.to_string(),
            unit_id,
            operator_id,
        }
    }

    fn search(name: &str, index: Option<f64>) -> SearchRecord {
        SearchRecord {
            institution_name: name.to_string(),
            keyword: name.to_lowercase(),
            period_label: "2015-08-30 - 2015-09-05".to_string(),
            search_index: index,
        }
    }

    fn outcome(unit_id: i64, operator_id: i64, code: i64) -> OutcomeRecord {
        OutcomeRecord {
            unit_id,
            operator_id,
            predominant_degree: PredominantDegree::from_code(code),
            reported_earnings: Some(50000.0),
        }
    }

    #[test]
    fn test_deduplicate_drops_ambiguous_names() {
        let links = vec![
            link("Acme College", 1, 10),
            link("Twin University", 2, 20),
            link("Twin University", 3, 30),
            link("Solo Institute", 4, 40),
        ];
        let unique = DataProcessor::deduplicate_links(&links);
        let names: Vec<_> = unique.iter().map(|l| l.institution_name.as_str()).collect();
        assert_eq!(names, vec!["Acme College", "Solo Institute"]);

        let distinct: HashSet<_> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn test_link_search_is_inner() {
        let links = vec![link("Acme College", 1, 10), link("Unsearched", 2, 20)];
        let rows = vec![search("Acme College", Some(1.0)), search("Unlinked", Some(2.0))];
        let linked = DataProcessor::link_search(&links, &rows);
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].link.operator_id, 10);
    }

    #[test]
    fn test_composite_key_requires_both_ids() {
        let links = vec![link("Acme College", 1, 10), link("Reused Ope", 2, 10)];
        let rows = vec![search("Acme College", Some(1.0)), search("Reused Ope", Some(2.0))];
        let outcomes = vec![outcome(1, 10, 3), outcome(3, 10, 3)];

        let linked = DataProcessor::link_search(&links, &rows);
        let joined = DataProcessor::attach_outcomes(&linked, &outcomes);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].institution_name, "Acme College");
        let outcome_pairs: HashSet<_> = outcomes.iter().map(|o| (o.unit_id, o.operator_id)).collect();
        let link_pairs: HashSet<_> = links.iter().map(|l| (l.unit_id, l.operator_id)).collect();
        for row in &joined {
            assert!(outcome_pairs.contains(&(row.unit_id, row.operator_id)));
            assert!(link_pairs.contains(&(row.unit_id, row.operator_id)));
        }
    }

    #[test]
    fn test_non_target_degree_is_filtered() {
        let links = vec![link("Acme College", 1, 10), link("Community College", 2, 20)];
        let rows = vec![search("Acme College", Some(1.0)), search("Community College", Some(2.0))];
        let outcomes = vec![outcome(1, 10, 3), outcome(2, 20, 2)];

        let (_, filtered, joined) =
            DataProcessor::build_joined(&links, &rows, &outcomes, PredominantDegree::Bachelors);
        assert_eq!(filtered.len(), 1);
        assert!(joined.iter().all(|row| row.operator_id != 20));
    }

    #[test]
    fn test_empty_join_is_not_an_error() {
        let links = vec![link("Acme College", 1, 10)];
        let rows = vec![search("Acme College", Some(1.0))];
        let outcomes = vec![outcome(9, 99, 3)];
        let (_, _, joined) =
            DataProcessor::build_joined(&links, &rows, &outcomes, PredominantDegree::Bachelors);
        assert!(joined.is_empty());
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let spec = JoinSpec {
            name: "test",
            keys: &["id"],
            kind: JoinKind::Left,
            prefer: Prefer::Right,
        };
        let left = vec![(1, "a"), (2, "b")];
        let right = vec![(1, "x")];
        let out = spec.execute(
            &left,
            &right,
            |l| l.0,
            |r| r.0,
            |l, r| Some((l.0, r.map(|r| spec.resolve(l.1, r.1)))),
        );
        assert_eq!(out, vec![(1, Some("x")), (2, None)]);
    }
}
