//! Identity-keyed reconciliation between two snapshots.
//!
//! Sections are matched by [`Section`], rows within a matched section by [`RowId`].
//! Anything that changed relative order is expressed as a delete plus an insert;
//! entries kept in place are the longest run whose order survived. Rows kept in
//! place keep their previous payload even when the new payload differs.
//!
//! Cost is linear in the number of sections and rows apart from the keep set,
//! which is found by patience sorting in O(n log n) per list.
//!
//! Index conventions follow batch-update semantics: delete indices refer to the
//! previous list, insert indices to the final list. [`apply`] performs deletes
//! first, then inserts in ascending order.
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use thiserror::Error;

use crate::section::{Row, RowId, Section};
use crate::snapshot::{SectionSnapshot, Snapshot, SnapshotError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("section {0:?} is not in the snapshot being updated")]
    UnknownSection(Section),
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("expected section {expected:?} at index {index}")]
    SectionMismatch { index: usize, expected: Section },
    #[error("expected row {expected:?} at index {index} of section {section:?}")]
    RowMismatch {
        section: Section,
        index: usize,
        expected: RowId,
    },
    #[error("insert positions do not fit the updated list")]
    BadInsertPosition,
    #[error("resulting section order does not match the diff")]
    OrderMismatch,
    #[error(transparent)]
    Malformed(#[from] SnapshotError),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionInsert {
    pub index: usize,
    pub section: SectionSnapshot,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionDelete {
    pub index: usize,
    pub section: Section,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowInsert {
    pub index: usize,
    pub row: Row,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowDelete {
    pub index: usize,
    pub id: RowId,
}

/// Row operations for a section present, in place, in both snapshots.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowChanges {
    pub section: Section,
    pub deleted: Vec<RowDelete>,
    pub inserted: Vec<RowInsert>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Section order of the next render state.
    pub sections: Vec<Section>,
    pub deleted_sections: Vec<SectionDelete>,
    pub inserted_sections: Vec<SectionInsert>,
    pub row_changes: Vec<RowChanges>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub sections_inserted: usize,
    pub sections_deleted: usize,
    pub rows_inserted: usize,
    pub rows_deleted: usize,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.deleted_sections.is_empty()
            && self.inserted_sections.is_empty()
            && self.row_changes.is_empty()
    }

    /// Row counts cover rows changed inside kept sections only.
    pub fn change_counts(&self) -> ChangeCounts {
        ChangeCounts {
            sections_inserted: self.inserted_sections.len(),
            sections_deleted: self.deleted_sections.len(),
            rows_inserted: self.row_changes.iter().map(|c| c.inserted.len()).sum(),
            rows_deleted: self.row_changes.iter().map(|c| c.deleted.len()).sum(),
        }
    }

    pub fn rows_for(&self, section: Section) -> Option<&RowChanges> {
        self.row_changes.iter().find(|c| c.section == section)
    }
}

/// Compute the operations that turn `previous` into `next`.
pub fn diff(previous: &Snapshot, next: &Snapshot) -> SnapshotDiff {
    let prev_ids = previous.section_identifiers();
    let next_ids = next.section_identifiers();
    let kept = stable_keys(&prev_ids, &next_ids);

    let deleted_sections = prev_ids
        .iter()
        .enumerate()
        .filter(|(_, s)| !kept.contains(*s))
        .map(|(index, s)| SectionDelete { index, section: *s })
        .collect();

    let prev_by_section: HashMap<Section, &SectionSnapshot> =
        previous.sections().iter().map(|s| (s.section, s)).collect();

    let mut inserted_sections = Vec::new();
    let mut row_changes = Vec::new();
    for (index, sec) in next.sections().iter().enumerate() {
        match prev_by_section.get(&sec.section) {
            Some(prev) if kept.contains(&sec.section) => {
                let changes = diff_rows(sec.section, &prev.rows, &sec.rows);
                if !changes.deleted.is_empty() || !changes.inserted.is_empty() {
                    row_changes.push(changes);
                }
            }
            _ => inserted_sections.push(SectionInsert {
                index,
                section: sec.clone(),
            }),
        }
    }

    SnapshotDiff {
        sections: next_ids,
        deleted_sections,
        inserted_sections,
        row_changes,
    }
}

fn diff_rows(section: Section, previous: &[Row], next: &[Row]) -> RowChanges {
    let prev_ids: Vec<RowId> = previous.iter().map(Row::id).collect();
    let next_ids: Vec<RowId> = next.iter().map(Row::id).collect();
    let kept = stable_keys(&prev_ids, &next_ids);

    let deleted = prev_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| !kept.contains(*id))
        .map(|(index, id)| RowDelete { index, id: *id })
        .collect();
    let inserted = next
        .iter()
        .zip(&next_ids)
        .enumerate()
        .filter(|(_, (_, id))| !kept.contains(*id))
        .map(|(index, (row, _))| RowInsert {
            index,
            row: row.clone(),
        })
        .collect();

    RowChanges {
        section,
        deleted,
        inserted,
    }
}

/// Keys present in both lists whose relative order is unchanged, chosen as a
/// longest increasing run of previous positions taken in next order.
fn stable_keys<K: Eq + Hash + Copy>(previous: &[K], next: &[K]) -> HashSet<K> {
    let prev_pos: HashMap<K, usize> = previous.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let common: Vec<(K, usize)> = next
        .iter()
        .filter_map(|k| prev_pos.get(k).map(|&p| (*k, p)))
        .collect();

    // patience sorting over previous positions
    let mut tails: Vec<usize> = Vec::new();
    let mut links: Vec<Option<usize>> = vec![None; common.len()];
    for (ci, &(_, p)) in common.iter().enumerate() {
        let slot = tails.partition_point(|&t| common[t].1 < p);
        if slot > 0 {
            links[ci] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(ci);
        } else {
            tails[slot] = ci;
        }
    }

    let mut kept = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(ci) = cursor {
        kept.insert(common[ci].0);
        cursor = links[ci];
    }
    kept
}

/// Apply `diff` to `previous`, producing the next snapshot.
pub fn apply(previous: &Snapshot, diff: &SnapshotDiff) -> Result<Snapshot, DiffError> {
    let mut sections = previous.sections().to_vec();

    let by_section: HashMap<Section, usize> = sections
        .iter()
        .enumerate()
        .map(|(i, s)| (s.section, i))
        .collect();
    for change in &diff.row_changes {
        let idx = *by_section
            .get(&change.section)
            .ok_or(DiffError::UnknownSection(change.section))?;
        let target = &mut sections[idx];
        for del in &change.deleted {
            match target.rows.get(del.index) {
                Some(row) if row.id() == del.id => {}
                Some(_) => {
                    return Err(DiffError::RowMismatch {
                        section: change.section,
                        index: del.index,
                        expected: del.id,
                    })
                }
                None => {
                    return Err(DiffError::IndexOutOfRange {
                        index: del.index,
                        len: target.rows.len(),
                    })
                }
            }
        }
        let rows = std::mem::take(&mut target.rows);
        let deleted: Vec<usize> = change.deleted.iter().map(|d| d.index).collect();
        let inserted = change
            .inserted
            .iter()
            .map(|i| (i.index, i.row.clone()))
            .collect();
        target.rows = splice(rows, &deleted, inserted)?;
    }

    for del in &diff.deleted_sections {
        match sections.get(del.index) {
            Some(s) if s.section == del.section => {}
            Some(_) => {
                return Err(DiffError::SectionMismatch {
                    index: del.index,
                    expected: del.section,
                })
            }
            None => {
                return Err(DiffError::IndexOutOfRange {
                    index: del.index,
                    len: sections.len(),
                })
            }
        }
    }
    let deleted: Vec<usize> = diff.deleted_sections.iter().map(|d| d.index).collect();
    let inserted = diff
        .inserted_sections
        .iter()
        .map(|i| (i.index, i.section.clone()))
        .collect();
    let sections = splice(sections, &deleted, inserted)?;

    if !sections.iter().map(|s| s.section).eq(diff.sections.iter().copied()) {
        return Err(DiffError::OrderMismatch);
    }
    Ok(Snapshot::try_from_sections(sections)?)
}

/// Remove `deleted` positions of `current`, then place each insert at its final
/// index. Inserts must be sorted by index.
fn splice<T>(current: Vec<T>, deleted: &[usize], inserted: Vec<(usize, T)>) -> Result<Vec<T>, DiffError> {
    let len = current.len();
    let mut dropped = vec![false; len];
    for &index in deleted {
        *dropped
            .get_mut(index)
            .ok_or(DiffError::IndexOutOfRange { index, len })? = true;
    }
    let remaining = dropped.iter().filter(|d| !**d).count();
    let total = remaining + inserted.len();

    let mut kept = current
        .into_iter()
        .zip(dropped)
        .filter(|(_, d)| !d)
        .map(|(t, _)| t);
    let mut inserts = inserted.into_iter().peekable();
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        let at = out.len();
        if let Some((_, t)) = inserts.next_if(|(i, _)| *i == at) {
            out.push(t);
        } else if let Some(t) = kept.next() {
            out.push(t);
        } else {
            break;
        }
    }
    if out.len() != total || inserts.next().is_some() {
        return Err(DiffError::BadInsertPosition);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::model::{Banner, Category, Color, Item, SubCategory};
    use crate::section::SectionDescriptor;

    fn catalog() -> (Vec<Banner>, Vec<Category>, Vec<Item>) {
        let fruit = Category::new(
            "Fruit",
            vec![SubCategory::new(
                "sub1",
                vec![Item::new("apple", Color::Red), Item::new("banana", Color::Yellow)],
            )],
        );
        let sports = Category::new(
            "Sports",
            vec![SubCategory::new("Ball", vec![Item::new("soccer", Color::Gray)])],
        );
        (
            vec![Banner::new("b1", "b1.png", Color::Blue)],
            vec![fruit, sports],
            vec![Item::new("r1", Color::Pink), Item::new("r2", Color::Teal)],
        )
    }

    fn layout(categories: &[Category]) -> Vec<SectionDescriptor> {
        let mut d = vec![SectionDescriptor::Banner];
        d.extend(categories.iter().cloned().map(SectionDescriptor::Category));
        d.push(SectionDescriptor::Recommendations);
        d
    }

    fn roundtrip(prev: &Snapshot, next: &Snapshot) -> SnapshotDiff {
        let d = diff(prev, next);
        assert_eq!(&apply(prev, &d).unwrap(), next);
        d
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let (b, c, r) = catalog();
        let snap = flatten(&layout(&c), &b, &c, &r);
        let d = roundtrip(&snap, &snap);
        assert!(d.is_empty());
        assert_eq!(d.sections, snap.section_identifiers());
    }

    #[test]
    fn removing_one_item_removes_one_row() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);

        let mut edited = c.clone();
        let banana = edited[0].sub_categories[0].items.pop().unwrap();
        let sub_id = edited[0].sub_categories[0].id;
        let next = flatten(&layout(&edited), &b, &edited, &r);

        let d = roundtrip(&prev, &next);
        assert!(d.inserted_sections.is_empty());
        assert!(d.deleted_sections.is_empty());
        assert_eq!(d.row_changes.len(), 1);
        let change = d.rows_for(Section::Category(c[0].id)).unwrap();
        assert!(change.inserted.is_empty());
        assert_eq!(
            change.deleted,
            vec![RowDelete {
                index: 2,
                id: RowId::Leaf { item: banana.id, parent: Some(sub_id) },
            }]
        );
    }

    #[test]
    fn section_appearing_and_disappearing() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);
        let next = flatten(&layout(&c), &[], &c, &r);

        let d = roundtrip(&prev, &next);
        assert_eq!(
            d.deleted_sections,
            vec![SectionDelete { index: 0, section: Section::Banner }]
        );
        assert!(d.row_changes.is_empty());

        let d = roundtrip(&next, &prev);
        assert_eq!(d.inserted_sections.len(), 1);
        assert_eq!(d.inserted_sections[0].index, 0);
        assert_eq!(d.inserted_sections[0].section.rows.len(), 1);
    }

    #[test]
    fn moved_section_is_delete_plus_insert() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);
        let swapped = vec![c[1].clone(), c[0].clone()];
        let next = flatten(&layout(&swapped), &b, &c, &r);

        let d = roundtrip(&prev, &next);
        assert_eq!(d.deleted_sections.len(), 1);
        assert_eq!(d.inserted_sections.len(), 1);
        let moved = d.deleted_sections[0].section;
        assert_eq!(d.inserted_sections[0].section.section, moved);
    }

    #[test]
    fn rotation_keeps_the_longest_ordered_run() {
        let items: Vec<Item> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|t| Item::new(t, Color::Gray))
            .collect();
        let prev = flatten(&[SectionDescriptor::Recommendations], &[], &[], &items);
        let rotated = vec![items[3].clone(), items[0].clone(), items[1].clone(), items[2].clone()];
        let next = flatten(&[SectionDescriptor::Recommendations], &[], &[], &rotated);

        let d = roundtrip(&prev, &next);
        let change = d.rows_for(Section::Recommendations).unwrap();
        assert_eq!(change.deleted.len(), 1);
        assert_eq!(change.inserted.len(), 1);
        assert_eq!(change.inserted[0].index, 0);
    }

    #[test]
    fn same_id_new_title_is_not_an_update() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);
        let mut renamed = r.clone();
        renamed[0].title = "r1 (sale)".into();
        let next = flatten(&layout(&c), &b, &c, &renamed);

        let d = diff(&prev, &next);
        assert!(d.is_empty());
        let applied = apply(&prev, &d).unwrap();
        let idx = applied.index_of_section(Section::Recommendations).unwrap();
        assert_eq!(applied.sections()[idx].rows[0].title(), "r1");
    }

    #[test]
    fn refetch_with_fresh_ids_replaces_everything() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);
        let (b2, c2, r2) = catalog();
        let next = flatten(&layout(&c2), &b2, &c2, &r2);

        let d = roundtrip(&prev, &next);
        let counts = d.change_counts();
        assert_eq!(counts.sections_deleted, 2);
        assert_eq!(counts.sections_inserted, 2);
        // banner and recommendation sections stay; their rows are swapped
        assert_eq!(counts.rows_deleted, 3);
        assert_eq!(counts.rows_inserted, 3);
    }

    #[test]
    fn apply_rejects_foreign_diff() {
        let (b, c, r) = catalog();
        let prev = flatten(&layout(&c), &b, &c, &r);
        let next = flatten(&layout(&c), &[], &c, &r);
        let d = diff(&prev, &next);

        assert_eq!(
            apply(&next, &d).unwrap_err(),
            DiffError::SectionMismatch { index: 0, expected: Section::Banner }
        );
        assert!(apply(&Snapshot::empty(), &d).is_err());
    }

    #[test]
    fn splice_places_inserts_at_final_positions() {
        let out = splice(vec!['a', 'b', 'c', 'd'], &[1, 3], vec![(0, 'x'), (3, 'y')]).unwrap();
        assert_eq!(out, vec!['x', 'a', 'c', 'y']);
        assert_eq!(
            splice(vec!['a'], &[], vec![(5, 'z')]).unwrap_err(),
            DiffError::BadInsertPosition
        );
    }

    #[test]
    fn stable_keys_prefers_longest_run() {
        let kept = stable_keys(&[1, 2, 3, 4, 5], &[5, 1, 2, 3, 4]);
        assert_eq!(kept, HashSet::from([1, 2, 3, 4]));
        let kept = stable_keys(&[1, 2, 3], &[4, 5]);
        assert!(kept.is_empty());
    }
}
