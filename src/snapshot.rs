//! Flattened render state: an ordered list of sections, each with ordered rows.
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::SubCategoryId;
use crate::section::{Row, RowId, Section};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("section {0:?} appears more than once")]
    DuplicateSection(Section),
    #[error("row {row:?} appears more than once in section {section:?}")]
    DuplicateRow { section: Section, row: RowId },
    #[error("row {row:?} in section {section:?} references subcategory {parent} with no header before it")]
    MissingHeader {
        section: Section,
        row: RowId,
        parent: SubCategoryId,
    },
}

/// Position of a row, as the view layer addresses it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionSnapshot {
    pub section: Section,
    pub rows: Vec<Row>,
}

impl SectionSnapshot {
    pub fn new(section: Section, rows: Vec<Row>) -> Self {
        Self { section, rows }
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().map(Row::id)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Snapshot {
    sections: Vec<SectionSnapshot>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from externally assembled sections, rejecting malformed input.
    pub fn try_from_sections(sections: Vec<SectionSnapshot>) -> Result<Self, SnapshotError> {
        validate(&sections)?;
        Ok(Self { sections })
    }

    /// Internal constructor for sections produced by this crate. Malformed input
    /// here is a programming error.
    pub(crate) fn from_sections(sections: Vec<SectionSnapshot>) -> Self {
        if let Err(err) = validate(&sections) {
            panic!("malformed snapshot: {err}");
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[SectionSnapshot] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<SectionSnapshot> {
        self.sections
    }

    pub fn section_identifiers(&self) -> Vec<Section> {
        self.sections.iter().map(|s| s.section).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn number_of_rows(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, |s| s.rows.len())
    }

    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    pub fn section_at(&self, index: usize) -> Option<&SectionSnapshot> {
        self.sections.get(index)
    }

    pub fn index_of_section(&self, section: Section) -> Option<usize> {
        self.sections.iter().position(|s| s.section == section)
    }

    pub fn row_at(&self, path: IndexPath) -> Option<&Row> {
        self.sections.get(path.section)?.rows.get(path.row)
    }

    pub fn index_path_of(&self, id: RowId) -> Option<IndexPath> {
        self.sections.iter().enumerate().find_map(|(s, sec)| {
            sec.rows
                .iter()
                .position(|r| r.id() == id)
                .map(|r| IndexPath::new(s, r))
        })
    }

    /// Number of rows after `path` in flattened order, or `None` when the
    /// section does not exist.
    pub fn rows_after(&self, path: IndexPath) -> Option<usize> {
        let section = self.sections.get(path.section)?;
        let in_section = section.rows.len().saturating_sub(path.row.saturating_add(1));
        let later: usize = self.sections[path.section..]
            .iter()
            .skip(1)
            .map(|s| s.rows.len())
            .sum();
        Some(in_section + later)
    }
}

fn validate(sections: &[SectionSnapshot]) -> Result<(), SnapshotError> {
    let mut seen_sections = HashSet::with_capacity(sections.len());
    for sec in sections {
        if !seen_sections.insert(sec.section) {
            return Err(SnapshotError::DuplicateSection(sec.section));
        }
        let mut seen_rows = HashSet::with_capacity(sec.rows.len());
        for row in &sec.rows {
            let id = row.id();
            if let RowId::Leaf {
                parent: Some(parent),
                ..
            } = id
            {
                if !seen_rows.contains(&RowId::Header(parent)) {
                    return Err(SnapshotError::MissingHeader {
                        section: sec.section,
                        row: id,
                        parent,
                    });
                }
            }
            if !seen_rows.insert(id) {
                return Err(SnapshotError::DuplicateRow {
                    section: sec.section,
                    row: id,
                });
            }
        }
    }
    Ok(())
}
