//! Grouping engine: turn sorted rows into a tree of nested groups.
//!
//! Rows are sorted by the hierarchy's key columns (outermost first), then walked
//! once as (previous, current, next) triples. At every level a group opens when
//! the key differs from the previous row's (or an enclosing level opened) and
//! closes when it differs from the next row's (or an enclosing level closed).
//! Each level is a small state machine; closed groups are moved into their
//! parent, so every group owns its children.

use std::cmp::Ordering;

use thiserror::Error;

use crate::table::Row;

/// Errors produced while grouping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("table has no data rows")]
    EmptyTable,
    #[error("hierarchy has no key columns")]
    NoKeys,
    #[error("line {line}: column {column} missing (row has {width} fields)")]
    MissingColumn {
        line: usize,
        column: usize,
        width: usize,
    },
    #[error("line {line}: group boundary out of order at level {level}")]
    Boundary { line: usize, level: usize },
}

/// Key columns (outermost first) and the leaf column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    keys: Vec<usize>,
    leaf: usize,
}

impl Hierarchy {
    pub fn new(keys: Vec<usize>, leaf: usize) -> Self {
        Self { keys, leaf }
    }

    /// Number of grouping levels (excluding the leaf list).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    #[must_use]
    pub fn leaf(&self) -> usize {
        self.leaf
    }

    fn check(&self, row: &Row) -> Result<(), GroupError> {
        let widest = self.keys.iter().copied().chain([self.leaf]).max().unwrap_or(0);
        if widest >= row.width() {
            return Err(GroupError::MissingColumn {
                line: row.line,
                column: widest,
                width: row.width(),
            });
        }
        Ok(())
    }

    fn key<'a>(&self, row: &'a Row, level: usize) -> &'a str {
        &row.fields[self.keys[level]]
    }

    fn cmp(&self, a: &Row, b: &Row) -> Ordering {
        self.keys
            .iter()
            .map(|&k| a.fields[k].cmp(&b.fields[k]))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Sort rows by all key columns, outermost first. The sort is stable: rows
/// with equal keys keep their file order, which fixes the order of leaf values
/// inside a group.
pub fn sort_rows<'a>(rows: &'a [Row], hierarchy: &Hierarchy) -> Result<Vec<&'a Row>, GroupError> {
    for row in rows {
        hierarchy.check(row)?;
    }
    let mut sorted: Vec<&Row> = rows.iter().collect();
    sorted.sort_by(|a, b| hierarchy.cmp(a, b));
    Ok(sorted)
}

/// Per-level open/close flags for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edges {
    pub start: Vec<bool>,
    pub end: Vec<bool>,
}

impl Edges {
    /// Boundary flags for `cur` given its neighbours. `None` is the sentinel
    /// before the first or after the last row and never equals a real key.
    /// A change at one level implies a change at every inner level.
    pub fn between(prev: Option<&Row>, cur: &Row, next: Option<&Row>, hierarchy: &Hierarchy) -> Self {
        let depth = hierarchy.depth();
        let mut start = Vec::with_capacity(depth);
        let mut end = Vec::with_capacity(depth);
        let (mut opened, mut closed) = (false, false);
        for level in 0..depth {
            let key = hierarchy.key(cur, level);
            opened = opened || prev.map_or(true, |p| hierarchy.key(p, level) != key);
            closed = closed || next.map_or(true, |n| hierarchy.key(n, level) != key);
            start.push(opened);
            end.push(closed);
        }
        Edges { start, end }
    }
}

/// Members of a group: child groups, or leaf values at the innermost level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Members<'a> {
    Groups(Vec<Group<'a>>),
    Leaves(Vec<&'a str>),
}

/// A maximal run of rows sharing one key at a level (and all enclosing levels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    /// Key value at this group's level.
    pub key: &'a str,
    /// Last row of the run; per-group columns are read from it.
    pub row: &'a Row,
    pub members: Members<'a>,
}

impl<'a> Group<'a> {
    /// Number of immediate members.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.members {
            Members::Groups(g) => g.len(),
            Members::Leaves(l) => l.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child groups (empty at the innermost level).
    #[must_use]
    pub fn children(&self) -> &[Group<'a>] {
        match &self.members {
            Members::Groups(g) => g,
            Members::Leaves(_) => &[],
        }
    }

    /// Leaf values (empty above the innermost level).
    #[must_use]
    pub fn leaves(&self) -> &[&'a str] {
        match &self.members {
            Members::Groups(_) => &[],
            Members::Leaves(l) => l,
        }
    }

    /// Total leaf values under this group.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match &self.members {
            Members::Groups(g) => g.iter().map(Group::leaf_count).sum(),
            Members::Leaves(l) => l.len(),
        }
    }
}

/// State of one hierarchy level during the scan.
#[derive(Debug)]
enum LevelState<'a> {
    Idle,
    Collecting {
        key: &'a str,
        members: Members<'a>,
    },
}

impl<'a> LevelState<'a> {
    fn open(&mut self, key: &'a str, innermost: bool, line: usize, level: usize) -> Result<(), GroupError> {
        if let LevelState::Collecting { .. } = self {
            return Err(GroupError::Boundary { line, level });
        }
        let members = if innermost {
            Members::Leaves(Vec::new())
        } else {
            Members::Groups(Vec::new())
        };
        *self = LevelState::Collecting { key, members };
        Ok(())
    }

    fn push_leaf(&mut self, value: &'a str, line: usize, level: usize) -> Result<(), GroupError> {
        match self {
            LevelState::Collecting {
                members: Members::Leaves(leaves),
                ..
            } => {
                leaves.push(value);
                Ok(())
            }
            _ => Err(GroupError::Boundary { line, level }),
        }
    }

    fn push_child(&mut self, child: Group<'a>, level: usize) -> Result<(), GroupError> {
        match self {
            LevelState::Collecting {
                members: Members::Groups(groups),
                ..
            } => {
                groups.push(child);
                Ok(())
            }
            _ => Err(GroupError::Boundary {
                line: child.row.line,
                level,
            }),
        }
    }

    fn close(&mut self, row: &'a Row, level: usize) -> Result<Group<'a>, GroupError> {
        match std::mem::replace(self, LevelState::Idle) {
            LevelState::Collecting { key, members } => Ok(Group { key, row, members }),
            LevelState::Idle => Err(GroupError::Boundary {
                line: row.line,
                level,
            }),
        }
    }
}

/// Group rows into the outermost groups of `hierarchy`, sorting them first.
pub fn group_rows<'a>(rows: &'a [Row], hierarchy: &Hierarchy) -> Result<Vec<Group<'a>>, GroupError> {
    if rows.is_empty() {
        return Err(GroupError::EmptyTable);
    }
    let depth = hierarchy.depth();
    if depth == 0 {
        return Err(GroupError::NoKeys);
    }
    let sorted = sort_rows(rows, hierarchy)?;
    let innermost = depth - 1;

    let mut levels: Vec<LevelState<'a>> = (0..depth).map(|_| LevelState::Idle).collect();
    let mut top = Vec::new();

    for (i, &cur) in sorted.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| sorted[p]);
        let next = sorted.get(i + 1).copied();
        let edges = Edges::between(prev, cur, next, hierarchy);

        for level in 0..depth {
            if edges.start[level] {
                levels[level].open(hierarchy.key(cur, level), level == innermost, cur.line, level)?;
            }
        }

        let leaf = cur.fields[hierarchy.leaf()].as_str();
        levels[innermost].push_leaf(leaf, cur.line, innermost)?;

        for level in (0..depth).rev() {
            if !edges.end[level] {
                continue;
            }
            let group = levels[level].close(cur, level)?;
            tracing::trace!(
                "closed level {} group {:?} with {} members (line {})",
                level,
                group.key,
                group.len(),
                cur.line
            );
            if level == 0 {
                top.push(group);
            } else {
                levels[level - 1].push_child(group, level - 1)?;
            }
        }
    }

    tracing::debug!("grouped {} rows into {} top-level groups", rows.len(), top.len());
    Ok(top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, fields: &[&str]) -> Row {
        Row::new(line, fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn edges_propagate_inward() {
        let h = Hierarchy::new(vec![0, 1], 2);
        let a = row(1, &["A", "x", "1"]);
        let b = row(2, &["B", "x", "2"]);
        let c = row(3, &["B", "x", "3"]);

        let e = Edges::between(Some(&a), &b, Some(&c), &h);
        assert_eq!(e.start, vec![true, true]);
        assert_eq!(e.end, vec![false, false]);

        let e = Edges::between(Some(&b), &c, None, &h);
        assert_eq!(e.start, vec![false, false]);
        assert_eq!(e.end, vec![true, true]);
    }

    #[test]
    fn edges_inner_change_only() {
        let h = Hierarchy::new(vec![0, 1], 2);
        let a = row(1, &["A", "x", "1"]);
        let b = row(2, &["A", "y", "2"]);
        let e = Edges::between(Some(&a), &b, None, &h);
        assert_eq!(e.start, vec![false, true]);
        assert_eq!(e.end, vec![true, true]);
    }

    #[test]
    fn sentinels_open_and_close_single_row() {
        let h = Hierarchy::new(vec![0, 1, 2], 3);
        let only = row(1, &["A", "B", "C", "D"]);
        let e = Edges::between(None, &only, None, &h);
        assert_eq!(e.start, vec![true; 3]);
        assert_eq!(e.end, vec![true; 3]);
    }

    #[test]
    fn close_without_open_is_boundary_error() {
        let r = row(4, &["A"]);
        let mut state = LevelState::Idle;
        assert_eq!(
            state.close(&r, 1).unwrap_err(),
            GroupError::Boundary { line: 4, level: 1 }
        );
    }

    #[test]
    fn double_open_is_boundary_error() {
        let mut state = LevelState::Idle;
        state.open("A", true, 1, 0).unwrap();
        assert_eq!(
            state.open("B", true, 2, 0).unwrap_err(),
            GroupError::Boundary { line: 2, level: 0 }
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let h = Hierarchy::new(vec![0], 1);
        let rows = vec![row(1, &["B", "1"]), row(2, &["A", "2"]), row(3, &["B", "3"]), row(4, &["A", "4"])];
        let sorted = sort_rows(&rows, &h).unwrap();
        let lines: Vec<usize> = sorted.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4, 1, 3]);
    }
}
