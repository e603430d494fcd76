//! Generator: load → group → render → write, for one mode.
//!
//! Nothing is written until the whole table has been rendered, so a failed run
//! leaves the previous output in place.

use std::fmt::Write as _;
use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::GenOptions;
use crate::emitter::{render, Descriptor, EmitError, Output};
use crate::format::Mode;
use crate::grouping::{group_rows, Group, GroupError};
use crate::table::{Table, TableError};

/// Errors produced by a generator run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("{mode} table must have {expected} columns, found {found}")]
    Schema {
        mode: Mode,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Counts and digests describing one run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    pub mode: Mode,
    /// Data rows read (equals the number of emitted leaf values).
    pub rows: usize,
    /// Groups per level, outermost first.
    pub groups: Vec<usize>,
    /// Arrays emitted, excluding the root descriptor.
    pub arrays: usize,
    pub input_sha256: String,
    pub output_sha256: String,
}

impl Summary {
    /// Number of outermost groups (codecs or filters).
    #[must_use]
    pub fn top_level(&self) -> usize {
        self.groups.first().copied().unwrap_or(0)
    }

    /// One-line report, e.g. "Success. Decode - number of codecs = 3".
    #[must_use]
    pub fn report(&self) -> String {
        let layout = self.mode.layout();
        format!(
            "Success. {} - number of {} = {}",
            layout.title,
            layout.noun,
            self.top_level()
        )
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Rendered output plus its summary.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub summary: Summary,
}

/// Render the capability table for `mode` from an already loaded table.
pub fn generate(mode: Mode, table: &Table, options: &GenOptions) -> Result<Generated, GenerateError> {
    let layout = mode.layout();
    if table.is_empty() {
        return Err(GroupError::EmptyTable.into());
    }
    if table.columns() != layout.columns {
        return Err(GenerateError::Schema {
            mode,
            expected: layout.columns,
            found: table.columns(),
        });
    }

    let groups = group_rows(table.rows(), &layout.hierarchy())?;
    let descriptor = Descriptor::new(groups, options);
    let text = render(layout, &descriptor, options)?;

    let summary = Summary {
        mode,
        rows: table.len(),
        groups: level_counts(&descriptor.groups, layout.levels.len()),
        arrays: descriptor.array_count(),
        input_sha256: hex(table.digest()),
        output_sha256: hex(&Sha256::digest(text.as_bytes())),
    };
    tracing::debug!(
        "{}: {} rows, groups per level {:?}, {} arrays",
        mode,
        summary.rows,
        summary.groups,
        summary.arrays
    );
    Ok(Generated { text, summary })
}

/// Load `input`, render it for `mode` and write the result to `output`.
pub fn generate_file<P: AsRef<Path>>(
    mode: Mode,
    input: P,
    output: &Output,
    options: &GenOptions,
) -> Result<Summary, GenerateError> {
    let table = Table::open(input)?;
    let generated = generate(mode, &table, options)?;
    output.write(&generated.text)?;
    tracing::info!("{}", generated.summary.report());
    Ok(generated.summary)
}

fn level_counts(groups: &[Group<'_>], depth: usize) -> Vec<usize> {
    let mut counts = vec![0; depth];
    let mut frontier: Vec<&Group<'_>> = groups.iter().collect();
    for count in counts.iter_mut() {
        *count = frontier.len();
        frontier = frontier.into_iter().flat_map(|g| g.children()).collect();
    }
    counts
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}
