//! capsgen: generator for static capability tables (decode, encode, VPP).
//!
//! This crate provides:
//! - **Layouts** (`format`): per-mode CSV column layout, key hierarchy and C type/array names.
//! - **Table loader** (`table`): `Table::open(path)` reads a CSV with a header row.
//! - **Grouping** (`grouping`): `group_rows` sorts rows and builds the nested group tree.
//! - **Emitter** (`emitter`): `render` turns the tree into C array literals; `Output` writes it atomically.
//! - **Generator** (`generator`): `generate` / `generate_file` run the whole pipeline.
//! - **Config** (`config`): `GenOptions`, optionally loaded from TOML.
//!
//! The `gencaps` binary wraps `generate_file` for command-line use.

pub mod config;
pub mod emitter;
pub mod format;
pub mod generator;
pub mod grouping;
pub mod table;

pub use config::{ConfigError, GenOptions};
pub use emitter::{render, Descriptor, EmitError, Output};
pub use format::{Field, Layout, Level, Mode, UsageError, STRUCT_VERSION_MAJOR, STRUCT_VERSION_MINOR};
pub use generator::{generate, generate_file, GenerateError, Generated, Summary};
pub use grouping::{group_rows, sort_rows, Edges, Group, GroupError, Hierarchy, Members};
pub use table::{Row, Table, TableError};
