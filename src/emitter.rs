//! Table emitter: render grouped capabilities as C array literals.
//!
//! Arrays are emitted in post-order (leaf arrays, then each enclosing level),
//! so every `(Type *)name` reference points at an array defined above it. The
//! whole file is rendered into memory before anything is written.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

use crate::config::GenOptions;
use crate::format::{Field, Layout};
use crate::grouping::{Group, Members};

/// Errors produced by the emitter.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create a temporary file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}, column {column}: expected an integer, found {value:?}")]
    InvalidInteger {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("line {line}: column {column} missing")]
    MissingColumn { line: usize, column: usize },
}

/// Root of the emitted tables: version pair plus the outermost groups.
#[derive(Debug, Clone)]
pub struct Descriptor<'a> {
    pub version_major: u16,
    pub version_minor: u16,
    pub groups: Vec<Group<'a>>,
}

impl<'a> Descriptor<'a> {
    pub fn new(groups: Vec<Group<'a>>, options: &GenOptions) -> Self {
        Self {
            version_major: options.version_major,
            version_minor: options.version_minor,
            groups,
        }
    }

    /// Number of arrays `render` emits: one per group plus the top-level array.
    #[must_use]
    pub fn array_count(&self) -> usize {
        fn count(g: &Group<'_>) -> usize {
            1 + g.children().iter().map(count).sum::<usize>()
        }
        1 + self.groups.iter().map(count).sum::<usize>()
    }
}

/// Render the full output file for `layout`.
pub fn render(layout: &Layout, descriptor: &Descriptor<'_>, options: &GenOptions) -> Result<String, EmitError> {
    let mut e = Emitter {
        layout,
        out: String::new(),
    };

    if let Some(banner) = &options.banner {
        e.out.push_str(banner.trim_end());
        e.out.push_str("\n\n");
    }
    e.out.push_str("//NOLINT(build/header_guard)\n\n");
    e.out.push_str(&format!("#include \"{}\"\n\n", options.include));

    let mut path = Vec::new();
    for (i, group) in descriptor.groups.iter().enumerate() {
        path.push(i);
        e.group(group, 0, &mut path)?;
        path.pop();
    }

    let top = &layout.levels[0];
    e.out.push_str(&format!("const {} {}[] = {{\n", top.entry_type, top.array));
    for (i, group) in descriptor.groups.iter().enumerate() {
        e.entry(group, 0, &[i])?;
    }
    e.out.push_str("};\n\n");

    e.out.push_str(&format!(
        "const {} {} = {{\n",
        layout.descriptor_type, layout.descriptor
    ));
    e.out.push_str(&format!(
        "    {{ {}, {} }},\n",
        descriptor.version_minor, descriptor.version_major
    ));
    e.out.push_str("    {},\n");
    e.out.push_str(&format!("    {},\n", descriptor.groups.len()));
    e.out.push_str(&format!("    ({} *){},\n", top.entry_type, top.array));
    e.out.push_str("};\n");

    Ok(e.out)
}

struct Emitter<'l> {
    layout: &'l Layout,
    out: String,
}

impl Emitter<'_> {
    /// `_c00_p01` style suffix naming the group at `path`.
    fn suffix(&self, path: &[usize]) -> String {
        path.iter()
            .zip(self.layout.levels)
            .map(|(idx, level)| format!("_{}{:02}", level.tag, idx))
            .collect()
    }

    /// Emit the arrays below `group` (at `depth`, located at `path`), then its own member array.
    fn group(&mut self, group: &Group<'_>, depth: usize, path: &mut Vec<usize>) -> Result<(), EmitError> {
        for (j, child) in group.children().iter().enumerate() {
            path.push(j);
            self.group(child, depth + 1, path)?;
            path.pop();
        }

        let name = format!("{}{}", self.layout.member_array(depth), self.suffix(path));
        let ty = self.layout.member_type(depth);
        self.out.push_str(&format!("const {} {}[] = {{\n", ty, name));
        match &group.members {
            Members::Leaves(leaves) => {
                for leaf in leaves {
                    self.out.push_str(&format!("    {},\n", leaf));
                }
            }
            Members::Groups(children) => {
                for (j, child) in children.iter().enumerate() {
                    path.push(j);
                    self.entry(child, depth + 1, path)?;
                    path.pop();
                }
            }
        }
        self.out.push_str("};\n\n");
        Ok(())
    }

    /// Emit one struct entry describing `group` inside its parent's array.
    fn entry(&mut self, group: &Group<'_>, depth: usize, path: &[usize]) -> Result<(), EmitError> {
        let level = &self.layout.levels[depth];
        self.out.push_str("    {\n");
        for field in level.fields {
            let value = match *field {
                Field::Column(c) => column(group, c)?.to_string(),
                Field::Range(c) => format!(
                    "{{ {}, {}, {} }}",
                    integer(group, c)?,
                    integer(group, c + 1)?,
                    integer(group, c + 2)?
                ),
                Field::Reserved => "{}".to_string(),
                Field::Count => group.len().to_string(),
                Field::Children => format!(
                    "({} *){}{}",
                    self.layout.member_type(depth),
                    self.layout.member_array(depth),
                    self.suffix(path)
                ),
            };
            self.out.push_str(&format!("        {},\n", value));
        }
        self.out.push_str("    },\n");
        Ok(())
    }
}

fn column<'a>(group: &Group<'a>, c: usize) -> Result<&'a str, EmitError> {
    group.row.get(c).ok_or_else(|| EmitError::MissingColumn {
        line: group.row.line,
        column: c,
    })
}

fn integer(group: &Group<'_>, c: usize) -> Result<i64, EmitError> {
    let raw = column(group, c)?;
    raw.trim().parse().map_err(|_| EmitError::InvalidInteger {
        line: group.row.line,
        column: c,
        value: raw.to_string(),
    })
}

/// Where rendered text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// Write `text` in one piece. Files are replaced atomically: the text goes to
    /// a temporary file next to the target, which is then renamed over it. A
    /// replaced file keeps its permissions; a new one gets `0o666` minus the umask.
    pub fn write(&self, text: &str) -> Result<(), EmitError> {
        match self {
            Output::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(text.as_bytes())?;
                lock.flush()?;
            }
            Output::File(path) => {
                let dir = match path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p,
                    _ => Path::new("."),
                };
                let mut tmp = temp_file_in(dir).map_err(|source| EmitError::Create {
                    dir: dir.to_path_buf(),
                    source,
                })?;
                match fs::metadata(path) {
                    Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                tmp.write_all(text.as_bytes())?;
                tmp.as_file().sync_all()?;
                tmp.persist(path).map_err(|e| EmitError::Persist {
                    path: path.clone(),
                    source: e.error,
                })?;
                tracing::debug!("wrote {} ({} bytes)", path.display(), text.len());
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    // The umask applies to the requested mode, as it would for a plain create.
    Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().tempfile_in(dir)
}
