//! Change-set wire format
//!
//! The generation step returns whole files as delimited blocks:
//!
//! ```text
//! ===FILE: app/impressum/page.tsx===
//! export default function Impressum() {
//!   ...
//! }
//! ===END===
//! ```
//!
//! [`parse_change_set`] decodes a reply into an ordered [`ChangeSet`].
//! Anything outside a block is prose and ignored. There is no escaping;
//! content is taken verbatim between the markers.

/// Start-of-block marker prefix; the path sits between this and the suffix
pub const FILE_MARKER_PREFIX: &str = "===FILE:";
/// Start-of-block marker suffix
pub const MARKER_SUFFIX: &str = "===";
/// End-of-block marker, a full line on its own
pub const END_MARKER: &str = "===END===";

/// One proposed file, full content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the working tree root
    pub path: String,
    /// Complete file text
    pub content: String,
}

/// Ordered collection of file changes proposed in one attempt
///
/// Paths are unique: pushing an existing path replaces its content in place,
/// so the last complete block for a path wins while the original position is
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FileChange>,
}

impl ChangeSet {
    pub fn push(&mut self, path: String, content: String) {
        if let Some(existing) = self.changes.iter_mut().find(|c| c.path == path) {
            existing.content = content;
        } else {
            self.changes.push(FileChange { path, content });
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter()
    }

    /// Paths in change order
    pub fn paths(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.path.clone()).collect()
    }

    /// Re-serialize to the block wire format
    ///
    /// Parsing the result yields this change-set again, provided no content
    /// line is itself a marker line.
    pub fn to_wire(&self) -> String {
        let mut wire = String::new();
        for change in &self.changes {
            wire.push_str(FILE_MARKER_PREFIX);
            wire.push(' ');
            wire.push_str(&change.path);
            wire.push_str(MARKER_SUFFIX);
            wire.push('\n');
            wire.push_str(&change.content);
            wire.push('\n');
            wire.push_str(END_MARKER);
            wire.push_str("\n\n");
        }
        wire
    }
}

/// Decode a generation reply into a [`ChangeSet`]
///
/// Never fails: input with no valid blocks yields an empty set. A start
/// marker while a block is open flushes the accumulated content first
/// (generated output is never silently dropped); a trailing block with no
/// end marker is truncated output and is discarded.
pub fn parse_change_set(output: &str) -> ChangeSet {
    let mut set = ChangeSet::default();
    let mut open: Option<(String, Vec<&str>)> = None;

    for line in output.lines() {
        if let Some(path) = marker_path(line) {
            if let Some((prev_path, lines)) = open.take() {
                set.push(prev_path, lines.join("\n"));
            }
            open = Some((path.to_string(), Vec::new()));
        } else if line == END_MARKER {
            if let Some((path, lines)) = open.take() {
                set.push(path, lines.join("\n"));
            }
        } else if let Some((_, lines)) = open.as_mut() {
            lines.push(line);
        }
    }

    set
}

/// Path embedded in a start-marker line, if the line is one
///
/// The path is whitespace-trimmed; a marker with an empty path does not open
/// a block (the line counts as ordinary content or prose).
fn marker_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(FILE_MARKER_PREFIX)?;
    let path = rest.strip_suffix(MARKER_SUFFIX)?.trim();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
