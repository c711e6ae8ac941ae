//! Truncation detection for generated files
//!
//! A generation step that runs out of output budget usually stops mid-token,
//! leaving the file ending on an identifier or an open construct. Complete
//! source files in brace/tag languages end on a closing token instead. This
//! is a cheap syntactic smoke test, not a parser; false results are expected
//! and handled by the retry loop.

use std::path::Path;

use crate::changeset::ChangeSet;

/// Extensions the heuristic applies to; everything else always passes
const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "rs", "go", "java", "c", "h", "cpp", "hpp", "css",
    "scss",
];

/// Characters a complete source file may end on
const COMPLETE_TERMINATORS: &[char] = &['}', '>', '"', '\''];

/// Whether the heuristic applies to this path
pub fn is_source_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether content plausibly ends on a complete construct
///
/// Trailing whitespace is ignored. Empty content never passes.
pub fn looks_complete(content: &str) -> bool {
    match content.trim_end().chars().last() {
        Some(last) => COMPLETE_TERMINATORS.contains(&last),
        None => false,
    }
}

/// Paths in the change-set whose content looks cut off
///
/// Any single entry here fails the whole change-set; application is
/// all-or-nothing.
pub fn truncated_paths(set: &ChangeSet) -> Vec<String> {
    set.iter()
        .filter(|change| is_source_path(&change.path) && !looks_complete(&change.content))
        .map(|change| change.path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_tokens_pass() {
        assert!(looks_complete("export default function Page() {\n  return null;\n}"));
        assert!(looks_complete("<main>\n  <p>hi</p>\n</main>"));
        assert!(looks_complete("const s = \"done\""));
        assert!(looks_complete("const c = 'x'"));
    }

    #[test]
    fn trailing_whitespace_is_ignored() {
        assert!(looks_complete("body {}\n\n   "));
    }

    #[test]
    fn identifier_endings_fail() {
        assert!(!looks_complete("export default function Impressum"));
        assert!(!looks_complete("const x = someCall(arg"));
    }

    #[test]
    fn empty_content_fails() {
        assert!(!looks_complete(""));
        assert!(!looks_complete("   \n  "));
    }

    #[test]
    fn only_source_extensions_are_checked() {
        assert!(is_source_path("app/page.tsx"));
        assert!(is_source_path("styles/MAIN.CSS"));
        assert!(!is_source_path("README.md"));
        assert!(!is_source_path("Makefile"));
        assert!(!is_source_path("data/fixtures.json"));
    }

    #[test]
    fn non_source_files_always_pass_the_set_check() {
        let mut set = ChangeSet::default();
        set.push("notes.md".to_string(), "ends on a word".to_string());
        set.push("app/page.tsx".to_string(), "</main>".to_string());
        assert!(truncated_paths(&set).is_empty());
    }

    #[test]
    fn truncated_source_files_are_reported_by_path() {
        let mut set = ChangeSet::default();
        set.push("app/a.tsx".to_string(), "complete {}".to_string());
        set.push("app/b.tsx".to_string(), "function cut(".to_string());
        set.push("app/c.ts".to_string(), "const alsoCut = someIdent".to_string());

        assert_eq!(truncated_paths(&set), vec!["app/b.tsx", "app/c.ts"]);
    }
}
