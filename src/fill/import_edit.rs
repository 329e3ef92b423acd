//! Import directive helpers.
//!
//! This module reads the header of a Kotlin file (the `package` line and
//! the `import` directives) into an [`ImportScope`], decides whether a
//! qualified reference can be written by its short name, and builds the
//! text changes that insert any new `import` lines at their sorted
//! position.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::fill::TextChange;
use crate::types::TypeRef;

/// Packages whose declarations are visible without an import.
const DEFAULT_IMPORTS: &[&str] = &[
    "kotlin",
    "kotlin.annotation",
    "kotlin.collections",
    "kotlin.comparisons",
    "kotlin.io",
    "kotlin.ranges",
    "kotlin.sequences",
    "kotlin.text",
];

/// One `import` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// The imported path without the trailing `.*` for star imports.
    pub path: String,
    pub alias: Option<String>,
    pub wildcard: bool,
    /// Byte range of the line, excluding the newline.
    pub line: Range<usize>,
}

impl ImportDirective {
    /// The name this import makes visible, `None` for star imports.
    pub fn visible_name(&self) -> Option<&str> {
        if self.wildcard {
            return None;
        }
        Some(
            self.alias
                .as_deref()
                .unwrap_or_else(|| self.path.rsplit('.').next().unwrap_or(&self.path)),
        )
    }
}

/// The package and imports of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportScope {
    pub package: String,
    pub imports: Vec<ImportDirective>,
    /// Byte offset of the end of the `package` line.
    package_line_end: Option<usize>,
    /// Top-level classes of the file's own package, simple name to
    /// qualified name.  They are visible without an import.
    package_classes: BTreeMap<String, String>,
}

/// How a qualified type should be written in the current file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Already visible by its short name.
    Short,
    /// Visible by its short name once this path is imported.
    Import(String),
    /// The short name is taken by another declaration.
    Qualified,
}

impl ImportScope {
    /// Scan the file header.  Scanning stops at the first line that is
    /// not blank, a comment, a file annotation, `package` or `import`.
    pub fn from_source(content: &str) -> Self {
        let mut scope = ImportScope::default();
        let mut in_block_comment = false;
        let mut offset = 0usize;

        for raw in content.split_inclusive('\n') {
            let line_start = offset;
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);
            let line_end = line_start + line.len();
            let trimmed = line.trim();

            if in_block_comment {
                if trimmed.contains("*/") {
                    in_block_comment = false;
                }
                continue;
            }
            if trimmed.starts_with("/*") {
                in_block_comment = !trimmed.contains("*/");
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("@file:") {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("package ") {
                scope.package = strip_terminator(rest).to_string();
                scope.package_line_end = Some(line_end);
            } else if let Some(rest) = trimmed.strip_prefix("import ") {
                if let Some(directive) = parse_import(strip_terminator(rest), line_start..line_end) {
                    scope.imports.push(directive);
                }
            } else {
                break;
            }
        }
        scope
    }

    /// Record the top-level classes of the file's package, the file's own
    /// included.
    pub fn with_package_classes(mut self, classes: impl IntoIterator<Item = TypeRef>) -> Self {
        for class in classes {
            self.package_classes
                .insert(class.simple_name().to_string(), class.qualified_name());
        }
        self
    }

    /// Decide how `type_ref` is written, given the imports already
    /// scheduled for insertion.
    pub fn reference_for(&self, type_ref: &TypeRef, pending: &[String]) -> Reference {
        let Some(importable) = type_ref.importable_name() else {
            return Reference::Short;
        };
        let top = importable.rsplit('.').next().unwrap_or(&importable);

        if type_ref.package == self.package {
            return Reference::Short;
        }

        for import in &self.imports {
            if import.visible_name() == Some(top) {
                return if import.path == importable && import.alias.is_none() {
                    Reference::Short
                } else {
                    Reference::Qualified
                };
            }
        }

        // A class of this package hides the name; an import would not help.
        if self
            .package_classes
            .get(top)
            .is_some_and(|local| *local != importable)
        {
            return Reference::Qualified;
        }

        if DEFAULT_IMPORTS.contains(&type_ref.package.as_str()) {
            return Reference::Short;
        }

        for path in pending {
            if path.rsplit('.').next() == Some(top) {
                return if *path == importable {
                    Reference::Short
                } else {
                    Reference::Qualified
                };
            }
        }

        if self
            .imports
            .iter()
            .any(|i| i.wildcard && i.path == type_ref.package)
        {
            return Reference::Short;
        }
        Reference::Import(importable)
    }

    /// Text changes inserting `new_imports` among the existing imports,
    /// keeping lexicographic order.
    ///
    /// Without existing imports the block goes after the `package` line,
    /// or at the top of the file.
    pub fn import_changes(&self, new_imports: &[String]) -> Vec<TextChange> {
        let mut sorted: Vec<&String> = new_imports.iter().collect();
        sorted.sort();
        sorted.dedup();
        if sorted.is_empty() {
            return Vec::new();
        }

        if self.imports.is_empty() {
            let lines: Vec<String> = sorted.iter().map(|p| format!("import {}", p)).collect();
            return vec![match self.package_line_end {
                Some(end) => TextChange::insert(end, format!("\n\n{}", lines.join("\n"))),
                None => TextChange::insert(0, format!("{}\n\n", lines.join("\n"))),
            }];
        }

        // Group the new imports by the existing line they go in front of.
        let mut changes: Vec<TextChange> = Vec::new();
        for path in sorted {
            let before = self.imports.iter().find(|i| i.path.as_str() > path.as_str());
            let change = match before {
                Some(import) => TextChange::insert(import.line.start, format!("import {}\n", path)),
                None => {
                    let end = self.imports.iter().map(|i| i.line.end).max().unwrap_or(0);
                    TextChange::insert(end, format!("\nimport {}", path))
                }
            };
            match changes.last_mut() {
                Some(last) if last.range == change.range => last.new_text.push_str(&change.new_text),
                _ => changes.push(change),
            }
        }
        changes
    }
}

fn strip_terminator(text: &str) -> &str {
    text.trim().trim_end_matches(';').trim_end()
}

fn parse_import(text: &str, line: Range<usize>) -> Option<ImportDirective> {
    let (path, alias) = match text.split_once(" as ") {
        Some((path, alias)) => (path.trim(), Some(alias.trim().to_string())),
        None => (text.trim(), None),
    };
    if path.is_empty() {
        return None;
    }
    let (path, wildcard) = match path.strip_suffix(".*") {
        Some(package) => (package, true),
        None => (path, false),
    };
    Some(ImportDirective {
        path: path.replace('`', ""),
        alias,
        wildcard,
        line,
    })
}
