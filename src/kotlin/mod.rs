//! Kotlin source model.
//!
//! An index over the `.kt` (and `.java`) files of a workspace, read from
//! their tree-sitter syntax trees.  It provides the two collaborators the fill engine needs: candidate
//! resolution for a callee ([`CallAnalysis`]) and constructor lookup for
//! nested values ([`TypeLookup`]).  Both are served by a [`ScopedIndex`],
//! a view of the [`DeclarationIndex`] from one file's imports.
//!
//! - [`syntax`]: parser setup and node helpers
//! - [`declarations`]: Kotlin class/constructor/function extraction
//! - [`java`]: foreign declarations from Java sources
//! - [`type_text`]: type nodes and their classification
//! - [`call_site`]: the call under the cursor

pub mod call_site;
pub mod declarations;
pub mod java;
pub mod syntax;
pub mod type_text;

use std::collections::BTreeMap;
use std::path::Path;

use ignore::WalkBuilder;
use tower_lsp::lsp_types::Url;

use crate::fill::import_edit::ImportScope;
use crate::fill::{CallAnalysis, TypeLookup};
use crate::kotlin::declarations::{ClassDecl, ClassKind, FileDeclarations, FunctionDecl, ParamDecl};
use crate::kotlin::type_text::{ResolvedType, TypeResolver};
use crate::types::{CallCandidate, Callee, Modality, ParameterDescriptor, TypeClass, TypeRef};

/// Source file extensions the index reads.
const INDEXED_EXTENSIONS: &[&str] = &["kt", "kts", "java"];

/// Declarations of every known file, keyed by URI.
///
/// Iteration order is the URI order, so candidate lists are deterministic.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    files: BTreeMap<String, FileDeclarations>,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re-)index one file.  `.java` files are foreign, anything else is
    /// read as Kotlin.
    pub fn update(&mut self, uri: &str, content: &str) {
        let decls = if uri.ends_with(".java") {
            java::scan(content)
        } else {
            declarations::scan(content)
        };
        tracing::trace!(
            "indexed {}: {} classes, {} functions",
            uri,
            decls.classes.len(),
            decls.functions.len()
        );
        self.files.insert(uri.to_string(), decls);
    }

    pub fn remove(&mut self, uri: &str) {
        self.files.remove(uri);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// View the index from a file with the given header.
    pub fn scoped(&self, scope: ImportScope) -> ScopedIndex<'_> {
        ScopedIndex { index: self, scope }
    }

    fn classes(&self) -> impl Iterator<Item = (&FileDeclarations, &ClassDecl)> {
        self.files
            .values()
            .flat_map(|file| file.classes.iter().map(move |class| (file, class)))
    }

    fn class_by_qualified_name(&self, qualified: &str) -> Option<(&FileDeclarations, &ClassDecl)> {
        self.classes()
            .find(|(file, class)| qualified_name(file, class) == qualified)
    }

    /// Resolve a type name as written in `file`: explicit imports, then the
    /// file's own package, then star imports, then (with `fallback`) any
    /// package.
    fn resolve_in(
        &self,
        file_scope: &ImportScope,
        path: &str,
        fallback: bool,
    ) -> Option<(&FileDeclarations, &ClassDecl)> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        for import in &file_scope.imports {
            if import.visible_name() == Some(head) {
                let target = match rest {
                    Some(rest) => format!("{}.{}", import.path, rest),
                    None => import.path.clone(),
                };
                if let Some(found) = self.class_by_qualified_name(&target) {
                    return Some(found);
                }
            }
        }

        if rest.is_some()
            && let Some(found) = self.class_by_qualified_name(path)
        {
            return Some(found);
        }

        let in_package = |package: &str| {
            self.classes().find(|(file, class)| {
                file.scope.package == package && (class.name == path || class.simple_name() == path)
            })
        };
        if let Some(found) = in_package(&file_scope.package) {
            return Some(found);
        }
        for import in file_scope.imports.iter().filter(|i| i.wildcard) {
            if let Some(found) = in_package(&import.path) {
                return Some(found);
            }
        }

        if !fallback {
            return None;
        }
        self.classes()
            .find(|(_, class)| class.name == path || class.simple_name() == path)
    }

    fn resolved_type(
        &self,
        file_scope: &ImportScope,
        path: &str,
        fallback: bool,
    ) -> Option<ResolvedType> {
        let (file, class) = self.resolve_in(file_scope, path, fallback)?;
        let type_ref = TypeRef::new(file.scope.package.as_str(), class.name.as_str());
        Some(match class.kind {
            ClassKind::Interface => ResolvedType::Interface(type_ref),
            ClassKind::Object => ResolvedType::Object(type_ref),
            ClassKind::Enum => ResolvedType::Enum {
                type_ref,
                first_entry: class.enum_entries.first().cloned(),
            },
            ClassKind::Class => ResolvedType::Class {
                type_ref,
                modality: class.modality,
            },
        })
    }

    /// Describe a declared parameter, classifying its type from the
    /// declaring file's point of view.
    fn descriptor(&self, file: &FileDeclarations, param: &ParamDecl) -> ParameterDescriptor {
        let resolver = FileResolver {
            index: self,
            scope: &file.scope,
        };
        let (type_class, modality) = match &param.type_syntax {
            Some(syntax) => {
                let classified = type_text::classify(syntax, &resolver);
                (classified.type_class, classified.modality)
            }
            None => (TypeClass::Other, Modality::Concrete),
        };
        let mut descriptor =
            ParameterDescriptor::new(param.name.as_str(), param.type_text.as_str(), type_class);
        descriptor.is_vararg = param.is_vararg;
        descriptor.has_default_value = param.has_default;
        descriptor.modality = modality;
        descriptor
    }

    fn constructor_candidates(&self, file: &FileDeclarations, class: &ClassDecl) -> Vec<CallCandidate> {
        class
            .constructors
            .iter()
            .map(|ctor| CallCandidate {
                name: class.simple_name().to_string(),
                parameters: ctor.parameters.iter().map(|p| self.descriptor(file, p)).collect(),
                is_constructor: true,
                is_primary: ctor.is_primary,
                origin: file.origin,
            })
            .collect()
    }

    fn function_candidates(
        &self,
        accept: impl Fn(&FileDeclarations, &FunctionDecl) -> bool,
    ) -> Vec<CallCandidate> {
        let accept = &accept;
        self.files
            .values()
            .flat_map(|file| {
                file.functions
                    .iter()
                    .filter(move |f| accept(file, *f))
                    .map(move |f| CallCandidate {
                        name: f.name.clone(),
                        parameters: f.parameters.iter().map(|p| self.descriptor(file, p)).collect(),
                        is_constructor: false,
                        is_primary: false,
                        origin: file.origin,
                    })
            })
            .collect()
    }
}

/// Type names as seen from one declaring file.
struct FileResolver<'a> {
    index: &'a DeclarationIndex,
    scope: &'a ImportScope,
}

impl TypeResolver for FileResolver<'_> {
    fn resolve(&self, path: &str) -> Option<ResolvedType> {
        self.index.resolved_type(self.scope, path, true)
    }

    fn visible(&self, name: &str) -> Option<ResolvedType> {
        self.index.resolved_type(self.scope, name, false)
    }
}

/// The class a call receiver most likely names: `Foo()` and `a.Foo` give
/// `Foo`.
fn receiver_class(qualifier: &str) -> &str {
    let head = qualifier.trim_end_matches(['!', '?']);
    let head = head.strip_suffix("()").unwrap_or(head);
    head.rsplit('.').next().unwrap_or(head)
}

fn qualified_name(file: &FileDeclarations, class: &ClassDecl) -> String {
    if file.scope.package.is_empty() {
        class.name.clone()
    } else {
        format!("{}.{}", file.scope.package, class.name)
    }
}

/// The index as seen from one file.
pub struct ScopedIndex<'a> {
    index: &'a DeclarationIndex,
    scope: ImportScope,
}

impl ScopedIndex<'_> {
    /// Whether a class is visible from the current file without
    /// qualification.
    fn is_visible(&self, file: &FileDeclarations, class: &ClassDecl) -> bool {
        let package = &file.scope.package;
        *package == self.scope.package
            || self.scope.imports.iter().any(|i| {
                (i.wildcard && i.path == *package) || (!i.wildcard && i.path == qualified_name(file, class))
            })
    }
}

impl CallAnalysis for ScopedIndex<'_> {
    fn resolve_candidates(&self, callee: &Callee) -> Vec<CallCandidate> {
        let index = self.index;

        let classes: Vec<(&FileDeclarations, &ClassDecl)> = match &callee.qualifier {
            // `com.example.User(` or `Outer.Inner(`
            Some(qualifier) => {
                let path = format!("{}.{}", qualifier, callee.name);
                index
                    .class_by_qualified_name(&path)
                    .or_else(|| {
                        index
                            .resolve_in(&self.scope, &path, true)
                            .filter(|(_, c)| c.name == path)
                    })
                    .into_iter()
                    .collect()
            }
            None => {
                let all: Vec<_> = index
                    .classes()
                    .filter(|(_, class)| class.simple_name() == callee.name)
                    .collect();
                let visible: Vec<_> = all
                    .iter()
                    .copied()
                    .filter(|(file, class)| self.is_visible(file, class))
                    .collect();
                if visible.is_empty() { all } else { visible }
            }
        };

        if !classes.is_empty() {
            return classes
                .into_iter()
                .flat_map(|(file, class)| index.constructor_candidates(file, class))
                .collect();
        }
        let name = callee.name.as_str();
        let Some(qualifier) = callee.qualifier.as_deref() else {
            return index.function_candidates(|_, f| f.name == name);
        };
        // `receiver.name(`: members of the receiver's class when it names
        // one, top-level functions when the qualifier is a package, else
        // any member or extension.
        let owner = receiver_class(qualifier);
        let members = index.function_candidates(|_, f| {
            f.name == name
                && f.owner
                    .as_deref()
                    .is_some_and(|o| o.rsplit('.').next() == Some(owner))
        });
        if !members.is_empty() {
            return members;
        }
        if index.files.values().any(|f| f.scope.package == qualifier) {
            return index.function_candidates(|file, f| {
                f.name == name && f.owner.is_none() && file.scope.package == qualifier
            });
        }
        index.function_candidates(|_, f| {
            f.name == name && (f.owner.is_some() || f.receiver.is_some())
        })
    }
}

impl TypeLookup for ScopedIndex<'_> {
    fn constructors(&self, type_ref: &TypeRef) -> Vec<CallCandidate> {
        self.index
            .classes()
            .find(|(file, class)| file.scope.package == type_ref.package && class.name == type_ref.name)
            .map(|(file, class)| self.index.constructor_candidates(file, class))
            .unwrap_or_default()
    }

    fn package_classes(&self, package: &str) -> Vec<TypeRef> {
        self.index
            .classes()
            .filter(|(file, class)| file.scope.package == package && !class.name.contains('.'))
            .map(|(file, class)| TypeRef::new(file.scope.package.as_str(), class.name.as_str()))
            .collect()
    }
}

/// Index every Kotlin and Java file under `root`, honouring `.gitignore`.
/// Returns the number of files indexed.
pub fn index_workspace(index: &mut DeclarationIndex, root: &Path) -> usize {
    let mut count = 0;
    for entry in WalkBuilder::new(root).hidden(true).build().flatten() {
        let path = entry.path();
        let indexed = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| INDEXED_EXTENSIONS.contains(&e));
        if !indexed || !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::warn!("cannot read {}", path.display());
            continue;
        };
        let Ok(uri) = Url::from_file_path(path) else {
            continue;
        };
        index.update(uri.as_str(), &content);
        count += 1;
    }
    tracing::info!("indexed {} source files under {}", count, root.display());
    count
}
