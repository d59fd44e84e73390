//! # Node paths
//!
//! Position-based handles to nodes within a tree, as a chain of (folder kind, index) steps leading
//! down from the root. Paths hold no borrow of the tree, so they survive edits, but like any index
//! they are invalidated by insertions and removals ahead of them.
//!
//! The textual form is `/Kind/index/Kind/index...`, with kinds spelled by their registered name. The
//! root is `/`.

use smallvec::SmallVec;

use crate::registry::{TypeRegistry, TypeTag};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("malformed path {:?}", .0)]
    Malformed(String),
    #[error("no kind named {:?}", .0)]
    UnknownKind(String),
    #[error("nothing at {}", .0)]
    NotFound(String),
}

/// One step down the tree: the `index`th child of the folder of exactly `folder`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PathStep {
    pub folder: TypeTag,
    pub index: usize,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct NodePath {
    steps: SmallVec<[PathStep; 4]>,
}
impl NodePath {
    /// The path to the root node itself.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
    /// Extend by one step, returning the child path.
    #[must_use]
    pub fn join(mut self, folder: TypeTag, index: usize) -> Self {
        self.steps.push(PathStep { folder, index });
        self
    }
    /// The path to the node owning this one, or None at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.steps.split_last()?;
        Some(Self {
            steps: init.into(),
        })
    }
    #[must_use]
    pub fn last(&self) -> Option<PathStep> {
        self.steps.last().copied()
    }
    /// Number of steps from the root. The root itself is depth zero.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
    /// Parse the textual form, resolving kind names against `registry`.
    pub fn parse(text: &str, registry: &TypeRegistry) -> Result<Self, PathError> {
        let malformed = || PathError::Malformed(text.to_owned());
        let rest = text.trim().strip_prefix('/').ok_or_else(malformed)?;
        let mut path = Self::root();
        // Tolerate a trailing slash, "/Model/0/" is fine.
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(path);
        }
        let mut parts = rest.split('/');
        while let Some(kind) = parts.next() {
            let index = parts.next().ok_or_else(malformed)?;
            if kind.is_empty() {
                return Err(malformed());
            }
            let folder = registry
                .tag_by_name(kind)
                .ok_or_else(|| PathError::UnknownKind(kind.to_owned()))?;
            let index = index.parse::<usize>().map_err(|_| malformed())?;
            path = path.join(folder, index);
        }
        Ok(path)
    }
    /// Display with kinds spelled by name.
    #[must_use]
    pub fn display<'a>(&'a self, registry: &'a TypeRegistry) -> DisplayPath<'a> {
        DisplayPath {
            path: self,
            registry,
        }
    }
}

pub struct DisplayPath<'a> {
    path: &'a NodePath,
    registry: &'a TypeRegistry,
}
impl std::fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_root() {
            return f.write_str("/");
        }
        for step in self.path.steps() {
            match self.registry.name_of(step.folder) {
                Some(name) => write!(f, "/{name}/{}", step.index)?,
                None => write!(f, "/{}/{}", step.folder, step.index)?,
            }
        }
        Ok(())
    }
}
