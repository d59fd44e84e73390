//! # Shell
//!
//! A line-oriented command interpreter over the document model, standing in for an editor's menus
//! and outliner. One command per line, words separated by whitespace. Lines starting with `#` are
//! comments.
//!
//! Nodes are addressed by [`NodePath`]s such as `/Model/0/Bone/2`. Selection commands act on the
//! folder holding the addressed node.

use std::io::{BufRead, Write};
use std::sync::Arc;

use assetdoc_core::node::{Folder, PathError};
use assetdoc_core::registry::{Relation, RegistryError};
use assetdoc_core::{
    Document, DocumentID, DocumentNode, DocumentProvider, NodePath, TypeRegistry,
};
use strum::IntoEnumIterator;

use crate::{kinds, settings::Settings};

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::EnumString, strum::EnumIter, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    New,
    Docs,
    Switch,
    Close,
    Add,
    Remove,
    Rename,
    Select,
    Deselect,
    Toggle,
    Range,
    Clear,
    Commit,
    Undo,
    Redo,
    Tree,
    Status,
    Kinds,
    Help,
    Quit,
}
impl Command {
    #[must_use]
    pub fn usage(self) -> &'static str {
        match self {
            Self::New => "new [name]",
            Self::Docs => "docs",
            Self::Switch => "switch <n>",
            Self::Close => "close",
            Self::Add => "add <path> <Kind>",
            Self::Remove => "remove <path>",
            Self::Rename => "rename <path> <name>",
            Self::Select => "select <path>",
            Self::Deselect => "deselect <path>",
            Self::Toggle => "toggle <path>",
            Self::Range => "range <path>",
            Self::Clear => "clear <path> <Kind>",
            Self::Commit => "commit",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Tree => "tree",
            Self::Status => "status",
            Self::Kinds => "kinds",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::New => "open a new document and switch to it",
            Self::Docs => "list open documents",
            Self::Switch => "switch to the nth open document",
            Self::Close => "close the current document, discarding its history",
            Self::Add => "add a default node of a kind under the node at path",
            Self::Remove => "remove the node at path and everything below it",
            Self::Rename => "rename the node at path",
            Self::Select => "select a node and make it active",
            Self::Deselect => "deselect a node",
            Self::Toggle => "flip the selection of a node",
            Self::Range => "select from the active node up to this one",
            Self::Clear => "clear the selection in a folder of the node at path",
            Self::Commit => "record the document's current state, if changed",
            Self::Undo => "step back one commit",
            Self::Redo => "step forward one commit",
            Self::Tree => "show the current document",
            Self::Status => "show the current document's history",
            Self::Kinds => "list registered node kinds",
            Self::Help => "this",
            Self::Quit => "stop reading commands",
        }
    }
    /// Does this command change the document content? Selection isn't content.
    #[must_use]
    pub fn edits(self) -> bool {
        matches!(self, Self::Add | Self::Remove | Self::Rename)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("unknown command {:?}, try `help`", .0)]
    UnknownCommand(String),
    #[error("usage: {}", .0)]
    Usage(&'static str),
    #[error("no open document, try `new`")]
    NoDocument,
    #[error("no document #{}", .0)]
    NoSuchDocument(usize),
    #[error("the root can't be removed")]
    RemoveRoot,
    #[error("{} nodes have no name", .0)]
    Unnamed(&'static str),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    registry: Arc<TypeRegistry>,
    settings: Settings,
    documents: DocumentProvider,
    current: Option<DocumentID>,
}
impl Shell {
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            documents: DocumentProvider::new(),
            current: None,
        }
    }
    /// Execute every line of `input`, reporting to `out`. Command errors are reported and skipped,
    /// only IO errors stop the run.
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut impl Write,
        interactive: bool,
    ) -> std::io::Result<Flow> {
        if interactive {
            write!(out, "{}", self.settings.prompt)?;
            out.flush()?;
        }
        for line in input.lines() {
            match self.execute(&line?, out) {
                Ok(Flow::Quit) => return Ok(Flow::Quit),
                Ok(Flow::Continue) => (),
                Err(ShellError::Io(e)) => return Err(e),
                Err(e) => {
                    log::debug!("Command failed: {e:?}");
                    writeln!(out, "error: {e}")?;
                }
            }
            if interactive {
                write!(out, "{}", self.settings.prompt)?;
                out.flush()?;
            }
        }
        Ok(Flow::Continue)
    }
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Flow, ShellError> {
        let line = line.trim();
        if line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Flow::Continue);
        };
        let command: Command = word
            .parse()
            .map_err(|_| ShellError::UnknownCommand(word.to_owned()))?;
        let args: Vec<&str> = words.collect();
        log::trace!("{command:?} {args:?}");

        match command {
            Command::New => self.new_document(&args.join(" "), out)?,
            Command::Docs => self.list_documents(out)?,
            Command::Switch => {
                let [n] = args[..] else {
                    return Err(ShellError::Usage(command.usage()));
                };
                let n: usize = n.parse().map_err(|_| ShellError::Usage(command.usage()))?;
                let id = n
                    .checked_sub(1)
                    .and_then(|idx| self.documents.document_iter().nth(idx))
                    .ok_or(ShellError::NoSuchDocument(n))?;
                self.current = Some(id);
                writeln!(out, "switched to {}", self.document()?.name)?;
            }
            Command::Close => {
                let id = self.current.ok_or(ShellError::NoDocument)?;
                if let Some(closed) = self.documents.close(id) {
                    writeln!(out, "closed {}", closed.name)?;
                }
                self.current = self.documents.document_iter().next();
            }
            Command::Add => {
                let [path, kind] = args[..] else {
                    return Err(ShellError::Usage(command.usage()));
                };
                let path = NodePath::parse(path, &self.registry)?;
                let kind = self
                    .registry
                    .tag_by_name(kind)
                    .ok_or_else(|| PathError::UnknownKind(kind.to_owned()))?;
                let registry = Arc::clone(&self.registry);
                let parent = resolve_mut(self.document_mut()?.root_mut(), &path, &registry)?;
                let folder = parent.folder_entry(kind);
                folder.add();
                let added = path.join(kind, folder.len() - 1);
                writeln!(out, "added {}", added.display(&registry))?;
            }
            Command::Remove => {
                let path = self.one_path(command, &args)?;
                let (Some(step), Some(parent_path)) = (path.last(), path.parent()) else {
                    return Err(ShellError::RemoveRoot);
                };
                let registry = Arc::clone(&self.registry);
                let parent = resolve_mut(self.document_mut()?.root_mut(), &parent_path, &registry)?;
                let removed = parent
                    .folder_mut(step.folder)
                    .and_then(|folder| folder.remove(step.index))
                    .ok_or_else(|| not_found(&path, &registry))?;
                writeln!(
                    out,
                    "removed {} and {} below it",
                    describe(&removed),
                    removed.node_count() - 1
                )?;
            }
            Command::Rename => {
                let [path, ref name @ ..] = args[..] else {
                    return Err(ShellError::Usage(command.usage()));
                };
                if name.is_empty() {
                    return Err(ShellError::Usage(command.usage()));
                }
                let path = NodePath::parse(path, &self.registry)?;
                let registry = Arc::clone(&self.registry);
                let node = resolve_mut(self.document_mut()?.root_mut(), &path, &registry)?;
                if !kinds::rename(node, &name.join(" ")) {
                    return Err(ShellError::Unnamed(node.kind_name()));
                }
                writeln!(out, "renamed {}", describe(node))?;
            }
            Command::Select | Command::Deselect | Command::Toggle | Command::Range => {
                let path = self.one_path(command, &args)?;
                let registry = Arc::clone(&self.registry);
                let (folder, index) =
                    containing_folder(self.document_mut()?.root_mut(), &path, &registry)?;
                match command {
                    Command::Select => {
                        folder.select(index);
                        folder.set_active_selection(Some(index));
                    }
                    Command::Deselect => {
                        folder.deselect(index);
                    }
                    Command::Toggle => {
                        if folder.toggle_selection(index) {
                            folder.set_active_selection(Some(index));
                        }
                    }
                    _ => {
                        folder.select_range(index);
                    }
                }
                writeln!(out, "{} selected", folder.selection_count())?;
            }
            Command::Clear => {
                let [path, kind] = args[..] else {
                    return Err(ShellError::Usage(command.usage()));
                };
                let path = NodePath::parse(path, &self.registry)?;
                let kind_tag = self
                    .registry
                    .tag_by_name(kind)
                    .ok_or_else(|| PathError::UnknownKind(kind.to_owned()))?;
                let registry = Arc::clone(&self.registry);
                let node = resolve_mut(self.document_mut()?.root_mut(), &path, &registry)?;
                let folder = node.folder_mut(kind_tag).ok_or_else(|| {
                    let parent = path.display(&registry).to_string();
                    PathError::NotFound(format!("{}/{kind}", parent.trim_end_matches('/')))
                })?;
                writeln!(out, "cleared {}", folder.clear_selection())?;
            }
            Command::Commit => {
                let document = self.document_mut()?;
                if document.commit_if_changed() {
                    writeln!(out, "committed #{}", document.history().cursor())?;
                } else {
                    writeln!(out, "nothing to commit")?;
                }
            }
            Command::Undo => {
                let document = self.document_mut()?;
                if !document.can_undo() {
                    return Err(ShellError::NothingToUndo);
                }
                document.undo();
                writeln!(out, "at #{}", document.history().cursor())?;
            }
            Command::Redo => {
                let document = self.document_mut()?;
                if !document.can_redo() {
                    return Err(ShellError::NothingToRedo);
                }
                document.redo();
                writeln!(out, "at #{}", document.history().cursor())?;
            }
            Command::Tree => {
                let document = self.document()?;
                write_tree(out, document.root(), &NodePath::root(), &self.registry, ' ')?;
            }
            Command::Status => {
                let document = self.document()?;
                let history = document.history();
                writeln!(out, "{} ({})", document.name, document.id())?;
                writeln!(
                    out,
                    "commit #{} of {}{}",
                    history.cursor(),
                    history.len() - 1,
                    if document.is_dirty() {
                        ", uncommitted changes"
                    } else {
                        ""
                    }
                )?;
                writeln!(out, "{} nodes", document.root().node_count())?;
            }
            Command::Kinds => self.list_kinds(out)?,
            Command::Help => {
                for command in Command::iter() {
                    writeln!(out, "{:<24}{}", command.usage(), command.summary())?;
                }
            }
            Command::Quit => return Ok(Flow::Quit),
        }

        if command.edits() && self.settings.autocommit {
            let document = self.document_mut()?;
            if document.commit_if_changed() {
                writeln!(out, "committed #{}", document.history().cursor())?;
            }
        }
        Ok(Flow::Continue)
    }
    #[must_use]
    pub fn current_document(&self) -> Option<&Document> {
        self.documents.get(self.current?)
    }
    fn document(&self) -> Result<&Document, ShellError> {
        self.current_document().ok_or(ShellError::NoDocument)
    }
    fn document_mut(&mut self) -> Result<&mut Document, ShellError> {
        let id = self.current.ok_or(ShellError::NoDocument)?;
        self.documents.get_mut(id).ok_or(ShellError::NoDocument)
    }
    fn one_path(&self, command: Command, args: &[&str]) -> Result<NodePath, ShellError> {
        let [path] = args[..] else {
            return Err(ShellError::Usage(command.usage()));
        };
        Ok(NodePath::parse(path, &self.registry)?)
    }
    fn new_document(&mut self, name: &str, out: &mut impl Write) -> Result<(), ShellError> {
        let root_kind = self
            .registry
            .tag_by_name(&self.settings.root_kind)
            .ok_or_else(|| RegistryError::UnknownName(self.settings.root_kind.clone()))?;
        let mut document = Document::with_root_kind(&self.registry, root_kind)?;
        if !name.is_empty() {
            name.clone_into(&mut document.name);
        }
        writeln!(out, "opened {}", document.name)?;
        self.current = Some(self.documents.insert_new(document));
        Ok(())
    }
    fn list_documents(&self, out: &mut impl Write) -> Result<(), ShellError> {
        for (n, id) in self.documents.document_iter().enumerate() {
            let Some(document) = self.documents.get(id) else {
                continue;
            };
            let marker = if Some(id) == self.current { '*' } else { ' ' };
            let dirty = if document.is_dirty() { " (modified)" } else { "" };
            writeln!(out, "{marker}{} {}{dirty}", n + 1, document.name)?;
        }
        Ok(())
    }
    fn list_kinds(&self, out: &mut impl Write) -> Result<(), ShellError> {
        for (tag, name) in self.registry.iter() {
            write!(out, "{name}")?;
            for mirror in self.registry.mirrors().iter().filter(|m| m.derived == tag) {
                let base = self.registry.name_of(mirror.base).unwrap_or("?");
                match mirror.relation {
                    Relation::IsA(_) => write!(out, ", is-a {base}")?,
                    Relation::HasA { slot } => write!(out, ", has-a {base} (slot {slot})")?,
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn not_found(path: &NodePath, registry: &TypeRegistry) -> PathError {
    PathError::NotFound(path.display(registry).to_string())
}
fn resolve_mut<'a>(
    root: &'a mut DocumentNode,
    path: &NodePath,
    registry: &TypeRegistry,
) -> Result<&'a mut DocumentNode, PathError> {
    root.resolve_mut(path)
        .ok_or_else(|| not_found(path, registry))
}
/// The folder holding the node at `path`, and the node's index within it.
fn containing_folder<'a>(
    root: &'a mut DocumentNode,
    path: &NodePath,
    registry: &TypeRegistry,
) -> Result<(&'a mut Folder, usize), ShellError> {
    let (Some(step), Some(parent)) = (path.last(), path.parent()) else {
        // The root has no folder.
        return Err(not_found(path, registry).into());
    };
    let folder = resolve_mut(root, &parent, registry)?
        .folder_mut(step.folder)
        .filter(|folder| step.index < folder.len())
        .ok_or_else(|| not_found(path, registry))?;
    Ok((folder, step.index))
}
fn describe(node: &DocumentNode) -> String {
    match kinds::name(node) {
        Some(name) if !name.is_empty() => format!("{} {name:?}", node.kind_name()),
        _ => node.kind_name().to_owned(),
    }
}
fn write_tree(
    out: &mut impl Write,
    node: &DocumentNode,
    path: &NodePath,
    registry: &TypeRegistry,
    marker: char,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{:indent$}{marker} {} {}",
        "",
        path.display(registry),
        describe(node),
        indent = path.depth() * 2
    )?;
    for folder in node.folders() {
        for (idx, child) in folder.iter().enumerate() {
            let marker = if folder.active_selection() == Some(idx) {
                '>'
            } else if folder.is_selected(idx) {
                '*'
            } else {
                ' '
            };
            let child_path = path.clone().join(folder.kind(), idx);
            write_tree(out, child, &child_path, registry, marker)?;
        }
    }
    Ok(())
}
