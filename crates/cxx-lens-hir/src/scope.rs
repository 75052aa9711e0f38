//! Name tables: members of every container plus the lexical scope stack
//! used while lowering.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::unit::NodeId;

/// Declarations of a translation unit, namespace, record or enum, by name.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemberTable {
    entries: IndexMap<SmolStr, Vec<NodeId>>,
}

impl MemberTable {
    pub(crate) fn get(&self, name: &str) -> &[NodeId] {
        self.entries.get(name).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&SmolStr, &[NodeId])> {
        self.entries.iter().map(|(name, ids)| (name, ids.as_slice()))
    }
}

/// Persistent member tables, keyed by the canonical container declaration.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScopeTable {
    members: FxHashMap<NodeId, MemberTable>,
    bases: FxHashMap<NodeId, Vec<NodeId>>,
    usings: FxHashMap<NodeId, Vec<NodeId>>,
}

impl ScopeTable {
    pub(crate) fn insert(&mut self, container: NodeId, name: SmolStr, decl: NodeId) {
        let ids = self
            .members
            .entry(container)
            .or_default()
            .entries
            .entry(name)
            .or_default();
        if !ids.contains(&decl) {
            ids.push(decl);
        }
    }

    pub(crate) fn members(&self, container: NodeId) -> Option<&MemberTable> {
        self.members.get(&container)
    }

    pub(crate) fn add_base(&mut self, record: NodeId, base: NodeId) {
        self.bases.entry(record).or_default().push(base);
    }

    pub(crate) fn bases(&self, record: NodeId) -> &[NodeId] {
        self.bases.get(&record).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn add_using(&mut self, container: NodeId, namespace: NodeId) {
        let usings = self.usings.entry(container).or_default();
        if !usings.contains(&namespace) {
            usings.push(namespace);
        }
    }

    pub(crate) fn usings(&self, container: NodeId) -> &[NodeId] {
        self.usings.get(&container).map_or(&[], Vec::as_slice)
    }

    /// Looks `name` up in `container`, its base classes and the namespaces
    /// it nominates with `using namespace`.
    pub(crate) fn lookup_member(&self, container: NodeId, name: &str) -> Vec<NodeId> {
        let mut visited = FxHashSet::default();
        self.lookup_in(container, name, &mut visited)
    }

    fn lookup_in(
        &self,
        container: NodeId,
        name: &str,
        visited: &mut FxHashSet<NodeId>,
    ) -> Vec<NodeId> {
        if !visited.insert(container) {
            return Vec::new();
        }
        if let Some(found) = self.members(container).map(|table| table.get(name)) {
            if !found.is_empty() {
                return found.to_vec();
            }
        }
        for base in self.bases(container) {
            let found = self.lookup_in(*base, name, visited);
            if !found.is_empty() {
                return found;
            }
        }
        for namespace in self.usings(container) {
            let found = self.lookup_in(*namespace, name, visited);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Every member visible through `container`, bases included, first
    /// declaration per name.
    pub(crate) fn all_members(&self, container: NodeId) -> Vec<(SmolStr, NodeId)> {
        let mut seen = FxHashSet::default();
        let mut names = FxHashSet::default();
        let mut out = Vec::new();
        self.collect_members(container, &mut seen, &mut names, &mut out);
        out
    }

    fn collect_members(
        &self,
        container: NodeId,
        seen: &mut FxHashSet<NodeId>,
        names: &mut FxHashSet<SmolStr>,
        out: &mut Vec<(SmolStr, NodeId)>,
    ) {
        if !seen.insert(container) {
            return;
        }
        if let Some(table) = self.members(container) {
            for (name, ids) in table.iter() {
                if let Some(first) = ids.first() {
                    if names.insert(name.clone()) {
                        out.push((name.clone(), *first));
                    }
                }
            }
        }
        for base in self.bases(container) {
            self.collect_members(*base, seen, names, out);
        }
        for namespace in self.usings(container) {
            self.collect_members(*namespace, seen, names, out);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// Namespace, record or enum scope; names live in the [`ScopeTable`].
    Container(NodeId),
    /// Function body, block or template parameter list.
    Block,
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) kind: FrameKind,
    locals: FxHashMap<SmolStr, Vec<NodeId>>,
    usings: Vec<NodeId>,
    pub(crate) template: bool,
}

impl Frame {
    pub(crate) fn container(container: NodeId) -> Self {
        Self {
            kind: FrameKind::Container(container),
            locals: FxHashMap::default(),
            usings: Vec::new(),
            template: false,
        }
    }

    pub(crate) fn block() -> Self {
        Self {
            kind: FrameKind::Block,
            locals: FxHashMap::default(),
            usings: Vec::new(),
            template: false,
        }
    }

    pub(crate) fn template() -> Self {
        Self {
            template: true,
            ..Self::block()
        }
    }
}

/// Lexical scopes active at the current lowering position, innermost last.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// Innermost namespace/record/enum scope.
    pub(crate) fn container(&self) -> NodeId {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| match frame.kind {
                FrameKind::Container(id) => Some(id),
                FrameKind::Block => None,
            })
            .unwrap_or(NodeId::ROOT)
    }

    pub(crate) fn containers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.frames.iter().rev().filter_map(|frame| match frame.kind {
            FrameKind::Container(id) => Some(id),
            FrameKind::Block => None,
        })
    }

    pub(crate) fn in_template(&self) -> bool {
        self.frames.iter().any(|frame| frame.template)
    }

    pub(crate) fn innermost_is_block(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::Block)
    }

    /// Declares `name` in the innermost scope.
    pub(crate) fn declare(&mut self, table: &mut ScopeTable, name: SmolStr, decl: NodeId) {
        if name.is_empty() {
            return;
        }
        match self.frames.last_mut() {
            Some(frame) if frame.kind == FrameKind::Block => {
                frame.locals.entry(name).or_default().push(decl);
            }
            Some(Frame {
                kind: FrameKind::Container(container),
                ..
            }) => table.insert(*container, name, decl),
            _ => table.insert(NodeId::ROOT, name, decl),
        }
    }

    /// Records a `using namespace` directive in the innermost scope.
    pub(crate) fn add_using(&mut self, table: &mut ScopeTable, namespace: NodeId) {
        match self.frames.last_mut() {
            Some(frame) if frame.kind == FrameKind::Block => frame.usings.push(namespace),
            Some(Frame {
                kind: FrameKind::Container(container),
                ..
            }) => table.add_using(*container, namespace),
            _ => table.add_using(NodeId::ROOT, namespace),
        }
    }

    /// Unqualified lookup from the innermost scope outwards.
    pub(crate) fn lookup(&self, table: &ScopeTable, name: &str) -> Vec<NodeId> {
        for frame in self.frames.iter().rev() {
            let found = match frame.kind {
                FrameKind::Container(container) => table.lookup_member(container, name),
                FrameKind::Block => frame.locals.get(name).cloned().unwrap_or_default(),
            };
            if !found.is_empty() {
                return found;
            }
            for namespace in &frame.usings {
                let found = table.lookup_member(*namespace, name);
                if !found.is_empty() {
                    return found;
                }
            }
        }
        table.lookup_member(NodeId::ROOT, name)
    }
}
