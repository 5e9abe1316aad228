use fnv::FnvHashMap;
use itertools::Itertools;
use petgraph::{graph::NodeIndex, visit::Bfs, Graph};

use super::Ty;

/// Supertype and interface relationships between nominal types.
///
/// Edges point from a type to the types it derives from. Every type other
/// than `object` implicitly derives from `object`, which is always the last
/// ancestor reported.
#[derive(Clone, Debug)]
pub struct TypeHierarchy {
    graph: Graph<Ty, ()>,
    nodes: FnvHashMap<Ty, NodeIndex>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        let mut h = TypeHierarchy {
            graph: Graph::new(),
            nodes: FnvHashMap::default(),
        };
        h.node(&Ty::object());
        h
    }
}

impl TypeHierarchy {
    pub fn new() -> TypeHierarchy {
        TypeHierarchy::default()
    }

    /// A hierarchy with the primitive types and the built-in interfaces.
    pub fn with_builtins() -> TypeHierarchy {
        let mut h = TypeHierarchy::new();
        h.declare(&Ty::integral(), &[Ty::numeric()]);
        for ty in [Ty::int(), Ty::long()].iter() {
            h.declare(ty, &[Ty::integral(), Ty::comparable(), Ty::equatable()]);
        }
        h.declare(
            &Ty::float(),
            &[Ty::numeric(), Ty::comparable(), Ty::equatable()],
        );
        h.declare(&Ty::bool(), &[Ty::equatable()]);
        h.declare(&Ty::string(), &[Ty::comparable(), Ty::equatable()]);
        h.declare(&Ty::unit(), &[]);
        h.declare(&Ty::nil(), &[]);
        h
    }

    fn node(&mut self, ty: &Ty) -> NodeIndex {
        if let Some(idx) = self.nodes.get(ty) {
            return *idx;
        }

        let idx = self.graph.add_node(ty.clone());
        self.nodes.insert(ty.clone(), idx);
        idx
    }

    /// Declares `ty` with its direct supertypes and interfaces. Declaring a
    /// type more than once adds the new edges. Returns whether any edge was
    /// added.
    pub fn declare(&mut self, ty: &Ty, supertypes: &[Ty]) -> bool {
        let child = self.node(ty);
        let mut added = false;
        for sup in supertypes {
            if sup == ty {
                continue;
            }

            let parent = self.node(sup);
            if self.graph.find_edge(child, parent).is_none() {
                self.graph.add_edge(child, parent, ());
                added = true;
            }
        }
        added
    }

    pub fn contains(&self, ty: &Ty) -> bool {
        self.nodes.contains_key(ty)
    }

    /// `ty` followed by every reachable supertype and interface, without
    /// repetition. Undeclared types only have `object` as an ancestor.
    pub fn ancestors(&self, ty: &Ty) -> Vec<Ty> {
        let object = Ty::object();
        let mut found = vec![ty.clone()];
        if let Some(start) = self.nodes.get(ty) {
            let mut bfs = Bfs::new(&self.graph, *start);
            while let Some(idx) = bfs.next(&self.graph) {
                found.push(self.graph[idx].clone());
            }
        }

        let mut ancestors = found
            .into_iter()
            .filter(|t| t != &object)
            .unique()
            .collect::<Vec<_>>();
        ancestors.push(object);
        ancestors
    }

    /// Whether a value of type `actual` may stand where `requested` is asked
    /// for.
    pub fn is_assignable(&self, actual: &Ty, requested: &Ty) -> bool {
        actual == requested || self.ancestors(actual).contains(requested)
    }
}
