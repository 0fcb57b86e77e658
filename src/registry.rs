//! Structure and method-signature registries consulted during emission (§2 component 9, §4.6,
//! §9 "Registries that look cyclic").
//!
//! Both registries are a central owner holding records by name, populated during a pass over the
//! processed model and only read during emission — parsers and sinks never hold a reference back
//! into a registry, so what would otherwise be a cyclic structure (a struct referring to another
//! struct referring back) is just a tree of string keys over an arena-like owner.

use std::collections::{HashMap, HashSet};

use crate::encoding::{MethodSignature, TypeNode};

/// Every distinct struct/union tag seen while formatting the model's types, keyed by tag, with
/// Kahn's-algorithm topological ordering for `CDStructures.h` aggregation (§6 sink 1).
#[derive(Debug, Default)]
pub struct StructureRegistry {
    members: HashMap<String, Option<Vec<TypeNode>>>,
    order: Vec<String>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks every struct/union reachable from `node` (through direct embedding, not pointers —
    /// a pointer member only needs a forward declaration in C, so it isn't a registration
    /// dependency and never introduces a cycle for a self-referential pointer field) and
    /// registers each one, keeping the first full definition seen for a given tag.
    pub fn register(&mut self, node: &TypeNode) {
        match node {
            TypeNode::Struct { tag, members } | TypeNode::Union { tag, members } => {
                if tag.is_empty() {
                    return;
                }
                if !self.members.contains_key(tag) {
                    self.order.push(tag.clone());
                    self.members.insert(tag.clone(), members.clone());
                } else if self.members.get(tag).and_then(|m| m.as_ref()).is_none() {
                    if members.is_some() {
                        self.members.insert(tag.clone(), members.clone());
                    }
                }
                if let Some(members) = members {
                    for member in members {
                        self.register(member);
                    }
                }
            }
            TypeNode::Array { element, .. } => self.register(element),
            _ => {}
        }
    }

    pub fn known_tags(&self) -> HashSet<String> {
        self.members.keys().cloned().collect()
    }

    /// `Some(members)` for a tag with a known definition, `Some(&[])` for one seen only as an
    /// opaque forward reference, `None` if the tag was never registered.
    pub fn members_of(&self, tag: &str) -> Option<&[TypeNode]> {
        self.members.get(tag).map(|m| m.as_deref().unwrap_or(&[]))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Tags in dependency order: a struct embedding another (by value, not by pointer) is
    /// ordered after it (§8 invariant 7). Falls back to first-seen order among any remaining
    /// tags a cycle left unresolved — direct embedding cycles can't happen in valid C, but a
    /// malformed encoding shouldn't hang emission.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut depends_on: HashMap<&str, HashSet<&str>> = HashMap::new();
        for tag in &self.order {
            depends_on.entry(tag.as_str()).or_default();
        }
        for tag in &self.order {
            let Some(Some(members)) = self.members.get(tag) else {
                continue;
            };
            let deps = depends_on.entry(tag.as_str()).or_default();
            for member in members {
                collect_embedded_tags(member, deps);
            }
            depends_on.entry(tag.as_str()).or_default().remove(tag.as_str());
        }

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for tag in &self.order {
            let count = depends_on.get(tag.as_str()).map(HashSet::len).unwrap_or(0);
            in_degree.insert(tag.as_str(), count);
        }

        let mut ready: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|t| in_degree.get(t).copied().unwrap_or(0) == 0)
            .collect();
        let mut result = Vec::with_capacity(self.order.len());
        let mut emitted: HashSet<&str> = HashSet::new();

        while let Some(tag) = ready.pop() {
            if !emitted.insert(tag) {
                continue;
            }
            result.push(tag);
            for candidate in &self.order {
                let candidate = candidate.as_str();
                if emitted.contains(candidate) {
                    continue;
                }
                if depends_on
                    .get(candidate)
                    .map(|deps| deps.contains(tag))
                    .unwrap_or(false)
                {
                    let remaining = in_degree.entry(candidate).or_insert(0);
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        ready.push(candidate);
                    }
                }
            }
        }

        for tag in &self.order {
            if !emitted.contains(tag.as_str()) {
                result.push(tag.as_str());
            }
        }

        result
    }
}

fn collect_embedded_tags<'a>(node: &'a TypeNode, into: &mut HashSet<&'a str>) {
    match node {
        TypeNode::Struct { tag, .. } | TypeNode::Union { tag, .. } if !tag.is_empty() => {
            into.insert(tag.as_str());
        }
        TypeNode::Array { element, .. } => collect_embedded_tags(element, into),
        _ => {}
    }
}

/// Cross-references a block (`@?`) signature against a protocol method of the same selector, so
/// a `^{...}` block argument can be rendered with the richer, named argument types its protocol
/// counterpart declares instead of the bare positional encoding (§4.6 "Block-signature parser").
#[derive(Debug, Default)]
pub struct MethodSignatureRegistry {
    by_selector: HashMap<String, MethodSignature>,
}

impl MethodSignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, selector: &str, signature: MethodSignature) {
        self.by_selector.entry(selector.to_string()).or_insert(signature);
    }

    pub fn lookup(&self, selector: &str) -> Option<&MethodSignature> {
        self.by_selector.get(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_struct(tag: &str, members: Vec<TypeNode>) -> TypeNode {
        TypeNode::Struct {
            tag: tag.to_string(),
            members: Some(members),
        }
    }

    #[test]
    fn orders_embedded_struct_before_its_container() {
        let mut registry = StructureRegistry::new();
        let point = named_struct("CGPoint", vec![TypeNode::Primitive('d'), TypeNode::Primitive('d')]);
        let rect = named_struct(
            "CGRect",
            vec![point.clone(), named_struct("CGSize", vec![TypeNode::Primitive('d')])],
        );
        registry.register(&rect);

        let order = registry.topological_order();
        let point_pos = order.iter().position(|t| *t == "CGPoint").unwrap();
        let size_pos = order.iter().position(|t| *t == "CGSize").unwrap();
        let rect_pos = order.iter().position(|t| *t == "CGRect").unwrap();
        assert!(point_pos < rect_pos);
        assert!(size_pos < rect_pos);
    }

    #[test]
    fn pointer_self_reference_does_not_cycle() {
        let mut registry = StructureRegistry::new();
        let node = TypeNode::Struct {
            tag: "Node".to_string(),
            members: Some(vec![TypeNode::Pointer(Box::new(TypeNode::Struct {
                tag: "Node".to_string(),
                members: None,
            }))]),
        };
        registry.register(&node);
        assert_eq!(registry.topological_order(), vec!["Node"]);
    }
}
