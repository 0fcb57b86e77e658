//! The visitor pipeline (§4.10, §6, §9): walks a combined ObjC/Swift model once, in a stable
//! order, and hands each record to a [`Sink`] — the single choke point every output format goes
//! through, so `TextObjcSink`, `TextSwiftSink`, `JsonSink`, and `SymbolGraphSink` only differ in
//! how they render a visit, never in which records get visited or in what order.

pub mod render;
pub mod sinks;

pub use crate::options::{MethodStyle, Options, TextStyle};
pub use sinks::{JsonSink, SymbolGraphSink, TextObjcSink, TextSwiftSink};

use std::collections::HashMap;

use crate::encoding::parse_type;
use crate::objc::{ClassRef, ObjcCategory, ObjcClass, ObjcModel, ObjcProtocol};
use crate::registry::StructureRegistry;
use crate::swift::SwiftModel;

/// The combined result of `process_objc` and (optionally) `process_swift` for one image — the one
/// input the visitor and every sink see (§6 "visit(model, sink, options)").
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub objc: ObjcModel,
    pub swift: SwiftModel,
}

impl Model {
    pub fn new(objc: ObjcModel, swift: SwiftModel) -> Self {
        Model { objc, swift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Class,
    Instance,
}

/// Everything a renderer needs to know about in order to produce one output format, called in a
/// fixed sequence by [`visit`] (§9 "Sink trait").
pub trait Sink {
    fn begin(&mut self, model: &Model, options: &Options);
    fn end(&mut self, options: &Options);

    fn visit_protocol(&mut self, protocol: &ObjcProtocol, options: &Options);
    fn visit_class(&mut self, class: &ObjcClass, options: &Options);
    fn visit_category(&mut self, category: &ObjcCategory, options: &Options);

    fn visit_method(&mut self, method: &crate::objc::ObjcMethod, kind: MethodKind, options: &Options);
    fn visit_property(&mut self, property: &crate::objc::ObjcProperty, options: &Options);
    fn visit_ivar(&mut self, ivar: &crate::objc::ObjcIvar, options: &Options);

    fn begin_optional(&mut self, options: &Options);
    fn end_optional(&mut self, options: &Options);
}

/// Walks `model` once in the order `options` selects and feeds every record to `sink`.
///
/// Sinks never see the model directly past `begin` — everything downstream arrives one record at
/// a time through the trait's visit methods, so a sink cannot accidentally depend on traversal
/// order it didn't itself request via `options`.
pub fn visit(model: &Model, sink: &mut dyn Sink, options: &Options) -> crate::error::Result<()> {
    sink.begin(model, options);

    if options.protocols_visible() {
        for protocol in ordered_protocols(&model.objc, options) {
            sink.visit_protocol(protocol, options);
            for property in &protocol.properties {
                sink.visit_property(property, options);
            }
            for method in &protocol.class_methods {
                sink.visit_method(method, MethodKind::Class, options);
            }
            for method in &protocol.instance_methods {
                sink.visit_method(method, MethodKind::Instance, options);
            }
            if !protocol.optional_class_methods.is_empty() || !protocol.optional_instance_methods.is_empty() {
                sink.begin_optional(options);
                for method in &protocol.optional_class_methods {
                    sink.visit_method(method, MethodKind::Class, options);
                }
                for method in &protocol.optional_instance_methods {
                    sink.visit_method(method, MethodKind::Instance, options);
                }
                sink.end_optional(options);
            }
        }
    }

    if options.classes_visible() {
        for class in ordered_classes(&model.objc, options) {
            sink.visit_class(class, options);
            for ivar in &class.ivars {
                sink.visit_ivar(ivar, options);
            }
            for property in &class.properties {
                sink.visit_property(property, options);
            }
            for method in &class.class_methods {
                sink.visit_method(method, MethodKind::Class, options);
            }
            for method in &class.instance_methods {
                sink.visit_method(method, MethodKind::Instance, options);
            }
        }

        for category in &model.objc.categories {
            sink.visit_category(category, options);
            for property in &category.properties {
                sink.visit_property(property, options);
            }
            for method in &category.class_methods {
                sink.visit_method(method, MethodKind::Class, options);
            }
            for method in &category.instance_methods {
                sink.visit_method(method, MethodKind::Instance, options);
            }
        }
    }

    sink.end(options);
    Ok(())
}

fn ordered_protocols<'a>(model: &'a ObjcModel, options: &Options) -> Vec<&'a ObjcProtocol> {
    let mut protocols: Vec<&ObjcProtocol> = model.protocols.iter().collect();
    if options.sort_alphabetic {
        protocols.sort_by(|a, b| a.name.cmp(&b.name));
    }
    protocols
}

/// Classes in file order, alphabetic order, or superclass-before-subclass order, per `options`
/// (§6 "sort_by_inheritance"). Inheritance order only orders local superclass edges — a class
/// whose superclass lives in another image (`ClassRef::External`) has no local predecessor to
/// wait on, so it is ready immediately.
fn ordered_classes<'a>(model: &'a ObjcModel, options: &Options) -> Vec<&'a ObjcClass> {
    if options.sort_alphabetic {
        let mut classes: Vec<&ObjcClass> = model.classes.iter().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        return classes;
    }
    if options.sort_by_inheritance {
        return topological_classes(model);
    }
    model.classes.iter().collect()
}

fn topological_classes(model: &ObjcModel) -> Vec<&ObjcClass> {
    let by_address: HashMap<u64, &ObjcClass> = model.classes.iter().map(|c| (c.address, c)).collect();

    let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut in_degree: HashMap<u64, usize> = model.classes.iter().map(|c| (c.address, 0)).collect();
    for class in &model.classes {
        if let ClassRef::Local(parent) = class.superclass {
            if by_address.contains_key(&parent) {
                children.entry(parent).or_default().push(class.address);
                *in_degree.entry(class.address).or_insert(0) += 1;
            }
        }
    }

    let mut ready: Vec<u64> = model
        .classes
        .iter()
        .map(|c| c.address)
        .filter(|a| in_degree.get(a).copied().unwrap_or(0) == 0)
        .collect();
    ready.sort_unstable();

    let mut result = Vec::with_capacity(model.classes.len());
    let mut visited = std::collections::HashSet::new();
    let mut cursor = 0;
    while cursor < ready.len() {
        let address = ready[cursor];
        cursor += 1;
        if !visited.insert(address) {
            continue;
        }
        if let Some(class) = by_address.get(&address) {
            result.push(*class);
        }
        if let Some(kids) = children.get(&address) {
            let mut kids = kids.clone();
            kids.sort_unstable();
            for kid in kids {
                let remaining = in_degree.entry(kid).or_insert(0);
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    ready.push(kid);
                }
            }
        }
    }

    for class in &model.classes {
        if !visited.contains(&class.address) {
            result.push(class);
        }
    }
    result
}

/// Pre-scans every ivar, property, and method signature in `model` for struct/union tags, so a
/// text sink can emit a complete `CDStructures.h`-style aggregation before (or regardless of)
/// the order individual records reference those tags (§6 sink 1, §8 invariant 7).
pub fn build_structure_registry(model: &Model) -> StructureRegistry {
    let mut registry = StructureRegistry::new();

    let mut register_method = |method: &crate::objc::ObjcMethod| {
        if let Ok(signature) = crate::encoding::parse_method_encoding(&method.type_encoding) {
            registry.register(&signature.return_type);
            for argument in &signature.argument_types {
                registry.register(argument);
            }
        }
    };

    let register_ivar = |registry: &mut StructureRegistry, ivar: &crate::objc::ObjcIvar| {
        if let Ok((node, _)) = parse_type(&ivar.type_encoding) {
            registry.register(&node);
        }
    };

    let register_property = |registry: &mut StructureRegistry, property: &crate::objc::ObjcProperty| {
        if let Some(node) = &property.attributes.type_encoding {
            registry.register(node);
        }
    };

    for class in &model.objc.classes {
        for ivar in &class.ivars {
            register_ivar(&mut registry, ivar);
        }
        for property in &class.properties {
            register_property(&mut registry, property);
        }
        for method in class.class_methods.iter().chain(class.instance_methods.iter()) {
            register_method(method);
        }
    }
    for category in &model.objc.categories {
        for property in &category.properties {
            register_property(&mut registry, property);
        }
        for method in category.class_methods.iter().chain(category.instance_methods.iter()) {
            register_method(method);
        }
    }
    for protocol in &model.objc.protocols {
        for property in &protocol.properties {
            register_property(&mut registry, property);
        }
        for method in protocol
            .class_methods
            .iter()
            .chain(protocol.instance_methods.iter())
            .chain(protocol.optional_class_methods.iter())
            .chain(protocol.optional_instance_methods.iter())
        {
            register_method(method);
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objc::{ClassRef, ObjcClass};

    fn class(address: u64, name: &str, superclass: ClassRef) -> ObjcClass {
        ObjcClass {
            address,
            name: name.to_string(),
            superclass,
            is_swift_stable: false,
            is_swift_legacy: false,
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
            properties: Vec::new(),
            ivars: Vec::new(),
            protocols: Vec::new(),
        }
    }

    #[test]
    fn orders_subclass_after_superclass() {
        let model = ObjcModel {
            classes: vec![
                class(2, "Dog", ClassRef::Local(1)),
                class(1, "Animal", ClassRef::External("NSObject".into())),
            ],
            ..Default::default()
        };
        let options = Options::new().sort_by_inheritance(true);
        let ordered = ordered_classes(&model, &options);
        let names: Vec<&str> = ordered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Animal", "Dog"]);
    }
}
