//! Renders a [`crate::visitor::Model`] as Objective-C header text (§6 sink 1).

use std::collections::HashMap;

use crate::encoding::Role;
use crate::objc::{ClassRef, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcProperty, ObjcProtocol};
use crate::options::Options;
use crate::registry::StructureRegistry;

use super::super::render::{format_ivar_line, format_method_line, format_property_line};
use super::super::{build_structure_registry, Model, MethodKind, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Protocol,
    Class { ivar_block_open: bool },
    Category,
}

/// Emits one `@interface`/`@protocol` block at a time. Since the `Sink` trait has no explicit
/// "end of entity" hook, a block is closed lazily: at the start of the next
/// protocol/class/category, or at `end()` (§9 "Sink trait").
pub struct TextObjcSink {
    buffer: String,
    registry: StructureRegistry,
    known: std::collections::HashSet<String>,
    address_to_name: HashMap<u64, String>,
    current: Block,
}

impl Default for TextObjcSink {
    fn default() -> Self {
        TextObjcSink {
            buffer: String::new(),
            registry: StructureRegistry::new(),
            known: std::collections::HashSet::new(),
            address_to_name: HashMap::new(),
            current: Block::None,
        }
    }
}

impl TextObjcSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_output(self) -> String {
        self.buffer
    }

    fn resolve_class_ref(&self, reference: &ClassRef) -> String {
        match reference {
            ClassRef::Local(address) => self
                .address_to_name
                .get(address)
                .cloned()
                .unwrap_or_else(|| format!("/* 0x{address:x} */")),
            ClassRef::External(name) => name.clone(),
        }
    }

    fn close_current_block(&mut self) {
        match self.current {
            Block::None => {}
            Block::Protocol => self.buffer.push_str("@end\n\n"),
            Block::Class { ivar_block_open } => {
                if ivar_block_open {
                    self.buffer.push_str("}\n\n");
                }
                self.buffer.push_str("@end\n\n");
            }
            Block::Category => self.buffer.push_str("@end\n\n"),
        }
        self.current = Block::None;
    }

    fn close_ivar_block_if_open(&mut self) {
        if let Block::Class { ivar_block_open: true } = self.current {
            self.buffer.push_str("}\n\n");
            self.current = Block::Class { ivar_block_open: false };
        }
    }

    fn emit_structures(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        self.buffer.push_str("#pragma mark Structures\n\n");
        for tag in self.registry.topological_order() {
            let members = self.registry.members_of(tag).unwrap_or(&[]);
            if members.is_empty() {
                self.buffer.push_str(&format!("struct {tag};\n\n"));
                continue;
            }
            self.buffer.push_str(&format!("struct {tag} {{\n"));
            for (i, member) in members.iter().enumerate() {
                let decl = crate::encoding::format_declaration(member, &format!("field{i}"), Role::StructMember, &self.known);
                self.buffer.push_str(&format!("    {decl};\n"));
            }
            self.buffer.push_str(&format!("}};\ntypedef struct {tag} {tag};\n\n"));
        }
    }
}

impl Sink for TextObjcSink {
    fn begin(&mut self, model: &Model, options: &Options) {
        self.address_to_name = model
            .objc
            .classes
            .iter()
            .map(|c| (c.address, c.name.clone()))
            .collect();
        self.registry = build_structure_registry(model);
        self.known = self.registry.known_tags();

        if let Some(info) = &model.objc.image_info {
            self.buffer
                .push_str(&format!("// Image info: version={}, flags={:?}\n\n", info.version, info.flags));
        }
        if options.structures_visible() {
            self.emit_structures();
        }
    }

    fn end(&mut self, _options: &Options) {
        self.close_current_block();
    }

    fn visit_protocol(&mut self, protocol: &ObjcProtocol, _options: &Options) {
        self.close_current_block();
        let conforms = if protocol.protocols.is_empty() {
            String::new()
        } else {
            format!(" <{}>", protocol.protocols.join(", "))
        };
        self.buffer.push_str(&format!("@protocol {}{conforms}\n", protocol.name));
        self.current = Block::Protocol;
    }

    fn visit_class(&mut self, class: &ObjcClass, _options: &Options) {
        self.close_current_block();
        let superclass = self.resolve_class_ref(&class.superclass);
        let conforms = if class.protocols.is_empty() {
            String::new()
        } else {
            format!(" <{}>", class.protocols.join(", "))
        };
        self.buffer
            .push_str(&format!("@interface {} : {superclass}{conforms}\n", class.name));
        self.current = Block::Class { ivar_block_open: false };
    }

    fn visit_category(&mut self, category: &ObjcCategory, _options: &Options) {
        self.close_current_block();
        let class = self.resolve_class_ref(&category.class);
        self.buffer
            .push_str(&format!("@interface {class} ({})\n", category.name));
        self.current = Block::Category;
    }

    fn visit_method(&mut self, method: &ObjcMethod, kind: MethodKind, options: &Options) {
        self.close_ivar_block_if_open();
        let line = format_method_line(method, kind, &self.known, options);
        self.buffer.push_str(&line);
        self.buffer.push('\n');
    }

    fn visit_property(&mut self, property: &ObjcProperty, options: &Options) {
        self.close_ivar_block_if_open();
        let line = format_property_line(property, &self.known, options);
        self.buffer.push_str(&line);
        self.buffer.push('\n');
    }

    fn visit_ivar(&mut self, ivar: &ObjcIvar, options: &Options) {
        if let Block::Class { ivar_block_open: false } = self.current {
            self.buffer.push_str("{\n");
            self.current = Block::Class { ivar_block_open: true };
        }
        let line = format_ivar_line(ivar, &self.known, options);
        self.buffer.push_str("    ");
        self.buffer.push_str(&line);
        self.buffer.push('\n');
    }

    fn begin_optional(&mut self, _options: &Options) {
        self.close_ivar_block_if_open();
        self.buffer.push_str("@optional\n");
    }

    fn end_optional(&mut self, _options: &Options) {
        self.buffer.push_str("@required\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::PropertyAttributes;
    use crate::objc::ObjcModel;
    use crate::visitor::visit;

    fn property(name: &str, type_encoding: Option<crate::encoding::TypeNode>) -> ObjcProperty {
        ObjcProperty {
            name: name.to_string(),
            raw_attributes: String::new(),
            attributes: PropertyAttributes {
                type_encoding,
                copy: true,
                nonatomic: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn renders_class_with_property_and_method() {
        let class = ObjcClass {
            address: 1,
            name: "Greeter".to_string(),
            superclass: ClassRef::External("NSObject".to_string()),
            is_swift_stable: false,
            is_swift_legacy: false,
            instance_methods: vec![ObjcMethod {
                name: "doSomething:withValue:".to_string(),
                type_encoding: "@28@0:8@16i24".to_string(),
                implementation: None,
            }],
            class_methods: Vec::new(),
            properties: vec![property(
                "name",
                Some(crate::encoding::TypeNode::Id(Some("NSString".to_string()))),
            )],
            ivars: Vec::new(),
            protocols: Vec::new(),
        };
        let model = Model {
            objc: ObjcModel {
                classes: vec![class],
                ..Default::default()
            },
            swift: Default::default(),
        };
        let options = Options::new();
        let mut sink = TextObjcSink::new();
        visit(&model, &mut sink, &options).unwrap();
        let output = sink.into_output();
        assert!(output.contains("@interface Greeter : NSObject"));
        assert!(output.contains("@property(copy, nonatomic) NSString *name;"));
        assert!(output.contains("- (id)doSomething:(id)arg1 withValue:(int)arg2;"));
        assert!(output.contains("@end"));
    }
}
