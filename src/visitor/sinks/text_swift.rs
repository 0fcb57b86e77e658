//! Renders a [`crate::visitor::Model`] as Swift interface text (§6 sink 2).

use std::collections::HashMap;

use crate::objc::{ClassRef, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcProperty, ObjcProtocol};
use crate::options::Options;

use super::super::render::{format_method_line, swift_type_name};
use super::super::{Model, MethodKind, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Protocol,
    Class,
    Extension,
}

/// Only classes and protocols whose runtime metadata marks them `@objc`-visible have anything to
/// say here (§4.5 "isSwift flag") — a pure-Swift type with no ObjC-exposed surface has no
/// `ObjcClass`/`ObjcProtocol` record to visit in the first place, so this sink never needs to
/// filter one out itself.
pub struct TextSwiftSink {
    buffer: String,
    address_to_name: HashMap<u64, String>,
    current: Block,
}

impl Default for TextSwiftSink {
    fn default() -> Self {
        TextSwiftSink {
            buffer: String::new(),
            address_to_name: HashMap::new(),
            current: Block::None,
        }
    }
}

impl TextSwiftSink {
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
        if self.current != Block::None {
            self.buffer.push_str("}\n\n");
        }
        self.current = Block::None;
    }
}

impl Sink for TextSwiftSink {
    fn begin(&mut self, model: &Model, _options: &Options) {
        self.address_to_name = model
            .objc
            .classes
            .iter()
            .map(|c| (c.address, c.name.clone()))
            .collect();
    }

    fn end(&mut self, _options: &Options) {
        self.close_current_block();
    }

    fn visit_protocol(&mut self, protocol: &ObjcProtocol, _options: &Options) {
        self.close_current_block();
        let conforms = if protocol.protocols.is_empty() {
            String::new()
        } else {
            format!(": {}", protocol.protocols.join(", "))
        };
        self.buffer
            .push_str(&format!("@objc public protocol {} {conforms} {{\n", protocol.name));
        self.current = Block::Protocol;
    }

    fn visit_class(&mut self, class: &ObjcClass, _options: &Options) {
        self.close_current_block();
        let superclass = self.resolve_class_ref(&class.superclass);
        let mut conforms: Vec<String> = vec![superclass];
        conforms.extend(class.protocols.iter().cloned());
        let kind_note = match swift_type_kind_note(class) {
            Some(note) => format!(" // {note}"),
            None => String::new(),
        };
        self.buffer
            .push_str(&format!("@objc public class {}: {} {{{kind_note}\n", class.name, conforms.join(", ")));
        self.current = Block::Class;
    }

    fn visit_category(&mut self, category: &ObjcCategory, _options: &Options) {
        self.close_current_block();
        let class = self.resolve_class_ref(&category.class);
        self.buffer.push_str(&format!("extension {class} {{\n"));
        self.current = Block::Extension;
    }

    fn visit_method(&mut self, method: &ObjcMethod, kind: MethodKind, options: &Options) {
        let line = format_method_line(method, kind, &Default::default(), options);
        self.buffer.push_str("    ");
        self.buffer.push_str(&line);
        self.buffer.push('\n');
    }

    fn visit_property(&mut self, property: &ObjcProperty, _options: &Options) {
        let node = property.attributes.type_encoding.clone().unwrap_or(crate::encoding::TypeNode::Id(None));
        let accessors = if property.attributes.readonly { "{ get }" } else { "{ get set }" };
        self.buffer
            .push_str(&format!("    var {}: {} {accessors}\n", property.name, swift_type_name(&node)));
    }

    fn visit_ivar(&mut self, _ivar: &ObjcIvar, _options: &Options) {
        // Swift has no ivar declarations in its interface surface; stored properties are
        // already covered by `visit_property`.
    }

    fn begin_optional(&mut self, _options: &Options) {
        self.buffer.push_str("    // @objc optional\n");
    }

    fn end_optional(&mut self, _options: &Options) {}
}

fn swift_type_kind_note(class: &ObjcClass) -> Option<&'static str> {
    if class.is_swift_stable {
        Some("swift (stable ABI)")
    } else if class.is_swift_legacy {
        Some("swift (legacy ABI)")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objc::ObjcModel;
    use crate::visitor::visit;

    #[test]
    fn renders_swift_marked_class() {
        let class = ObjcClass {
            address: 1,
            name: "Greeter".to_string(),
            superclass: ClassRef::External("NSObject".to_string()),
            is_swift_stable: true,
            is_swift_legacy: false,
            instance_methods: vec![ObjcMethod {
                name: "doSomething:withValue:".to_string(),
                type_encoding: "@28@0:8@16i24".to_string(),
                implementation: None,
            }],
            class_methods: Vec::new(),
            properties: Vec::new(),
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
        let options = Options::new().method_style(crate::options::MethodStyle::Swift);
        let mut sink = TextSwiftSink::new();
        visit(&model, &mut sink, &options).unwrap();
        let output = sink.into_output();
        assert!(output.contains("@objc public class Greeter: NSObject {"));
        assert!(output.contains("func doSomething(_ arg1: Any, withValue arg2: Int32) -> Any"));
    }
}
