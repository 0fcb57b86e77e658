//! Renders a [`crate::visitor::Model`] as the crate's JSON interchange format (§6 sink 3).

use serde::Serialize;

use crate::objc::{ClassRef, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcProperty, ObjcProtocol};
use crate::options::Options;

use super::super::{Model, MethodKind, Sink};

#[derive(Serialize, Default)]
struct MethodDto {
    selector: String,
    type_encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

#[derive(Serialize, Default)]
struct PropertyDto {
    name: String,
    attributes: String,
}

#[derive(Serialize, Default)]
struct IvarDto {
    name: String,
    type_encoding: String,
    offset: String,
}

#[derive(Serialize, Default)]
struct ProtocolDto {
    name: String,
    conforms_to: Vec<String>,
    properties: Vec<PropertyDto>,
    class_methods: Vec<MethodDto>,
    instance_methods: Vec<MethodDto>,
    optional_class_methods: Vec<MethodDto>,
    optional_instance_methods: Vec<MethodDto>,
}

#[derive(Serialize, Default)]
struct ClassDto {
    name: String,
    superclass: String,
    is_swift: bool,
    conforms_to: Vec<String>,
    ivars: Vec<IvarDto>,
    properties: Vec<PropertyDto>,
    class_methods: Vec<MethodDto>,
    instance_methods: Vec<MethodDto>,
}

#[derive(Serialize, Default)]
struct CategoryDto {
    name: String,
    class: String,
    conforms_to: Vec<String>,
    properties: Vec<PropertyDto>,
    class_methods: Vec<MethodDto>,
    instance_methods: Vec<MethodDto>,
}

#[derive(Serialize)]
struct GeneratorDto {
    name: &'static str,
    version: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct DocumentDto {
    #[serde(rename = "schemaVersion")]
    schema_version: &'static str,
    generator: GeneratorDto,
    protocols: Vec<ProtocolDto>,
    classes: Vec<ClassDto>,
    categories: Vec<CategoryDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    Protocol(usize),
    Class(usize),
    Category(usize),
}

pub struct JsonSink {
    document: DocumentDto,
    current: Current,
    in_optional: bool,
}

impl Default for JsonSink {
    fn default() -> Self {
        JsonSink {
            document: DocumentDto {
                schema_version: "1.0",
                generator: GeneratorDto {
                    name: "machdump",
                    version: env!("CARGO_PKG_VERSION"),
                    timestamp: generator_timestamp(),
                },
                protocols: Vec::new(),
                classes: Vec::new(),
                categories: Vec::new(),
            },
            current: Current::None,
            in_optional: false,
        }
    }
}

fn generator_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn resolve_class_ref(reference: &ClassRef) -> String {
    match reference {
        ClassRef::Local(address) => format!("0x{address:x}"),
        ClassRef::External(name) => name.clone(),
    }
}

fn method_dto(method: &ObjcMethod, options: &Options) -> MethodDto {
    MethodDto {
        selector: method.name.clone(),
        type_encoding: method.type_encoding.clone(),
        address: if options.show_method_addresses {
            method.implementation.map(|a| format!("0x{a:x}"))
        } else {
            None
        },
    }
}

fn property_dto(property: &ObjcProperty) -> PropertyDto {
    PropertyDto {
        name: property.name.clone(),
        attributes: property.raw_attributes.clone(),
    }
}

fn ivar_dto(ivar: &ObjcIvar) -> IvarDto {
    IvarDto {
        name: ivar.name.clone(),
        type_encoding: ivar.type_encoding.clone(),
        offset: format!("0x{:x}", ivar.offset),
    }
}

impl JsonSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the accumulated document. Only meaningful after a full `visit()` pass.
    pub fn into_json(self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.document)
    }
}

impl Sink for JsonSink {
    fn begin(&mut self, _model: &Model, _options: &Options) {}

    fn end(&mut self, _options: &Options) {
        self.current = Current::None;
    }

    fn visit_protocol(&mut self, protocol: &ObjcProtocol, _options: &Options) {
        self.document.protocols.push(ProtocolDto {
            name: protocol.name.clone(),
            conforms_to: protocol.protocols.clone(),
            ..Default::default()
        });
        self.current = Current::Protocol(self.document.protocols.len() - 1);
        self.in_optional = false;
    }

    fn visit_class(&mut self, class: &ObjcClass, _options: &Options) {
        self.document.classes.push(ClassDto {
            name: class.name.clone(),
            superclass: resolve_class_ref(&class.superclass),
            is_swift: class.is_swift(),
            conforms_to: class.protocols.clone(),
            ..Default::default()
        });
        self.current = Current::Class(self.document.classes.len() - 1);
    }

    fn visit_category(&mut self, category: &ObjcCategory, _options: &Options) {
        self.document.categories.push(CategoryDto {
            name: category.name.clone(),
            class: resolve_class_ref(&category.class),
            conforms_to: category.protocols.clone(),
            ..Default::default()
        });
        self.current = Current::Category(self.document.categories.len() - 1);
    }

    fn visit_method(&mut self, method: &ObjcMethod, kind: MethodKind, options: &Options) {
        let dto = method_dto(method, options);
        match self.current {
            Current::Protocol(i) => {
                let protocol = &mut self.document.protocols[i];
                match (kind, self.in_optional) {
                    (MethodKind::Class, false) => protocol.class_methods.push(dto),
                    (MethodKind::Instance, false) => protocol.instance_methods.push(dto),
                    (MethodKind::Class, true) => protocol.optional_class_methods.push(dto),
                    (MethodKind::Instance, true) => protocol.optional_instance_methods.push(dto),
                }
            }
            Current::Class(i) => {
                let class = &mut self.document.classes[i];
                match kind {
                    MethodKind::Class => class.class_methods.push(dto),
                    MethodKind::Instance => class.instance_methods.push(dto),
                }
            }
            Current::Category(i) => {
                let category = &mut self.document.categories[i];
                match kind {
                    MethodKind::Class => category.class_methods.push(dto),
                    MethodKind::Instance => category.instance_methods.push(dto),
                }
            }
            Current::None => {}
        }
    }

    fn visit_property(&mut self, property: &ObjcProperty, _options: &Options) {
        let dto = property_dto(property);
        match self.current {
            Current::Protocol(i) => self.document.protocols[i].properties.push(dto),
            Current::Class(i) => self.document.classes[i].properties.push(dto),
            Current::Category(i) => self.document.categories[i].properties.push(dto),
            Current::None => {}
        }
    }

    fn visit_ivar(&mut self, ivar: &ObjcIvar, _options: &Options) {
        if let Current::Class(i) = self.current {
            self.document.classes[i].ivars.push(ivar_dto(ivar));
        }
    }

    fn begin_optional(&mut self, _options: &Options) {
        self.in_optional = true;
    }

    fn end_optional(&mut self, _options: &Options) {
        self.in_optional = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objc::ObjcModel;
    use crate::visitor::visit;

    #[test]
    fn serializes_a_single_class() {
        let class = ObjcClass {
            address: 1,
            name: "Greeter".to_string(),
            superclass: ClassRef::External("NSObject".to_string()),
            is_swift_stable: false,
            is_swift_legacy: false,
            instance_methods: Vec::new(),
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
        let options = Options::new();
        let mut sink = JsonSink::new();
        visit(&model, &mut sink, &options).unwrap();
        let json = sink.into_json().unwrap();
        assert!(json.contains("\"schemaVersion\": \"1.0\""));
        assert!(json.contains("\"Greeter\""));
    }
}
