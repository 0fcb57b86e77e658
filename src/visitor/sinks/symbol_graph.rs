//! Renders a [`crate::visitor::Model`] as a DocC-style symbol graph (§6 sink 4, §8 scenario 7).

use std::collections::HashMap;

use serde::Serialize;

use crate::objc::{ClassRef, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcProperty, ObjcProtocol};
use crate::options::Options;

use super::super::{Model, MethodKind, Sink};

#[derive(Serialize)]
struct FormatVersionDto {
    major: u32,
    minor: u32,
    patch: u32,
}

#[derive(Serialize)]
struct MetadataDto {
    #[serde(rename = "formatVersion")]
    format_version: FormatVersionDto,
    generator: &'static str,
}

#[derive(Serialize)]
struct ModuleDto {
    name: String,
    platform: PlatformDto,
}

#[derive(Serialize)]
struct PlatformDto {
    #[serde(rename = "operatingSystem")]
    operating_system: OperatingSystemDto,
}

#[derive(Serialize)]
struct OperatingSystemDto {
    name: &'static str,
}

#[derive(Serialize)]
struct IdentifierDto {
    precise: String,
    #[serde(rename = "interfaceLanguage")]
    interface_language: &'static str,
}

#[derive(Serialize)]
struct SymbolKindDto {
    identifier: &'static str,
    #[serde(rename = "displayName")]
    display_name: &'static str,
}

#[derive(Serialize)]
struct NamesDto {
    title: String,
}

#[derive(Serialize)]
struct SymbolDto {
    kind: SymbolKindDto,
    identifier: IdentifierDto,
    #[serde(rename = "pathComponents")]
    path_components: Vec<String>,
    names: NamesDto,
}

#[derive(Serialize)]
struct RelationshipDto {
    source: String,
    target: String,
    kind: &'static str,
}

#[derive(Serialize)]
struct SymbolGraphDto {
    metadata: MetadataDto,
    module: ModuleDto,
    symbols: Vec<SymbolDto>,
    relationships: Vec<RelationshipDto>,
}

fn symbol(kind_id: &'static str, kind_name: &'static str, precise: String, path: Vec<String>, title: String) -> SymbolDto {
    SymbolDto {
        kind: SymbolKindDto {
            identifier: kind_id,
            display_name: kind_name,
        },
        identifier: IdentifierDto {
            precise,
            interface_language: "objective-c",
        },
        path_components: path,
        names: NamesDto { title },
    }
}

fn class_usr(name: &str) -> String {
    format!("c:objc(cs){name}")
}
fn protocol_usr(name: &str) -> String {
    format!("c:objc(pl){name}")
}
fn category_usr(class: &str, category: &str) -> String {
    format!("c:objc(cy){class}@{category}")
}
fn instance_method_usr(owner: &str, selector: &str) -> String {
    format!("c:objc(cs){owner}(im){selector}")
}
fn class_method_usr(owner: &str, selector: &str) -> String {
    format!("c:objc(cs){owner}(cm){selector}")
}
fn property_usr(owner: &str, name: &str) -> String {
    format!("c:objc(cs){owner}(py){name}")
}
fn ivar_usr(owner: &str, name: &str) -> String {
    format!("c:objc(cs){owner}(iv){name}")
}

#[derive(Debug, Clone)]
enum Current {
    None,
    Protocol { usr: String, name: String },
    Class { usr: String, name: String },
    Category { usr: String, owner: String, name: String },
}

pub struct SymbolGraphSink {
    document: SymbolGraphDto,
    address_to_name: HashMap<u64, String>,
    current: Current,
    in_optional: bool,
}

impl SymbolGraphSink {
    pub fn new(module_name: impl Into<String>) -> Self {
        SymbolGraphSink {
            document: SymbolGraphDto {
                metadata: MetadataDto {
                    format_version: FormatVersionDto { major: 0, minor: 6, patch: 0 },
                    generator: "machdump",
                },
                module: ModuleDto {
                    name: module_name.into(),
                    platform: PlatformDto {
                        operating_system: OperatingSystemDto { name: "darwin" },
                    },
                },
                symbols: Vec::new(),
                relationships: Vec::new(),
            },
            address_to_name: HashMap::new(),
            current: Current::None,
            in_optional: false,
        }
    }

    pub fn into_json(self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.document)
    }

    fn resolve_class_ref(&self, reference: &ClassRef) -> Option<String> {
        match reference {
            ClassRef::Local(address) => self.address_to_name.get(address).cloned(),
            ClassRef::External(_) => None,
        }
    }
}

impl Sink for SymbolGraphSink {
    fn begin(&mut self, model: &Model, _options: &Options) {
        self.address_to_name = model
            .objc
            .classes
            .iter()
            .map(|c| (c.address, c.name.clone()))
            .collect();
    }

    fn end(&mut self, _options: &Options) {
        self.current = Current::None;
    }

    fn visit_protocol(&mut self, protocol: &ObjcProtocol, _options: &Options) {
        let usr = protocol_usr(&protocol.name);
        self.document.symbols.push(symbol(
            "protocol",
            "Protocol",
            usr.clone(),
            vec![protocol.name.clone()],
            protocol.name.clone(),
        ));
        for conformed in &protocol.protocols {
            self.document.relationships.push(RelationshipDto {
                source: usr.clone(),
                target: protocol_usr(conformed),
                kind: "conformsTo",
            });
        }
        self.current = Current::Protocol {
            usr,
            name: protocol.name.clone(),
        };
        self.in_optional = false;
    }

    fn visit_class(&mut self, class: &ObjcClass, _options: &Options) {
        let usr = class_usr(&class.name);
        self.document.symbols.push(symbol(
            "class",
            "Class",
            usr.clone(),
            vec![class.name.clone()],
            class.name.clone(),
        ));
        if let Some(superclass_name) = self.resolve_class_ref(&class.superclass) {
            self.document.relationships.push(RelationshipDto {
                source: usr.clone(),
                target: class_usr(&superclass_name),
                kind: "inheritsFrom",
            });
        }
        for conformed in &class.protocols {
            self.document.relationships.push(RelationshipDto {
                source: usr.clone(),
                target: protocol_usr(conformed),
                kind: "conformsTo",
            });
        }
        self.current = Current::Class {
            usr,
            name: class.name.clone(),
        };
    }

    fn visit_category(&mut self, category: &ObjcCategory, _options: &Options) {
        let owner = self.resolve_class_ref(&category.class).unwrap_or_else(|| "Unknown".to_string());
        let usr = category_usr(&owner, &category.name);
        self.document.symbols.push(symbol(
            "class.extension",
            "Category",
            usr.clone(),
            vec![owner.clone(), category.name.clone()],
            format!("{owner} ({})", category.name),
        ));
        self.document.relationships.push(RelationshipDto {
            source: usr.clone(),
            target: class_usr(&owner),
            kind: "memberOf",
        });
        self.current = Current::Category {
            usr,
            owner,
            name: category.name.clone(),
        };
    }

    fn visit_method(&mut self, method: &ObjcMethod, kind: MethodKind, _options: &Options) {
        let (owner_usr, owner_name) = match &self.current {
            Current::Protocol { usr, name } => (usr.clone(), name.clone()),
            Current::Class { usr, name } => (usr.clone(), name.clone()),
            Current::Category { usr, owner, .. } => (usr.clone(), owner.clone()),
            Current::None => return,
        };
        let (kind_id, kind_name, usr) = match kind {
            MethodKind::Class => ("typeMethod", "Type Method", class_method_usr(&owner_name, &method.name)),
            MethodKind::Instance => ("method", "Instance Method", instance_method_usr(&owner_name, &method.name)),
        };
        self.document
            .symbols
            .push(symbol(kind_id, kind_name, usr.clone(), vec![owner_name, method.name.clone()], method.name.clone()));
        let relationship_kind = if self.in_optional { "optionalRequirementOf" } else { "requirementOf" };
        let relationship_kind = if matches!(self.current, Current::Protocol { .. }) {
            relationship_kind
        } else {
            "memberOf"
        };
        self.document.relationships.push(RelationshipDto {
            source: usr,
            target: owner_usr,
            kind: relationship_kind,
        });
    }

    fn visit_property(&mut self, property: &ObjcProperty, _options: &Options) {
        let (owner_usr, owner_name) = match &self.current {
            Current::Protocol { usr, name } => (usr.clone(), name.clone()),
            Current::Class { usr, name } => (usr.clone(), name.clone()),
            Current::Category { usr, owner, .. } => (usr.clone(), owner.clone()),
            Current::None => return,
        };
        let usr = property_usr(&owner_name, &property.name);
        self.document.symbols.push(symbol(
            "property",
            "Instance Property",
            usr.clone(),
            vec![owner_name, property.name.clone()],
            property.name.clone(),
        ));
        self.document.relationships.push(RelationshipDto {
            source: usr,
            target: owner_usr,
            kind: "memberOf",
        });
    }

    fn visit_ivar(&mut self, ivar: &ObjcIvar, _options: &Options) {
        let (owner_usr, owner_name) = match &self.current {
            Current::Class { usr, name } => (usr.clone(), name.clone()),
            _ => return,
        };
        let usr = ivar_usr(&owner_name, &ivar.name);
        self.document
            .symbols
            .push(symbol("ivar", "Instance Variable", usr.clone(), vec![owner_name, ivar.name.clone()], ivar.name.clone()));
        self.document.relationships.push(RelationshipDto {
            source: usr,
            target: owner_usr,
            kind: "memberOf",
        });
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
    fn builds_class_symbol_with_usr() {
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
        let mut sink = SymbolGraphSink::new("Demo");
        visit(&model, &mut sink, &options).unwrap();
        let json = sink.into_json().unwrap();
        assert!(json.contains("c:objc(cs)Greeter"));
        assert!(json.contains("\"formatVersion\""));
    }
}
