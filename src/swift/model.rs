//! Swift type/field/conformance record shapes (§3 "Swift type descriptor/field descriptor/
//! conformance", §4.5).

use super::flags::{TypeContextKind, TypeReferenceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericRequirementKind {
    Protocol,
    SameType,
    BaseClass,
    SameConformance,
    Layout,
    Unknown(u8),
}

#[derive(Debug, Clone)]
pub struct GenericRequirement {
    pub kind: GenericRequirementKind,
    /// The generic parameter this requirement constrains, e.g. `T` (§4.5 "Generic parameter
    /// names").
    pub param: String,
    /// The protocol, base class, or same-type target name, when the requirement kind carries one.
    pub target: Option<String>,
}

/// One resolved Swift nominal type, reached through `__swift5_types` or `__swift5_protos`
/// (§4.5, §3 "Swift type descriptor").
#[derive(Debug, Clone)]
pub struct SwiftTypeDescriptor {
    pub address: u64,
    pub kind: TypeContextKind,
    pub name: String,
    /// Module or enclosing-type name, when resolvable (§3 "parent chain").
    pub parent: Option<String>,
    pub is_generic: bool,
    pub is_unique: bool,
    pub generic_param_count: u32,
    pub generic_param_names: Vec<String>,
    pub generic_requirements: Vec<GenericRequirement>,
    pub superclass: Option<String>,
    pub num_fields: u32,
    pub field_descriptor_address: Option<u64>,
}

/// One field of a Swift type, as recovered from its field descriptor (§4.5 "Field descriptor").
#[derive(Debug, Clone)]
pub struct SwiftField {
    pub name: String,
    pub mangled_type: String,
    /// `mangled_type`, run through the symbolic-reference resolver and demangler (§4.5, §4.8).
    pub demangled_type: String,
}

#[derive(Debug, Clone)]
pub struct SwiftFieldDescriptor {
    pub parent_type_address: Option<u64>,
    pub fields: Vec<SwiftField>,
}

/// A protocol-conformance record from `__swift5_proto` (§3 "Swift conformance").
#[derive(Debug, Clone)]
pub struct SwiftConformance {
    pub conformer_address: Option<u64>,
    pub conformer_name: String,
    pub protocol_name: String,
    pub type_reference_kind: TypeReferenceKind,
    pub is_retroactive: bool,
    pub num_conditional_requirements: u32,
}

/// The full result of `process_swift` (§6): every type, field set, and conformance recovered
/// from one image's Swift metadata sections, sorted by address (§8 invariant 8).
#[derive(Debug, Clone, Default)]
pub struct SwiftModel {
    pub types: Vec<SwiftTypeDescriptor>,
    pub fields: Vec<SwiftFieldDescriptor>,
    pub conformances: Vec<SwiftConformance>,
}

impl SwiftModel {
    /// The type descriptor matching `address`, if one was loaded — used by field↔ivar binding
    /// (§4.5) to find the Swift counterpart of an ObjC class flagged `isSwift`.
    pub fn type_at(&self, address: u64) -> Option<&SwiftTypeDescriptor> {
        self.types.iter().find(|t| t.address == address)
    }

    pub fn type_named(&self, name: &str) -> Option<&SwiftTypeDescriptor> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn fields_for(&self, type_address: u64) -> Option<&SwiftFieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.parent_type_address == Some(type_address))
    }
}
