//! Bit layout of a type context descriptor's `flags` word (§4.5 "Type context descriptor").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeContextKind {
    Module,
    Extension,
    Anonymous,
    Protocol,
    OpaqueType,
    Class,
    Struct,
    Enum,
    Unknown(u8),
}

impl TypeContextKind {
    fn from_raw(value: u8) -> Self {
        match value {
            0 => TypeContextKind::Module,
            1 => TypeContextKind::Extension,
            2 => TypeContextKind::Anonymous,
            3 => TypeContextKind::Protocol,
            4 => TypeContextKind::OpaqueType,
            16 => TypeContextKind::Class,
            17 => TypeContextKind::Struct,
            18 => TypeContextKind::Enum,
            other => TypeContextKind::Unknown(other),
        }
    }
}

const KIND_MASK: u32 = 0x1f;
const IS_GENERIC: u32 = 1 << 7;
const IS_UNIQUE: u32 = 1 << 6;
const METADATA_INIT_SHIFT: u32 = 8;
const METADATA_INIT_MASK: u32 = 0x3 << METADATA_INIT_SHIFT;
const HAS_RESILIENT_SUPERCLASS: u32 = 1 << 13;
const HAS_OVERRIDE_TABLE: u32 = 1 << 14;
const HAS_VTABLE: u32 = 1 << 15;

/// The raw `flags` word shared by every type context descriptor, decoded lazily per-accessor
/// rather than as a `bitflags!` set, since several sub-fields are multi-bit values rather than
/// independent booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeContextDescriptorFlags(pub u32);

impl TypeContextDescriptorFlags {
    pub fn kind(self) -> TypeContextKind {
        TypeContextKind::from_raw((self.0 & KIND_MASK) as u8)
    }

    pub fn is_generic(self) -> bool {
        self.0 & IS_GENERIC != 0
    }

    pub fn is_unique(self) -> bool {
        self.0 & IS_UNIQUE != 0
    }

    pub fn metadata_init_kind(self) -> u32 {
        (self.0 & METADATA_INIT_MASK) >> METADATA_INIT_SHIFT
    }

    pub fn has_resilient_superclass(self) -> bool {
        self.0 & HAS_RESILIENT_SUPERCLASS != 0
    }

    pub fn has_override_table(self) -> bool {
        self.0 & HAS_OVERRIDE_TABLE != 0
    }

    pub fn has_vtable(self) -> bool {
        self.0 & HAS_VTABLE != 0
    }
}

/// `ConformanceFlags.typeReferenceKind` (§4.5 "Conformance descriptor"): how `type_ref` should be
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeReferenceKind {
    DirectTypeDescriptor,
    IndirectTypeDescriptor,
    DirectObjCClass,
    IndirectObjCClass,
}

const TYPE_REFERENCE_KIND_SHIFT: u32 = 3;
const TYPE_REFERENCE_KIND_MASK: u32 = 0x7 << TYPE_REFERENCE_KIND_SHIFT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformanceFlags(pub u32);

impl ConformanceFlags {
    pub fn type_reference_kind(self) -> TypeReferenceKind {
        match (self.0 & TYPE_REFERENCE_KIND_MASK) >> TYPE_REFERENCE_KIND_SHIFT {
            0 => TypeReferenceKind::DirectTypeDescriptor,
            1 => TypeReferenceKind::IndirectTypeDescriptor,
            2 => TypeReferenceKind::DirectObjCClass,
            3 => TypeReferenceKind::IndirectObjCClass,
            _ => TypeReferenceKind::DirectTypeDescriptor,
        }
    }

    pub fn is_retroactive(self) -> bool {
        self.0 & 0x1 != 0
    }

    pub fn num_conditional_requirements(self) -> u32 {
        (self.0 >> 8) & 0xff
    }
}
