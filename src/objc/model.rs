//! ObjC-2 metadata record shapes (§3 "ObjC class/method/ivar/property/protocol/category", §4.4).

use crate::encoding::PropertyAttributes;

use super::flags::ObjCImageInfoFlags;

/// A pointer that turned out to be a bind (external symbol, e.g. a superclass in another image)
/// or a rebase (an address local to this image), decoded via `crate::command::dyld_chained_fixup`
/// when chained fixups are present, or a raw little-endian read otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerValue {
    Rebase(u64),
    Bind(String),
}

/// A class, category, or protocol reference that may point at a record in this image or name one
/// in another (§3 "superclass reference (may be a bind ordinal or an internal address)").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassRef {
    Local(u64),
    External(String),
}

#[derive(Debug, Clone)]
pub struct ObjcMethod {
    pub name: String,
    pub type_encoding: String,
    pub implementation: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ObjcIvar {
    pub name: String,
    pub type_encoding: String,
    pub offset: u64,
    pub alignment: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct ObjcProperty {
    pub name: String,
    pub raw_attributes: String,
    pub attributes: PropertyAttributes,
}

#[derive(Debug, Clone)]
pub struct ObjcClass {
    pub address: u64,
    pub name: String,
    pub superclass: ClassRef,
    pub is_swift_stable: bool,
    pub is_swift_legacy: bool,
    pub instance_methods: Vec<ObjcMethod>,
    pub class_methods: Vec<ObjcMethod>,
    pub properties: Vec<ObjcProperty>,
    pub ivars: Vec<ObjcIvar>,
    pub protocols: Vec<String>,
}

impl ObjcClass {
    pub fn is_swift(&self) -> bool {
        self.is_swift_stable || self.is_swift_legacy
    }
}

#[derive(Debug, Clone)]
pub struct ObjcCategory {
    pub name: String,
    pub class: ClassRef,
    pub instance_methods: Vec<ObjcMethod>,
    pub class_methods: Vec<ObjcMethod>,
    pub properties: Vec<ObjcProperty>,
    pub protocols: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObjcProtocol {
    pub address: u64,
    pub name: String,
    pub protocols: Vec<String>,
    pub instance_methods: Vec<ObjcMethod>,
    pub class_methods: Vec<ObjcMethod>,
    pub optional_instance_methods: Vec<ObjcMethod>,
    pub optional_class_methods: Vec<ObjcMethod>,
    pub properties: Vec<ObjcProperty>,
}

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub version: u32,
    pub flags: ObjCImageInfoFlags,
    pub swift_stable_version: u8,
    pub swift_unstable_version: u8,
}

/// The full result of `process_objc` (§6): everything the runtime metadata recovered from one
/// Mach-O image, sorted by address (§8 invariant 8 — task completion order is not observable).
#[derive(Debug, Clone, Default)]
pub struct ObjcModel {
    pub classes: Vec<ObjcClass>,
    pub categories: Vec<ObjcCategory>,
    pub protocols: Vec<ObjcProtocol>,
    pub image_info: Option<ImageInfo>,
}
