//! Pointer resolution and per-record parsing for ObjC-2 metadata (§4.4).
//!
//! Every pointer-sized field in these records (a class's superclass, a method list's selector, a
//! property's name) is either a plain rebase — read the vmaddr straight off the page and
//! translate it to a file offset — or, under chained fixups, a bind to a symbol named in another
//! image. `read_pointer` is the single place that tells the two apart.

use crate::command::dyld_chained_fixup::ChainedFixups;
use crate::cursor::{c_string_at, Cursor};
use crate::diagnostic::Diagnostic;
use crate::encoding::parse_property_attributes;
use crate::error::{Error, Result};
use crate::macho::MachO;

use super::flags::{
    ObjCImageInfoFlags, CLASS_DATA_FAST_IS_SWIFT_LEGACY, CLASS_DATA_FAST_IS_SWIFT_STABLE,
    CLASS_DATA_FAST_MASK, METHOD_LIST_SIZE_MASK, SWIFT_STABLE_VERSION_MASK,
    SWIFT_UNSTABLE_VERSION_MASK,
};
use super::model::{
    ClassRef, ImageInfo, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcProperty, ObjcProtocol,
    PointerValue,
};

const SMALL_METHOD_LIST_FLAG: u32 = 0x8000_0000;

/// Reads the pointer-sized value at `file_offset` and classifies it as a rebase (resolved to a
/// file offset in this image) or a bind (an external symbol name), per §4.3's decode-at-address
/// contract. Falls back to a raw little-endian read, treated as a rebase vmaddr, when the image
/// carries no `LC_DYLD_CHAINED_FIXUPS` command (§9 "no chained fixups present").
pub fn read_pointer(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
) -> Result<PointerValue> {
    if let Some(fixups) = chained {
        if let Some(format) = fixups.format_containing(file_offset) {
            let decoded = fixups.decode_at(file_offset, format)?;
            let fixup = decoded.fixup;
            if fixup.clone().is_bind() {
                let name = fixup
                    .clone()
                    .bind_symbol_name()
                    .ok_or(Error::ChainedFixupsInvalidFormat)?;
                return Ok(PointerValue::Bind(strip_objc_class_prefix(&name)));
            }
            if fixup.clone().is_rebase() {
                if let Some(vmaddr) = fixup.clone().rebase_base_vm_addr(&macho.load_commands) {
                    return Ok(PointerValue::Rebase(vmaddr));
                }
            }
        }
    }

    let bytes = macho
        .buffer()
        .get(file_offset as usize..file_offset as usize + 8)
        .ok_or(Error::ReadOutOfBounds {
            offset: file_offset as usize,
            length: 8,
            size: macho.buffer().len(),
        })?;
    let raw = u64::from_le_bytes(bytes.try_into().unwrap());
    Ok(PointerValue::Rebase(raw))
}

/// Strips the `_OBJC_CLASS_$_`/`_OBJC_METACLASS_$_` decoration dyld leaves on a bound class
/// symbol, leaving the bare Objective-C class name (§4.4 "external class resolution").
fn strip_objc_class_prefix(name: &str) -> String {
    name.strip_prefix("_OBJC_CLASS_$_")
        .or_else(|| name.strip_prefix("_OBJC_METACLASS_$_"))
        .unwrap_or(name)
        .to_string()
}

/// Translates a vmaddr to a file offset, recording a diagnostic and returning `None` when the
/// address isn't covered by any section rather than aborting the whole record (§4.4 failure
/// semantics: a malformed pointer is per-record recoverable).
fn translate_or_diagnose(
    macho: &MachO,
    vmaddr: u64,
    component: &'static str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<u64> {
    let translator = macho.address_translator();
    let offset = translator.translate(vmaddr);
    if offset.is_none() {
        diagnostics.push(
            Diagnostic::recoverable(
                component,
                format!("address {vmaddr:#x} is not covered by any section"),
            )
            .at(vmaddr),
        );
    }
    offset
}

fn read_pointer_field_as_ref(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ClassRef> {
    match read_pointer(macho, chained, file_offset) {
        Ok(PointerValue::Bind(name)) => Some(ClassRef::External(name)),
        Ok(PointerValue::Rebase(vmaddr)) if vmaddr == 0 => None,
        Ok(PointerValue::Rebase(vmaddr)) => Some(ClassRef::Local(vmaddr)),
        Err(err) => {
            diagnostics.push(Diagnostic::recoverable("objc", err.to_string()));
            None
        }
    }
}

/// Reads a C string through a pointer field: resolves the pointer, translates it to a file
/// offset, and reads a NUL-terminated string from there.
fn read_string_pointer(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = read_pointer(macho, chained, file_offset).ok()?;
    let vmaddr = match value {
        PointerValue::Bind(name) => return Some(name),
        PointerValue::Rebase(vmaddr) => vmaddr,
    };
    if vmaddr == 0 {
        return None;
    }
    let offset = translate_or_diagnose(macho, vmaddr, "objc", diagnostics)?;
    match c_string_at(macho.buffer(), offset as usize) {
        Ok(s) => Some(s.to_string()),
        Err(err) => {
            diagnostics.push(Diagnostic::recoverable("objc", err.to_string()).at(vmaddr));
            None
        }
    }
}

/// Collects a null-terminated... no, a fixed-`count`-entries pointer list such as
/// `__objc_classlist`/`__objc_catlist`/`__objc_protolist`: each entry is one pointer-sized vmaddr.
pub fn collect_pointer_list(section_bytes: &[u8]) -> Vec<u64> {
    section_bytes
        .chunks_exact(8)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

struct SmallMethodEntry {
    name_offset: i32,
    types_offset: i32,
    imp_offset: i32,
}

struct BigMethodEntry {
    name_ptr: u64,
    types_ptr: u64,
    imp_ptr: u64,
}

/// Parses a method list at `file_offset`, handling both the relative/"small" layout (entries are
/// `i32` offsets from their own field, selected by the `SMALL_METHOD_LIST` flag bit) and the
/// pointer-sized/"normal" layout (§4.4 "Method list").
fn read_method_list(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ObjcMethod> {
    let mut methods = Vec::new();
    let buf = macho.buffer();
    let mut cursor = match Cursor::at(buf, file_offset as usize) {
        Ok(c) => c,
        Err(err) => {
            diagnostics.push(Diagnostic::recoverable("objc", err.to_string()).at(file_offset));
            return methods;
        }
    };

    let entsize_and_flags = match cursor.read_u32_le() {
        Ok(v) => v,
        Err(_) => return methods,
    };
    let count = match cursor.read_u32_le() {
        Ok(v) => v,
        Err(_) => return methods,
    };
    let is_small = entsize_and_flags & SMALL_METHOD_LIST_FLAG != 0;
    let entry_size = (entsize_and_flags & METHOD_LIST_SIZE_MASK) as u64;
    let entry_size = if entry_size == 0 {
        if is_small { 12 } else { 24 }
    } else {
        entry_size
    };

    let first_entry_offset = file_offset + 8;

    for i in 0..count as u64 {
        let entry_offset = first_entry_offset + i * entry_size;
        let parsed = if is_small {
            read_small_method_entry(buf, entry_offset).map(|e| {
                let name_addr = (entry_offset as i64 + e.name_offset as i64) as u64;
                let types_addr = (entry_offset as i64 + 4 + e.types_offset as i64) as u64;
                let imp_addr = (entry_offset as i64 + 8 + e.imp_offset as i64) as u64;
                (
                    read_string_pointer(macho, chained, name_addr, diagnostics),
                    read_string_pointer(macho, chained, types_addr, diagnostics),
                    translate_or_diagnose(macho, imp_addr, "objc", diagnostics),
                )
            })
        } else {
            read_big_method_entry(buf, entry_offset).map(|e| {
                let name = resolve_relative_or_absolute_string(
                    macho, chained, e.name_ptr, diagnostics,
                );
                let types = resolve_relative_or_absolute_string(
                    macho, chained, e.types_ptr, diagnostics,
                );
                let imp = if e.imp_ptr == 0 {
                    None
                } else {
                    translate_or_diagnose(macho, e.imp_ptr, "objc", diagnostics)
                };
                (name, types, imp)
            })
        };

        match parsed {
            Some((Some(name), Some(type_encoding), implementation)) => {
                methods.push(ObjcMethod {
                    name,
                    type_encoding,
                    implementation,
                });
            }
            Some(_) => diagnostics.push(
                Diagnostic::recoverable(
                    "objc",
                    "method list entry missing a name or type encoding",
                )
                .at(entry_offset),
            ),
            None => diagnostics.push(
                Diagnostic::recoverable("objc", "truncated method list entry").at(entry_offset),
            ),
        }
    }

    methods
}

/// For the "normal" (pointer-sized) method list layout, a selector's name field is already a
/// resolved C string pointer in non-small images; treated the same as any other string pointer.
fn resolve_relative_or_absolute_string(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    vmaddr_or_ptr_field_addr: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    if vmaddr_or_ptr_field_addr == 0 {
        return None;
    }
    let offset = translate_or_diagnose(macho, vmaddr_or_ptr_field_addr, "objc", diagnostics)?;
    match c_string_at(macho.buffer(), offset as usize) {
        Ok(s) => Some(s.to_string()),
        Err(_) => read_string_pointer(macho, chained, vmaddr_or_ptr_field_addr, diagnostics),
    }
}

fn read_small_method_entry(buf: &[u8], offset: u64) -> Option<SmallMethodEntry> {
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;
    Some(SmallMethodEntry {
        name_offset: cursor.read_i32_le().ok()?,
        types_offset: cursor.read_i32_le().ok()?,
        imp_offset: cursor.read_i32_le().ok()?,
    })
}

fn read_big_method_entry(buf: &[u8], offset: u64) -> Option<BigMethodEntry> {
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;
    Some(BigMethodEntry {
        name_ptr: cursor.read_u64_le().ok()?,
        types_ptr: cursor.read_u64_le().ok()?,
        imp_ptr: cursor.read_u64_le().ok()?,
    })
}

/// Parses an ivar list: `(entsize_and_flags, count)` header, then `count` records of
/// `(offset_ptr, name_ptr, type_ptr, alignment, size)` (§4.4 "Ivar list").
fn read_ivar_list(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ObjcIvar> {
    let mut ivars = Vec::new();
    let buf = macho.buffer();
    let mut cursor = match Cursor::at(buf, file_offset as usize) {
        Ok(c) => c,
        Err(_) => return ivars,
    };
    let entsize = match cursor.read_u32_le() {
        Ok(v) => v as u64,
        Err(_) => return ivars,
    };
    let count = match cursor.read_u32_le() {
        Ok(v) => v,
        Err(_) => return ivars,
    };
    let entry_size = if entsize == 0 { 32 } else { entsize };
    let first_entry_offset = file_offset + 8;

    for i in 0..count as u64 {
        let entry_offset = first_entry_offset + i * entry_size;
        let mut cursor = match Cursor::at(buf, entry_offset as usize) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let (offset_ptr, name_ptr, type_ptr, alignment, size) = match (
            cursor.read_u64_le(),
            cursor.read_u64_le(),
            cursor.read_u64_le(),
            cursor.read_u32_le(),
            cursor.read_u32_le(),
        ) {
            (Ok(a), Ok(b), Ok(c), Ok(d), Ok(e)) => (a, b, c, d, e),
            _ => continue,
        };

        let name = read_string_pointer(macho, chained, name_ptr, diagnostics);
        let type_encoding = read_string_pointer(macho, chained, type_ptr, diagnostics);
        let offset = translate_or_diagnose(macho, offset_ptr, "objc", diagnostics)
            .and_then(|file_off| {
                let mut c = Cursor::at(buf, file_off as usize).ok()?;
                c.read_u32_le().ok()
            })
            .unwrap_or(0) as u64;

        match (name, type_encoding) {
            (Some(name), Some(type_encoding)) => ivars.push(ObjcIvar {
                name,
                type_encoding,
                offset,
                alignment,
                size,
            }),
            _ => diagnostics.push(
                Diagnostic::recoverable("objc", "ivar entry missing a name or type encoding")
                    .at(entry_offset),
            ),
        }
    }

    ivars
}

/// Parses a property list: `(entsize_and_flags, count)` header, then `count` records of
/// `(name_ptr, attributes_ptr)` (§4.4 "Property list", §4.7 for the attribute grammar).
fn read_property_list(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ObjcProperty> {
    let mut properties = Vec::new();
    let buf = macho.buffer();
    let mut cursor = match Cursor::at(buf, file_offset as usize) {
        Ok(c) => c,
        Err(_) => return properties,
    };
    let entsize = match cursor.read_u32_le() {
        Ok(v) => v as u64,
        Err(_) => return properties,
    };
    let count = match cursor.read_u32_le() {
        Ok(v) => v,
        Err(_) => return properties,
    };
    let entry_size = if entsize == 0 { 16 } else { entsize };
    let first_entry_offset = file_offset + 8;

    for i in 0..count as u64 {
        let entry_offset = first_entry_offset + i * entry_size;
        let mut cursor = match Cursor::at(buf, entry_offset as usize) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let (name_ptr, attrs_ptr) = match (cursor.read_u64_le(), cursor.read_u64_le()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => continue,
        };

        let name = read_string_pointer(macho, chained, name_ptr, diagnostics);
        let raw_attributes =
            read_string_pointer(macho, chained, attrs_ptr, diagnostics).unwrap_or_default();

        if let Some(name) = name {
            let mut attr_diagnostics = Vec::new();
            let attributes = parse_property_attributes(&raw_attributes, &mut attr_diagnostics);
            diagnostics.extend(attr_diagnostics);
            properties.push(ObjcProperty {
                name,
                raw_attributes,
                attributes,
            });
        }
    }

    properties
}

/// Parses a `class_ro_t` at `file_offset` into a partial class record: name, method/ivar/
/// property lists, and protocol-conformance addresses (§4.4 "`class_ro_t` layout").
struct ClassRoData {
    name: Option<String>,
    methods: Vec<ObjcMethod>,
    properties: Vec<ObjcProperty>,
    ivars: Vec<ObjcIvar>,
    protocols: Vec<String>,
}

fn read_class_ro(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ClassRoData> {
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, file_offset as usize).ok()?;

    let _flags = cursor.read_u32_le().ok()?;
    let _instance_start = cursor.read_u32_le().ok()?;
    let _instance_size = cursor.read_u32_le().ok()?;
    let _reserved = cursor.read_u32_le().ok()?;
    let _ivar_layout_ptr = cursor.read_u64_le().ok()?;
    let name_ptr = cursor.read_u64_le().ok()?;
    let base_methods_ptr = cursor.read_u64_le().ok()?;
    let base_protocols_ptr = cursor.read_u64_le().ok()?;
    let ivars_ptr = cursor.read_u64_le().ok()?;
    let _weak_ivar_layout_ptr = cursor.read_u64_le().ok()?;
    let base_properties_ptr = cursor.read_u64_le().ok()?;

    let name = read_string_pointer(macho, chained, name_ptr, diagnostics);

    let methods = resolve_list(macho, chained, base_methods_ptr, diagnostics, read_method_list)
        .unwrap_or_default();
    let properties = resolve_list(
        macho,
        chained,
        base_properties_ptr,
        diagnostics,
        read_property_list,
    )
    .unwrap_or_default();
    let ivars =
        resolve_list(macho, chained, ivars_ptr, diagnostics, read_ivar_list).unwrap_or_default();
    let protocols = read_protocol_ref_list(macho, chained, base_protocols_ptr, diagnostics);

    Some(ClassRoData {
        name,
        methods,
        properties,
        ivars,
        protocols,
    })
}

/// Resolves a pointer field that points at a list (method/property/ivar list) to its file offset,
/// then delegates to `reader`. Returns `None` for a null pointer, which means "no list".
fn resolve_list<T>(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    ptr_field_vmaddr: u64,
    diagnostics: &mut Vec<Diagnostic>,
    reader: impl Fn(&MachO, Option<&ChainedFixups>, u64, &mut Vec<Diagnostic>) -> Vec<T>,
) -> Option<Vec<T>> {
    if ptr_field_vmaddr == 0 {
        return None;
    }
    let offset = translate_or_diagnose(macho, ptr_field_vmaddr, "objc", diagnostics)?;
    Some(reader(macho, chained, offset, diagnostics))
}

/// A protocol list is a length-prefixed array of pointer-sized protocol addresses (no per-entry
/// header, unlike method/ivar/property lists).
fn read_protocol_ref_list(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    ptr_field_vmaddr: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    if ptr_field_vmaddr == 0 {
        return Vec::new();
    }
    let Some(offset) = translate_or_diagnose(macho, ptr_field_vmaddr, "objc", diagnostics) else {
        return Vec::new();
    };
    let buf = macho.buffer();
    let Ok(mut cursor) = Cursor::at(buf, offset as usize) else {
        return Vec::new();
    };
    let Ok(count) = cursor.read_u64_le() else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for _ in 0..count {
        let Ok(entry_ptr) = cursor.read_u64_le() else {
            break;
        };
        if entry_ptr == 0 {
            continue;
        }
        if let Some(name) = read_protocol_name(macho, chained, entry_ptr, diagnostics) {
            names.push(name);
        }
    }
    names
}

fn read_protocol_name(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    protocol_vmaddr: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let offset = translate_or_diagnose(macho, protocol_vmaddr, "objc", diagnostics)?;
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;
    let _isa = cursor.read_u64_le().ok()?;
    let name_ptr = cursor.read_u64_le().ok()?;
    read_string_pointer(macho, chained, name_ptr, diagnostics)
}

/// Parses the full `class_t` record at `address` (§4.4 "Class record (64-bit layout)"): ISA,
/// superclass, cache, vtable, and data pointers, where `data`'s low two bits carry the Swift ABI
/// generation flags and must be masked off before following it to `class_ro_t`.
pub fn read_class(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    address: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ObjcClass> {
    let offset = translate_or_diagnose(macho, address, "objc", diagnostics)?;
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;

    let _isa = cursor.read_u64_le().ok()?;
    let superclass_field_addr = offset + 8;
    let _cache_ptr = cursor.read_u64_le().ok()?;
    let _vtable_ptr = cursor.read_u64_le().ok()?;
    let data_raw = cursor.read_u64_le().ok()?;

    let is_swift_stable = data_raw & CLASS_DATA_FAST_IS_SWIFT_STABLE != 0;
    let is_swift_legacy = data_raw & CLASS_DATA_FAST_IS_SWIFT_LEGACY != 0;
    let data_vmaddr = data_raw & CLASS_DATA_FAST_MASK;

    let ro = translate_or_diagnose(macho, data_vmaddr, "objc", diagnostics)
        .and_then(|ro_offset| read_class_ro(macho, chained, ro_offset, diagnostics));

    let superclass = read_pointer_field_as_ref(macho, chained, superclass_field_addr, diagnostics)
        .unwrap_or(ClassRef::Local(0));

    let ro = ro?;
    Some(ObjcClass {
        address,
        name: ro.name.unwrap_or_default(),
        superclass,
        is_swift_stable,
        is_swift_legacy,
        instance_methods: ro.methods,
        class_methods: Vec::new(),
        properties: ro.properties,
        ivars: ro.ivars,
        protocols: ro.protocols,
    })
}

/// Merges a class's metaclass (reached through the ISA pointer, re-read independently) to pick up
/// class-side methods, which live on the metaclass's `class_ro_t` rather than the class's own
/// (§4.4 "class methods live on the metaclass").
pub fn attach_class_methods(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    class: &mut ObjcClass,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(offset) = translate_or_diagnose(macho, class.address, "objc", diagnostics) else {
        return;
    };
    let buf = macho.buffer();
    let Ok(mut cursor) = Cursor::at(buf, offset as usize) else {
        return;
    };
    let Ok(isa_raw) = cursor.read_u64_le() else {
        return;
    };
    if isa_raw == 0 {
        return;
    }
    let Some(metaclass_offset) = translate_or_diagnose(macho, isa_raw, "objc", diagnostics) else {
        return;
    };
    let Ok(mut meta_cursor) = Cursor::at(buf, metaclass_offset as usize) else {
        return;
    };
    let _isa = meta_cursor.read_u64_le();
    let _superclass = meta_cursor.read_u64_le();
    let _cache = meta_cursor.read_u64_le();
    let Ok(data_raw) = meta_cursor.read_u64_le() else {
        return;
    };
    let data_vmaddr = data_raw & CLASS_DATA_FAST_MASK;
    if let Some(ro_offset) = translate_or_diagnose(macho, data_vmaddr, "objc", diagnostics) {
        if let Some(ro) = read_class_ro(macho, chained, ro_offset, diagnostics) {
            class.class_methods = ro.methods;
        }
    }
}

/// Parses an `__objc_catlist` entry at `address` (§4.4 "Category").
pub fn read_category(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    address: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ObjcCategory> {
    let offset = translate_or_diagnose(macho, address, "objc", diagnostics)?;
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;

    let name_ptr = cursor.read_u64_le().ok()?;
    let class_field_addr = offset + 8;
    let _class_ptr = cursor.read_u64_le().ok()?;
    let instance_methods_ptr = cursor.read_u64_le().ok()?;
    let class_methods_ptr = cursor.read_u64_le().ok()?;
    let protocols_ptr = cursor.read_u64_le().ok()?;
    let properties_ptr = cursor.read_u64_le().ok()?;

    let name = read_string_pointer(macho, chained, name_ptr, diagnostics).unwrap_or_default();
    let class = read_pointer_field_as_ref(macho, chained, class_field_addr, diagnostics)
        .unwrap_or(ClassRef::Local(0));
    let instance_methods =
        resolve_list(macho, chained, instance_methods_ptr, diagnostics, read_method_list)
            .unwrap_or_default();
    let class_methods =
        resolve_list(macho, chained, class_methods_ptr, diagnostics, read_method_list)
            .unwrap_or_default();
    let properties =
        resolve_list(macho, chained, properties_ptr, diagnostics, read_property_list)
            .unwrap_or_default();
    let protocols = read_protocol_ref_list(macho, chained, protocols_ptr, diagnostics);

    Some(ObjcCategory {
        name,
        class,
        instance_methods,
        class_methods,
        properties,
        protocols,
    })
}

/// Parses a `protocol_t` record at `address` (§4.4 "Protocol"): required and optional method
/// lists are stored as separate list pointers rather than one list with a flag bit.
pub fn read_protocol(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    address: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ObjcProtocol> {
    let offset = translate_or_diagnose(macho, address, "objc", diagnostics)?;
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, offset as usize).ok()?;

    let _isa = cursor.read_u64_le().ok()?;
    let name_ptr = cursor.read_u64_le().ok()?;
    let protocols_ptr = cursor.read_u64_le().ok()?;
    let instance_methods_ptr = cursor.read_u64_le().ok()?;
    let class_methods_ptr = cursor.read_u64_le().ok()?;
    let optional_instance_methods_ptr = cursor.read_u64_le().ok()?;
    let optional_class_methods_ptr = cursor.read_u64_le().ok()?;
    let properties_ptr = cursor.read_u64_le().ok()?;

    let name = read_string_pointer(macho, chained, name_ptr, diagnostics).unwrap_or_default();
    let protocols = read_protocol_ref_list(macho, chained, protocols_ptr, diagnostics);
    let instance_methods =
        resolve_list(macho, chained, instance_methods_ptr, diagnostics, read_method_list)
            .unwrap_or_default();
    let class_methods =
        resolve_list(macho, chained, class_methods_ptr, diagnostics, read_method_list)
            .unwrap_or_default();
    let optional_instance_methods = resolve_list(
        macho,
        chained,
        optional_instance_methods_ptr,
        diagnostics,
        read_method_list,
    )
    .unwrap_or_default();
    let optional_class_methods = resolve_list(
        macho,
        chained,
        optional_class_methods_ptr,
        diagnostics,
        read_method_list,
    )
    .unwrap_or_default();
    let properties =
        resolve_list(macho, chained, properties_ptr, diagnostics, read_property_list)
            .unwrap_or_default();

    Some(ObjcProtocol {
        address,
        name,
        protocols,
        instance_methods,
        class_methods,
        optional_instance_methods,
        optional_class_methods,
        properties,
    })
}

/// Parses `__objc_imageinfo`: a `(version: u32, flags: u32)` pair, with the Swift ABI generation
/// packed into two byte-wide sub-fields of `flags` (§4.4 "Image info").
pub fn read_image_info(section_bytes: &[u8]) -> Option<ImageInfo> {
    if section_bytes.len() < 8 {
        return None;
    }
    let version = u32::from_le_bytes(section_bytes[0..4].try_into().ok()?);
    let raw_flags = u32::from_le_bytes(section_bytes[4..8].try_into().ok()?);
    Some(ImageInfo {
        version,
        flags: ObjCImageInfoFlags::from_bits_truncate(raw_flags),
        swift_stable_version: ((raw_flags & SWIFT_STABLE_VERSION_MASK) >> 16) as u8,
        swift_unstable_version: ((raw_flags & SWIFT_UNSTABLE_VERSION_MASK) >> 8) as u8,
    })
}
