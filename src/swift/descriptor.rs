//! Parses type context, field, and conformance descriptors out of `__swift5_types`,
//! `__swift5_fieldmd`, and `__swift5_proto`/`__swift5_protos` (§3, §4.5).
//!
//! Every relative reference in these records is a 4-byte offset from its own field address; since
//! Swift metadata for one image is laid out contiguously within a single segment, resolving one is
//! the same file-offset arithmetic `objc::loader` already uses for small method lists: add the raw
//! `i32` to the field's own file offset.

use crate::command::dyld_chained_fixup::ChainedFixups;
use crate::context::ProcessingContext;
use crate::cursor::{c_string_at, Cursor};
use crate::demangle::OutputStyle;
use crate::diagnostic::Diagnostic;
use crate::macho::MachO;
use crate::objc::loader::read_pointer;
use crate::objc::PointerValue;

use super::flags::{ConformanceFlags, TypeContextDescriptorFlags, TypeContextKind, TypeReferenceKind};
use super::model::{
    GenericRequirement, GenericRequirementKind, SwiftConformance, SwiftField, SwiftFieldDescriptor,
    SwiftTypeDescriptor,
};
use super::symbolic::resolve_mangled_name;

/// Reads the raw `i32` at the cursor's current position and resolves it against that same
/// position, per the relative-pointer convention every Swift descriptor field shares.
fn read_relative(cursor: &mut Cursor) -> Option<u64> {
    let field_offset = cursor.position() as i64;
    let raw = cursor.read_i32_le().ok()?;
    if raw == 0 {
        None
    } else {
        Some((field_offset + raw as i64) as u64)
    }
}

/// A shallow read of just `flags`/`parent`/`name`, used to name a type reached only as someone
/// else's parent or superclass reference, without parsing its full kind-specific tail.
pub fn peek_type_name(buf: &[u8], file_offset: u64) -> Option<String> {
    let mut cursor = Cursor::at(buf, file_offset as usize).ok()?;
    let _flags = cursor.read_u32_le().ok()?;
    let _parent = read_relative(&mut cursor);
    let name_target = read_relative(&mut cursor)?;
    c_string_at(buf, name_target as usize).ok().map(String::from)
}

fn generic_param_name(index: usize) -> String {
    const LETTERS: [&str; 4] = ["T", "U", "V", "W"];
    match LETTERS.get(index) {
        Some(letter) => letter.to_string(),
        None => format!("T{}", index - LETTERS.len() + 5),
    }
}

fn requirement_kind_from_raw(value: u32) -> GenericRequirementKind {
    match value & 0x1f {
        0 => GenericRequirementKind::Protocol,
        1 => GenericRequirementKind::SameType,
        2 => GenericRequirementKind::BaseClass,
        3 => GenericRequirementKind::SameConformance,
        0x1f => GenericRequirementKind::Layout,
        other => GenericRequirementKind::Unknown(other as u8),
    }
}

/// Parses the generic-context header and trailing parameter/requirement arrays that follow a
/// generic type's kind-specific fixed fields (§4.5 "Generic context descriptor").
fn read_generic_section(
    buf: &[u8],
    cursor: &mut Cursor,
    diagnostics: &mut Vec<Diagnostic>,
) -> (u32, Vec<String>, Vec<GenericRequirement>) {
    let num_params = match cursor.read_u16_le() {
        Ok(v) => v as u32,
        Err(_) => return (0, Vec::new(), Vec::new()),
    };
    let num_requirements = cursor.read_u16_le().unwrap_or(0) as u32;
    let _num_key_arguments = cursor.read_u16_le().unwrap_or(0);
    let _padding = cursor.read_u16_le().unwrap_or(0);

    let mut names = Vec::with_capacity(num_params as usize);
    for i in 0..num_params as usize {
        let _param_descriptor = cursor.read_byte().ok();
        names.push(generic_param_name(i));
    }
    // Parameter descriptors are byte-packed; requirements are word-aligned, matching every
    // other descriptor field in this format.
    let align_to = (cursor.position() + 3) / 4 * 4;
    let _ = cursor.seek(align_to);

    let mut requirements = Vec::with_capacity(num_requirements as usize);
    for i in 0..num_requirements {
        let flags = match cursor.read_u32_le() {
            Ok(v) => v,
            Err(_) => break,
        };
        let kind = requirement_kind_from_raw(flags);
        let param_name = names
            .get(i as usize % names.len().max(1))
            .cloned()
            .unwrap_or_else(|| generic_param_name(i as usize));
        let target = match kind {
            GenericRequirementKind::Layout => {
                let _layout_kind = cursor.read_u32_le().ok();
                None
            }
            _ => read_relative(cursor).and_then(|addr| peek_type_name(buf, addr)),
        };
        requirements.push(GenericRequirement {
            kind,
            param: param_name,
            target,
        });
        if !matches!(kind, GenericRequirementKind::Layout) && requirements.last().unwrap().target.is_none()
        {
            diagnostics.push(
                Diagnostic::recoverable("swift", "generic requirement target unresolved")
                    .at(cursor.position() as u64),
            );
        }
    }

    (num_params, names, requirements)
}

/// Parses one type context descriptor (`__swift5_types`/`__swift5_protos` entry target) at
/// `file_offset` (§3 "Swift type descriptor", §4.5).
pub fn parse_type_context_descriptor(
    macho: &MachO,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<SwiftTypeDescriptor> {
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, file_offset as usize).ok()?;

    let raw_flags = cursor.read_u32_le().ok()?;
    let flags = TypeContextDescriptorFlags(raw_flags);
    let kind = flags.kind();

    let parent_target = read_relative(&mut cursor);
    let parent = parent_target.and_then(|addr| peek_type_name(buf, addr));

    let name_target = read_relative(&mut cursor)?;
    let name = c_string_at(buf, name_target as usize).ok()?.to_string();

    let _access_function = read_relative(&mut cursor);
    let field_descriptor_address = read_relative(&mut cursor);

    let mut superclass = None;
    let mut num_fields = 0u32;

    match kind {
        TypeContextKind::Class => {
            let superclass_target = read_relative(&mut cursor);
            superclass = superclass_target.and_then(|addr| peek_type_name(buf, addr));
            let _metadata_negative_size = cursor.read_u32_le().ok()?;
            let _metadata_positive_size = cursor.read_u32_le().ok()?;
            let _num_immediate_members = cursor.read_u32_le().ok()?;
            num_fields = cursor.read_u32_le().ok()?;
            let _field_offset_vector_offset = cursor.read_u32_le().ok()?;
        }
        TypeContextKind::Struct => {
            num_fields = cursor.read_u32_le().ok()?;
            let _field_offset_vector_offset = cursor.read_u32_le().ok()?;
        }
        TypeContextKind::Enum => {
            let payload_and_size = cursor.read_u32_le().ok()?;
            num_fields = payload_and_size & 0x00ff_ffff;
            let _num_empty_cases = cursor.read_u32_le().ok()?;
        }
        _ => {}
    }

    let (generic_param_count, generic_param_names, generic_requirements) = if flags.is_generic() {
        read_generic_section(buf, &mut cursor, diagnostics)
    } else {
        (0, Vec::new(), Vec::new())
    };

    Some(SwiftTypeDescriptor {
        address: file_offset,
        kind,
        name,
        parent,
        is_generic: flags.is_generic(),
        is_unique: flags.is_unique(),
        generic_param_count,
        generic_param_names,
        generic_requirements,
        superclass,
        num_fields,
        field_descriptor_address,
    })
}

/// Parses a field descriptor (§4.5 "Field descriptor"): a small header giving the per-record
/// stride, followed by `num_fields` `(flags, mangled_type_name, field_name)` records. The
/// descriptor carries its own mangled name and (for a class) its superclass's, but not a back
/// reference to the type that owns it — the caller reaches a field descriptor through that type's
/// `field_descriptor` pointer and is responsible for setting `parent_type_address` itself.
pub fn parse_field_descriptor(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    context: &ProcessingContext,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<SwiftFieldDescriptor> {
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, file_offset as usize).ok()?;

    let _mangled_type_name_target = read_relative(&mut cursor);
    let _superclass_target = read_relative(&mut cursor);

    let _kind = cursor.read_u16_le().ok()?;
    let field_record_size = cursor.read_u16_le().ok()? as u64;
    let num_fields = cursor.read_u32_le().ok()?;

    let first_record_offset = file_offset + 16;
    let mut fields = Vec::with_capacity(num_fields as usize);

    for i in 0..num_fields as u64 {
        let record_offset = first_record_offset + i * field_record_size;
        let mut record_cursor = match Cursor::at(buf, record_offset as usize) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let _record_flags = match record_cursor.read_u32_le() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let mangled_type_target = read_relative(&mut record_cursor);
        let name_target = read_relative(&mut record_cursor);

        let Some(name_target) = name_target else {
            diagnostics.push(
                Diagnostic::recoverable("swift", "field record missing its name").at(record_offset),
            );
            continue;
        };
        let Ok(name) = c_string_at(buf, name_target as usize) else {
            continue;
        };

        let (mangled_type, demangled_type) = match mangled_type_target {
            Some(target) => resolve_mangled_name(macho, chained, context, target, OutputStyle::Swift),
            None => (String::new(), String::new()),
        };

        fields.push(SwiftField {
            name: name.to_string(),
            mangled_type,
            demangled_type,
        });
    }

    Some(SwiftFieldDescriptor {
        parent_type_address: None,
        fields,
    })
}

/// Resolves a `TypeReferenceKind`-tagged `type_ref` field to a display name: direct and indirect
/// type-descriptor references recurse into `peek_type_name`; ObjC class references are resolved
/// through `objc::loader::read_pointer` for the indirect (bind-capable) case, or read as a bare
/// symbol name for the direct case (§4.5 "Conformance descriptor").
fn resolve_type_reference(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    kind: TypeReferenceKind,
    target: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let buf = macho.buffer();
    match kind {
        TypeReferenceKind::DirectTypeDescriptor => peek_type_name(buf, target),
        TypeReferenceKind::IndirectTypeDescriptor => {
            let mut cursor = Cursor::at(buf, target as usize).ok()?;
            let indirect_target = cursor.read_u64_le().ok()?;
            peek_type_name(buf, indirect_target)
        }
        TypeReferenceKind::DirectObjCClass => c_string_at(buf, target as usize)
            .ok()
            .map(strip_objc_class_name),
        TypeReferenceKind::IndirectObjCClass => match read_pointer(macho, chained, target) {
            Ok(PointerValue::Bind(name)) => Some(strip_objc_class_name(&name)),
            Ok(PointerValue::Rebase(vmaddr)) => macho
                .address_translator()
                .translate(vmaddr)
                .and_then(|offset| peek_type_name(buf, offset)),
            Err(err) => {
                diagnostics.push(Diagnostic::recoverable("swift", err.to_string()).at(target));
                None
            }
        },
    }
}

fn strip_objc_class_name(name: &str) -> String {
    name.strip_prefix("_OBJC_CLASS_$_")
        .or_else(|| name.strip_prefix("_OBJC_METACLASS_$_"))
        .unwrap_or(name)
        .to_string()
}

/// Parses one protocol-conformance record from `__swift5_proto` (§3 "Swift conformance").
pub fn parse_conformance_descriptor(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    file_offset: u64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<SwiftConformance> {
    let buf = macho.buffer();
    let mut cursor = Cursor::at(buf, file_offset as usize).ok()?;

    let protocol_target = read_relative(&mut cursor);
    let type_ref_target = read_relative(&mut cursor);
    let _witness_table_target = read_relative(&mut cursor);
    let raw_flags = cursor.read_u32_le().ok()?;
    let flags = ConformanceFlags(raw_flags);
    let type_reference_kind = flags.type_reference_kind();

    let protocol_name = protocol_target
        .and_then(|addr| peek_type_name(buf, addr))
        .unwrap_or_else(|| "<unresolved-protocol>".to_string());

    let (conformer_address, conformer_name) = match type_ref_target {
        Some(target) => {
            let name = resolve_type_reference(macho, chained, type_reference_kind, target, diagnostics)
                .unwrap_or_else(|| "<unresolved-conformer>".to_string());
            let address = matches!(
                type_reference_kind,
                TypeReferenceKind::DirectTypeDescriptor | TypeReferenceKind::IndirectTypeDescriptor
            )
            .then_some(target);
            (address, name)
        }
        None => (None, "<unresolved-conformer>".to_string()),
    };

    Some(SwiftConformance {
        conformer_address,
        conformer_name,
        protocol_name,
        type_reference_kind,
        is_retroactive: flags.is_retroactive(),
        num_conditional_requirements: flags.num_conditional_requirements(),
    })
}
