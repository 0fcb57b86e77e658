//! Swift metadata recovery (§4.5): nominal types and protocol conformances reachable from
//! `__swift5_types`/`__swift5_protos`/`__swift5_proto`, loaded in parallel and merged into one
//! address-sorted [`SwiftModel`], mirroring [`crate::objc::process_objc`]'s concurrency shape.

pub mod descriptor;
pub mod flags;
pub mod model;
pub mod symbolic;

pub use flags::{ConformanceFlags, TypeContextDescriptorFlags, TypeContextKind, TypeReferenceKind};
pub use model::{
    GenericRequirement, GenericRequirementKind, SwiftConformance, SwiftField, SwiftFieldDescriptor,
    SwiftModel, SwiftTypeDescriptor,
};

use crate::context::ProcessingContext;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::macho::MachO;
use crate::objc::ObjcModel;

/// Recovers every nominal type and protocol conformance declared by `macho`'s Swift metadata
/// sections.
///
/// Entry addresses are collected up front from the three relative-offset arrays, then each
/// descriptor is parsed independently inside `context`'s thread pool; a type's field descriptor,
/// when it has one, is parsed as part of that same task rather than a separate pass, since the
/// only way to reach a field descriptor is through the type that names it (§4.5 "Field
/// descriptor"). A malformed individual record is a recorded diagnostic; a missing
/// `__swift5_types` section is simply an image with no Swift types, not a failure.
pub fn process_swift(macho: &MachO, context: &ProcessingContext) -> Result<SwiftModel> {
    let chained_fixups = if macho.has_chained_fixups() {
        Some(macho.parse_chained_fixups()?)
    } else {
        None
    };
    let chained = chained_fixups.as_ref();

    let type_addresses = relative_entry_addresses(macho, "__swift5_types");
    let protocol_addresses = relative_entry_addresses(macho, "__swift5_protos");
    let conformance_addresses = relative_entry_addresses(macho, "__swift5_proto");

    let types = std::sync::Mutex::new(Vec::with_capacity(
        type_addresses.len() + protocol_addresses.len(),
    ));
    let fields = std::sync::Mutex::new(Vec::new());
    let conformances = std::sync::Mutex::new(Vec::with_capacity(conformance_addresses.len()));

    context.scope(|scope| {
        for address in type_addresses.iter().chain(protocol_addresses.iter()).copied() {
            let types = &types;
            let fields = &fields;
            scope.spawn(move |_| {
                if context.is_cancelled() {
                    return;
                }
                let mut diagnostics = Vec::new();
                match descriptor::parse_type_context_descriptor(macho, address, &mut diagnostics) {
                    Some(descriptor) => {
                        if let Some(field_descriptor_address) = descriptor.field_descriptor_address
                        {
                            if let Some(mut record) = descriptor::parse_field_descriptor(
                                macho,
                                chained,
                                context,
                                field_descriptor_address,
                                &mut diagnostics,
                            ) {
                                record.parent_type_address = Some(descriptor.address);
                                fields.lock().unwrap().push(record);
                            }
                        }
                        types.lock().unwrap().push(descriptor);
                    }
                    None => diagnostics.push(
                        Diagnostic::recoverable("swift", "failed to load type descriptor")
                            .at(address),
                    ),
                }
                for diagnostic in diagnostics {
                    context.record(diagnostic);
                }
            });
        }

        for address in conformance_addresses {
            let conformances = &conformances;
            scope.spawn(move |_| {
                if context.is_cancelled() {
                    return;
                }
                let mut diagnostics = Vec::new();
                match descriptor::parse_conformance_descriptor(macho, chained, address, &mut diagnostics)
                {
                    Some(conformance) => conformances.lock().unwrap().push(conformance),
                    None => diagnostics.push(
                        Diagnostic::recoverable("swift", "failed to load conformance descriptor")
                            .at(address),
                    ),
                }
                for diagnostic in diagnostics {
                    context.record(diagnostic);
                }
            });
        }
    });

    let mut types = types.into_inner().unwrap();
    let mut fields = fields.into_inner().unwrap();
    let mut conformances = conformances.into_inner().unwrap();
    types.sort_by_key(|t| t.address);
    fields.sort_by_key(|f| f.parent_type_address);
    conformances.sort_by_key(|c| c.conformer_address);

    Ok(SwiftModel {
        types,
        fields,
        conformances,
    })
}

/// Collects the absolute file offsets a relative-offset array (`__swift5_types` and friends)
/// points at: each 4-byte entry is an `i32` offset from its own (not the section's) address
/// (§4.5 "Metadata section layout").
fn relative_entry_addresses(macho: &MachO, sectname: &str) -> Vec<u64> {
    let Some(section) = ["__TEXT", "__DATA_CONST", "__DATA"]
        .iter()
        .find_map(|segname| macho.find_section(segname, sectname))
    else {
        return Vec::new();
    };
    let Ok(bytes) = macho.section_bytes(&section) else {
        return Vec::new();
    };
    let translator = macho.address_translator();

    bytes
        .chunks_exact(4)
        .enumerate()
        .filter_map(|(i, chunk)| {
            let raw = i32::from_le_bytes(chunk.try_into().unwrap());
            if raw == 0 {
                return None;
            }
            let entry_vmaddr = section.addr + i as u64 * 4;
            let target_vmaddr = (entry_vmaddr as i64 + raw as i64) as u64;
            translator.translate(target_vmaddr)
        })
        .collect()
}

/// Binds each Swift class's recovered fields to the ObjC ivars of the class with a matching
/// `isSwift` flag and name, completing the ivar types an ObjC-only read of the runtime leaves as
/// bare encodings (§4.5 "Field/ivar binding"). Run once after both `process_objc` and
/// `process_swift` have produced their models for the same image, rather than threaded through
/// either one, since binding needs both and neither depends on the other to run.
pub fn bind_fields_to_ivars(objc: &mut ObjcModel, swift: &SwiftModel) {
    for class in &mut objc.classes {
        if !class.is_swift() {
            continue;
        }
        let Some(swift_type) = swift.type_named(&class.name) else {
            continue;
        };
        let Some(field_descriptor) = swift.fields_for(swift_type.address) else {
            continue;
        };
        for ivar in &mut class.ivars {
            if let Some(field) = field_descriptor.fields.iter().find(|f| f.name == ivar.name) {
                ivar.type_encoding = field.demangled_type.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LCLoadCommand;

    /// A thin 64-bit image with one `__TEXT,__swift5_types` section holding a single relative
    /// offset to a struct type descriptor, exercising the end-to-end array-walk-then-parse path
    /// without needing chained fixups or generics.
    fn macho_with_one_struct() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xfeed_facfu32.to_le_bytes()); // MH_MAGIC_64
        bytes.extend(0x0100_000cu32.to_le_bytes()); // CPU_TYPE_ARM64
        bytes.extend(0i32.to_le_bytes());
        bytes.extend(2u32.to_le_bytes()); // MH_EXECUTE
        bytes.extend(1u32.to_le_bytes()); // ncmds
        bytes.extend(152u32.to_le_bytes()); // sizeofcmds
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());

        bytes.extend((LCLoadCommand::LcSegment64 as u32).to_le_bytes());
        bytes.extend(152u32.to_le_bytes());
        let mut segname = [0u8; 16];
        segname[..6].copy_from_slice(b"__TEXT");
        bytes.extend(segname);
        bytes.extend(0x1_0000_0000u64.to_le_bytes()); // vmaddr
        bytes.extend(0x4000u64.to_le_bytes()); // vmsize
        bytes.extend(0u64.to_le_bytes()); // fileoff
        bytes.extend(0x4000u64.to_le_bytes()); // filesize
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(1u32.to_le_bytes()); // nsects
        bytes.extend(0u32.to_le_bytes());

        let mut sectname = [0u8; 16];
        sectname[..14].copy_from_slice(b"__swift5_types");
        bytes.extend(sectname);
        bytes.extend(segname);
        let section_vmaddr = 0x1_0000_1000u64;
        bytes.extend(section_vmaddr.to_le_bytes()); // addr
        bytes.extend(4u64.to_le_bytes()); // size: one 4-byte entry
        let offset_field_at = bytes.len();
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(4u32.to_le_bytes()); // align
        bytes.extend(0u32.to_le_bytes()); // reloff
        bytes.extend(0u32.to_le_bytes()); // nreloc
        bytes.extend(0u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes()); // reserved1
        bytes.extend(0u32.to_le_bytes()); // reserved2
        bytes.extend(0u32.to_le_bytes()); // reserved3

        let section_file_offset = bytes.len() as u32;
        bytes[offset_field_at..offset_field_at + 4]
            .copy_from_slice(&section_file_offset.to_le_bytes());

        let descriptor_file_offset = section_file_offset as u64 + 4;
        let entry_vmaddr = section_vmaddr;
        let descriptor_vmaddr = section_vmaddr + (descriptor_file_offset - section_file_offset as u64);
        let relative = (descriptor_vmaddr as i64 - entry_vmaddr as i64) as i32;
        bytes.extend(relative.to_le_bytes()); // the one __swift5_types entry

        // struct type context descriptor: flags, parent, name, access_function, field_descriptor,
        // num_fields, field_offset_vector_offset
        let flags_field_at = bytes.len() as u64;
        bytes.extend(17u32.to_le_bytes()); // kind = Struct
        bytes.extend(0i32.to_le_bytes()); // parent: none
        let name_field_at = flags_field_at + 8;
        // name, access_function, field_descriptor, num_fields, field_offset_vector_offset: 20
        // more bytes follow the name field itself before the string data starts.
        let name_at = name_field_at + 20;
        let name_relative = (name_at as i64 - name_field_at as i64) as i32;
        bytes.extend(name_relative.to_le_bytes());
        bytes.extend(0i32.to_le_bytes()); // access_function: none
        bytes.extend(0i32.to_le_bytes()); // field_descriptor: none
        bytes.extend(0u32.to_le_bytes()); // num_fields
        bytes.extend(0u32.to_le_bytes()); // field_offset_vector_offset
        bytes.extend(b"MyStruct\0");

        bytes
    }

    #[test]
    fn process_swift_reads_one_struct() {
        let bytes = macho_with_one_struct();
        let macho = MachO::parse(&bytes).unwrap();
        let context = ProcessingContext::new();

        let model = process_swift(&macho, &context).unwrap();
        assert_eq!(model.types.len(), 1);
        assert_eq!(model.types[0].name, "MyStruct");
        assert_eq!(model.types[0].kind, TypeContextKind::Struct);
        assert!(model.conformances.is_empty());
    }
}
