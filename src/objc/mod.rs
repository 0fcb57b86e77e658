//! Objective-C 2 runtime metadata recovery (§4.4): classes, categories, and protocols reachable
//! from `__objc_classlist`/`__objc_catlist`/`__objc_protolist`, loaded in parallel and merged into
//! one address-sorted [`ObjcModel`].

pub mod flags;
pub mod loader;
pub mod model;

pub use model::{
    ClassRef, ImageInfo, ObjcCategory, ObjcClass, ObjcIvar, ObjcMethod, ObjcModel, ObjcProperty,
    ObjcProtocol, PointerValue,
};

use crate::context::ProcessingContext;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::macho::MachO;

/// Recovers every class, category, and protocol declared by `macho`'s ObjC runtime metadata.
///
/// Per §4.4's concurrency model: entry-point addresses are collected up front from the three
/// `__objc_*list` sections, then each record is loaded independently inside `context`'s thread
/// pool and merged by address once every task completes. A malformed individual record is a
/// recorded diagnostic (§4.4 failure semantics); only a missing or truncated `__objc_classlist`
/// itself fails the whole call.
pub fn process_objc(macho: &MachO, context: &ProcessingContext) -> Result<ObjcModel> {
    let chained_fixups = if macho.has_chained_fixups() {
        Some(macho.parse_chained_fixups()?)
    } else {
        None
    };
    let chained = chained_fixups.as_ref();

    let class_addresses = entry_addresses(macho, "__objc_classlist");
    let category_addresses = entry_addresses(macho, "__objc_catlist");
    let protocol_addresses = entry_addresses(macho, "__objc_protolist");

    let classes = std::sync::Mutex::new(Vec::with_capacity(class_addresses.len()));
    let categories = std::sync::Mutex::new(Vec::with_capacity(category_addresses.len()));
    let protocols = std::sync::Mutex::new(Vec::with_capacity(protocol_addresses.len()));

    context.scope(|scope| {
        for address in class_addresses {
            let classes = &classes;
            scope.spawn(move |_| {
                if context.is_cancelled() {
                    return;
                }
                let mut diagnostics = Vec::new();
                if let Some(mut class) =
                    loader::read_class(macho, chained, address, &mut diagnostics)
                {
                    loader::attach_class_methods(macho, chained, &mut class, &mut diagnostics);
                    classes.lock().unwrap().push(class);
                } else {
                    diagnostics.push(
                        Diagnostic::recoverable("objc", "failed to load class record")
                            .at(address),
                    );
                }
                for diagnostic in diagnostics {
                    context.record(diagnostic);
                }
            });
        }

        for address in category_addresses {
            let categories = &categories;
            scope.spawn(move |_| {
                if context.is_cancelled() {
                    return;
                }
                let mut diagnostics = Vec::new();
                if let Some(category) =
                    loader::read_category(macho, chained, address, &mut diagnostics)
                {
                    categories.lock().unwrap().push(category);
                } else {
                    diagnostics.push(
                        Diagnostic::recoverable("objc", "failed to load category record")
                            .at(address),
                    );
                }
                for diagnostic in diagnostics {
                    context.record(diagnostic);
                }
            });
        }

        for address in protocol_addresses {
            let protocols = &protocols;
            scope.spawn(move |_| {
                if context.is_cancelled() {
                    return;
                }
                let mut diagnostics = Vec::new();
                if let Some(protocol) =
                    loader::read_protocol(macho, chained, address, &mut diagnostics)
                {
                    protocols.lock().unwrap().push(protocol);
                } else {
                    diagnostics.push(
                        Diagnostic::recoverable("objc", "failed to load protocol record")
                            .at(address),
                    );
                }
                for diagnostic in diagnostics {
                    context.record(diagnostic);
                }
            });
        }
    });

    let mut classes = classes.into_inner().unwrap();
    let mut categories = categories.into_inner().unwrap();
    let mut protocols = protocols.into_inner().unwrap();
    classes.sort_by_key(|c| c.address);
    categories.sort_by_key(|c| c.class.clone());
    protocols.sort_by_key(|p| p.address);

    let image_info = macho
        .find_section("__DATA", "__objc_imageinfo")
        .or_else(|| macho.find_section("__DATA_CONST", "__objc_imageinfo"))
        .and_then(|section| macho.section_bytes(&section).ok())
        .and_then(loader::read_image_info);

    Ok(ObjcModel {
        classes,
        categories,
        protocols,
        image_info,
    })
}

fn entry_addresses(macho: &MachO, sectname: &str) -> Vec<u64> {
    ["__DATA", "__DATA_CONST"]
        .iter()
        .find_map(|segname| macho.find_section(segname, sectname))
        .and_then(|section| macho.section_bytes(&section).ok())
        .map(loader::collect_pointer_list)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LCLoadCommand;
    use crate::objc::flags::ObjCImageInfoFlags;

    /// A thin 64-bit image with one `__DATA,__objc_imageinfo` section and no class/category/
    /// protocol lists, so `process_objc` exercises the image-info path and the "list absent"
    /// fallback of `entry_addresses` without needing a full class graph.
    fn macho_with_only_image_info() -> Vec<u8> {
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
        segname[..6].copy_from_slice(b"__DATA");
        bytes.extend(segname);
        bytes.extend(0x1_0000_0000u64.to_le_bytes()); // vmaddr
        bytes.extend(0x4000u64.to_le_bytes()); // vmsize
        bytes.extend(0u64.to_le_bytes()); // fileoff
        bytes.extend(0x4000u64.to_le_bytes()); // filesize
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(5u32.to_le_bytes());
        bytes.extend(1u32.to_le_bytes()); // nsects
        bytes.extend(0u32.to_le_bytes());

        let sectname = *b"__objc_imageinfo";
        bytes.extend(sectname);
        bytes.extend(segname);
        bytes.extend(0x1_0000_1000u64.to_le_bytes()); // addr
        bytes.extend(0x8u64.to_le_bytes()); // size (8 bytes: version + flags)
        // Placeholder for the declared offset field; patched below once its real value (the
        // file position right after this whole section struct) is known.
        let offset_field_at = bytes.len();
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(4u32.to_le_bytes()); // align
        bytes.extend(0u32.to_le_bytes()); // reloff
        bytes.extend(0u32.to_le_bytes()); // nreloc
        bytes.extend(0u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes()); // reserved1
        bytes.extend(0u32.to_le_bytes()); // reserved2
        bytes.extend(0u32.to_le_bytes()); // reserved3

        let declared_offset = bytes.len() as u32;
        bytes[offset_field_at..offset_field_at + 4].copy_from_slice(&declared_offset.to_le_bytes());

        bytes.extend(0u32.to_le_bytes()); // version
        let flags = ObjCImageInfoFlags::SUPPORTS_GC.bits() | (2u32 << 16); // swift stable version 2
        bytes.extend(flags.to_le_bytes());

        bytes
    }

    #[test]
    fn process_objc_reads_image_info_with_no_classes() {
        let bytes = macho_with_only_image_info();
        let macho = MachO::parse(&bytes).unwrap();
        let context = ProcessingContext::new();

        let model = process_objc(&macho, &context).unwrap();
        assert!(model.classes.is_empty());
        assert!(model.categories.is_empty());
        assert!(model.protocols.is_empty());

        let info = model.image_info.expect("image info section present");
        assert!(info.flags.contains(ObjCImageInfoFlags::SUPPORTS_GC));
        assert_eq!(info.swift_stable_version, 2);
    }
}
