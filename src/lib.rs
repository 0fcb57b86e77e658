//! Extracts and renders the declared Objective-C and Swift interface of a Mach-O binary.
//!
//! The crate never opens a file path itself (§6): callers memory-map or otherwise produce a
//! byte buffer and hand it to [`open_binary`], which dispatches to a thin or fat [`Binary`].
//! From there, [`process_objc`] and [`process_swift`] recover runtime metadata, and [`visit`]
//! drives one of the output sinks in [`visitor`] over the combined model.

pub mod arch;
pub mod command;
pub mod context;
pub mod cursor;
pub mod demangle;
pub mod diagnostic;
pub mod encoding;
pub mod error;
pub mod fat;
pub mod file_subset;
pub mod flags;
pub mod header;
pub mod helpers;
pub mod machine;
pub mod macho;
pub mod objc;
pub mod options;
pub mod registry;
pub mod swift;
pub mod visitor;

pub use arch::Arch;
pub use context::ProcessingContext;
pub use diagnostic::Diagnostic;
pub use error::{Error, Result};
pub use macho::{FatMachO, MachO};
pub use objc::{process_objc, ObjcModel};
pub use options::Options;
pub use swift::{process_swift, SwiftModel};
pub use visitor::{visit, Model, Sink};

/// The result of [`open_binary`]: either a single-architecture image or a universal one still
/// carrying every slice's architecture table (§6).
pub enum Binary<'a> {
    Thin(MachO<'a>),
    Fat(FatMachO<'a>),
}

impl<'a> Binary<'a> {
    /// Every architecture this binary declares: one, for a thin image; the full fat arch table
    /// otherwise.
    pub fn architectures(&self) -> Vec<Arch> {
        match self {
            Binary::Thin(macho) => vec![Arch {
                cputype: macho.header.cputype(),
                cpusubtype: macho.header.cpusubtype(),
            }],
            Binary::Fat(fat) => fat.archs().iter().map(|a| a.arch()).collect(),
        }
    }

    /// Selects the slice matching `arch` (§4.2 best-match priority for fat binaries; an exact
    /// match is required for a thin one).
    pub fn slice_for(&self, arch: Arch) -> Result<MachO<'a>> {
        match self {
            Binary::Thin(macho) => {
                let own = Arch {
                    cputype: macho.header.cputype(),
                    cpusubtype: macho.header.cpusubtype(),
                };
                if own.matches(&arch) {
                    MachO::parse(macho.buffer())
                } else {
                    Err(Error::ArchitectureNotFound(arch))
                }
            }
            Binary::Fat(fat) => fat.macho_for(&arch),
        }
    }
}

/// Detects fat-vs-thin magic and parses accordingly; fails only on an unrecognized magic or a
/// structurally invalid header (§4.2 "Failure semantics").
pub fn open_binary(bytes: &[u8]) -> Result<Binary<'_>> {
    if FatMachO::is_fat_magic(bytes) {
        Ok(Binary::Fat(FatMachO::parse(bytes)?))
    } else if MachO::is_macho_magic(bytes) {
        Ok(Binary::Thin(MachO::parse(bytes)?))
    } else {
        let magic = bytes
            .get(0..4)
            .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
            .unwrap_or(0);
        Err(Error::InvalidMagic(magic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_thin_macho() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xfeed_facfu32.to_le_bytes());
        bytes.extend(0x0100_000cu32.to_le_bytes());
        bytes.extend(0i32.to_le_bytes());
        bytes.extend(2u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn open_binary_dispatches_thin_images() {
        let bytes = sample_thin_macho();
        let binary = open_binary(&bytes).unwrap();
        assert!(matches!(binary, Binary::Thin(_)));
        assert_eq!(binary.architectures().len(), 1);
    }

    #[test]
    fn open_binary_rejects_unknown_magic() {
        let bytes = [0u8; 16];
        assert!(matches!(open_binary(&bytes), Err(Error::InvalidMagic(0))));
    }
}
