//! Mach-O container: thin and fat binaries, load-command dispatch, section lookup (§4.2).
//!
//! The legacy retrieved layer built this on `Read + Seek` and its own `MachOErr` type, with a
//! separate top-level `commands`/`segment`/`symtab`/`dylib` module tree predating the
//! trait-based `command/` directory. This version parses directly over `&[u8]` per §5's
//! single-mapped-buffer model and reuses `command::LoadCommand` for dispatch.

use crate::arch::{Arch, CpuType};
use crate::command::dyld_chained_fixup::ChainedFixups;
use crate::command::segment::{Section32, Section64, SegmentCommand32, SegmentCommand64};
use crate::command::{LoadCommand, LoadCommandResolver};
use crate::cursor::AddressTranslator;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::fat::{FatArch, FatHeaderTable};
use crate::file_subset::FileSubset;
use crate::flags::{MHFileType, MHFlags, MHMagic};
use crate::header::MachHeader;

/// A section's declared offset alongside the offset `addr - segVMAddr + segFileOff` would
/// predict, surfaced when they disagree on a non-zero-sized section (§4.2 "Section offset
/// repair"). Downstream readers use `declared_offset`; `computed_offset` documents what dyld
/// patched away.
#[derive(Debug, Clone)]
pub struct Section {
    pub segname: String,
    pub sectname: String,
    pub addr: u64,
    pub size: u64,
    pub declared_offset: u32,
    pub computed_offset: u32,
    pub align: u32,
}

impl Section {
    fn from32(seg: &SegmentCommand32, sect: &Section32) -> Self {
        let computed = (sect.addr as i64 - seg.vmaddr as i64 + seg.fileoff as i64) as u32;
        Section {
            segname: sect.segname.clone(),
            sectname: sect.sectname.clone(),
            addr: sect.addr as u64,
            size: sect.size as u64,
            declared_offset: sect.offset,
            computed_offset: computed,
            align: sect.align,
        }
    }

    fn from64(seg: &SegmentCommand64, sect: &Section64) -> Self {
        let computed = (sect.addr as i64 - seg.vmaddr as i64 + seg.fileoff as i64) as u32;
        Section {
            segname: sect.segname.clone(),
            sectname: sect.sectname.clone(),
            addr: sect.addr,
            size: sect.size,
            declared_offset: sect.offset,
            computed_offset: computed,
            align: sect.align,
        }
    }

    pub fn is_repaired(&self) -> bool {
        self.size != 0 && self.declared_offset != self.computed_offset
    }
}

/// A parsed thin Mach-O image, borrowed from the slice it was parsed from (§5).
#[derive(Debug)]
pub struct MachO<'a> {
    pub header: MachHeader,
    pub load_commands: Vec<LoadCommand>,
    buf: &'a [u8],
    diagnostics: Diagnostics,
}

impl<'a> MachO<'a> {
    pub fn is_macho_magic(buf: &[u8]) -> bool {
        let Some(magic) = buf.get(0..4) else {
            return false;
        };
        let magic = u32::from_le_bytes(magic.try_into().unwrap());
        magic == MHMagic::MhMagic as u32 || magic == MHMagic::MhMagic64 as u32
    }

    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let (_, header) = MachHeader::parse(buf).map_err(|_| Error::InvalidMagic(0))?;
        let load_commands = LoadCommand::parse_all(buf, &header)?;

        let diagnostics = Diagnostics::new();
        let macho = MachO {
            header,
            load_commands,
            buf,
            diagnostics,
        };
        macho.check_section_offsets();
        Ok(macho)
    }

    fn check_section_offsets(&self) {
        for section in self.sections() {
            if section.is_repaired() {
                self.diagnostics.push(
                    Diagnostic::warning(
                        "macho",
                        format!(
                            "section {}.{} declares offset {:#x}, computed offset is {:#x}",
                            section.segname,
                            section.sectname,
                            section.declared_offset,
                            section.computed_offset
                        ),
                    )
                    .at(section.addr),
                );
            }
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn cpu_type(&self) -> Option<CpuType> {
        self.header.cpu_type()
    }

    pub fn filetype(&self) -> MHFileType {
        self.header.filetype()
    }

    pub fn flags(&self) -> MHFlags {
        self.header.flags()
    }

    pub fn is_64_bit(&self) -> bool {
        self.header.is_64_bit()
    }

    /// Every segment command, 32- or 64-bit.
    pub fn segments(&self) -> impl Iterator<Item = SegmentRef<'_>> {
        self.load_commands.iter().filter_map(|cmd| match cmd {
            LoadCommand::Segment32(seg) => Some(SegmentRef::Segment32(seg)),
            LoadCommand::Segment64(seg) => Some(SegmentRef::Segment64(seg)),
            _ => None,
        })
    }

    /// Every section across every segment, with offset repair applied (§4.2).
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        for seg in self.segments() {
            match seg {
                SegmentRef::Segment32(seg) => {
                    sections.extend(seg.sects.iter().map(|s| Section::from32(seg, s)));
                }
                SegmentRef::Segment64(seg) => {
                    sections.extend(seg.sections.iter().map(|s| Section::from64(seg, s)));
                }
            }
        }
        sections
    }

    pub fn find_section(&self, segname: &str, sectname: &str) -> Option<Section> {
        self.sections()
            .into_iter()
            .find(|s| s.segname == segname && s.sectname == sectname)
    }

    /// Bytes backing a section, read from its declared file offset (the on-disk truth; §4.2).
    pub fn section_bytes(&self, section: &Section) -> Result<&'a [u8]> {
        let start = section.declared_offset as usize;
        let end = start
            .checked_add(section.size as usize)
            .ok_or(Error::ReadOutOfBounds {
                offset: start,
                length: section.size as usize,
                size: self.buf.len(),
            })?;
        self.buf
            .get(start..end)
            .ok_or(Error::ReadOutOfBounds {
                offset: start,
                length: section.size as usize,
                size: self.buf.len(),
            })
    }

    /// Builds an [`AddressTranslator`] over every section's `(vmaddr, vmsize, fileoff)` (§4.1).
    pub fn address_translator(&self) -> AddressTranslator {
        let entries = self
            .sections()
            .into_iter()
            .map(|s| (s.addr, s.size, s.declared_offset as u64))
            .collect();
        AddressTranslator::new(entries)
    }

    /// Whether this image declares any Objective-C runtime metadata, recognized by the presence
    /// of `__objc_classlist`, `__objc_catlist`, `__objc_protolist`, or `__objc_imageinfo` in
    /// either `__DATA` or `__DATA_CONST` (§6 external-interfaces list).
    pub fn has_objc_runtime(&self) -> bool {
        const OBJC_SECTIONS: [&str; 4] = [
            "__objc_classlist",
            "__objc_catlist",
            "__objc_protolist",
            "__objc_imageinfo",
        ];
        ["__DATA", "__DATA_CONST"].iter().any(|segname| {
            OBJC_SECTIONS
                .iter()
                .any(|sectname| self.find_section(segname, sectname).is_some())
        })
    }

    /// Whether this image carries an `LC_DYLD_CHAINED_FIXUPS` load command.
    pub fn has_chained_fixups(&self) -> bool {
        self.load_commands
            .iter()
            .any(|cmd| matches!(cmd, LoadCommand::DyldChainedFixups(_)))
    }

    /// Resolves the `LC_DYLD_CHAINED_FIXUPS` command, if present, into a [`ChainedFixups`] that
    /// can decode individual pointers by address (§4.3).
    pub fn parse_chained_fixups(&self) -> Result<ChainedFixups<'a>> {
        let cmd = self
            .load_commands
            .iter()
            .find_map(|cmd| match cmd {
                LoadCommand::DyldChainedFixups(cmd) => Some(cmd),
                _ => None,
            })
            .ok_or(Error::InvalidLoadCommand)?;

        let resolved = cmd.resolve(self.buf)?;
        Ok(ChainedFixups::from_resolved(self.buf, resolved))
    }
}

pub enum SegmentRef<'a> {
    Segment32(&'a SegmentCommand32),
    Segment64(&'a SegmentCommand64),
}

impl<'a> SegmentRef<'a> {
    pub fn name(&self) -> &str {
        match self {
            SegmentRef::Segment32(s) => &s.segname,
            SegmentRef::Segment64(s) => &s.segname,
        }
    }

    pub fn vmaddr(&self) -> u64 {
        match self {
            SegmentRef::Segment32(s) => s.vmaddr as u64,
            SegmentRef::Segment64(s) => s.vmaddr,
        }
    }

    pub fn fileoff(&self) -> u64 {
        match self {
            SegmentRef::Segment32(s) => s.fileoff as u64,
            SegmentRef::Segment64(s) => s.fileoff,
        }
    }
}

/// A parsed fat (universal) binary, borrowed from the slice it was parsed from.
#[derive(Debug)]
pub struct FatMachO<'a> {
    pub table: FatHeaderTable,
    buf: &'a [u8],
}

impl<'a> FatMachO<'a> {
    pub fn is_fat_magic(buf: &[u8]) -> bool {
        let Some(magic) = buf.get(0..4) else {
            return false;
        };
        let magic = u32::from_be_bytes(magic.try_into().unwrap());
        magic == crate::flags::FatMagic::Fat as u32 || magic == crate::flags::FatMagic::Fat64 as u32
    }

    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let (_, table) = FatHeaderTable::parse(buf)
            .map_err(|_| Error::ParsingError("unable to parse fat header".to_string()))?;
        Ok(FatMachO { table, buf })
    }

    pub fn archs(&self) -> &[FatArch] {
        &self.table.archs
    }

    /// Selects the best-matching slice for `target` (§4.2 best-match priority) and parses it.
    pub fn macho_for(&self, target: &Arch) -> Result<MachO<'a>> {
        let arch = self
            .table
            .best_match(target)
            .ok_or(Error::ArchitectureNotFound(*target))?;

        let subset = FileSubset::new(self.buf, arch.offset(), arch.size())?;
        let slice = subset.as_slice();

        if !MachO::is_macho_magic(slice) {
            return Err(Error::InvalidMagic(0));
        }

        MachO::parse(slice)
    }

    /// Selects a slice by exact CPU type, ignoring best-match fallback.
    pub fn macho_for_cputype(&self, cputype: CpuType) -> Result<MachO<'a>> {
        let arch = self
            .table
            .archs
            .iter()
            .find(|a| a.cputype() == cputype as u32)
            .ok_or(Error::ArchitectureNotFound(Arch {
                cputype: cputype as u32,
                cpusubtype: 0,
            }))?;

        let subset = FileSubset::new(self.buf, arch.offset(), arch.size())?;
        let slice = subset.as_slice();

        if !MachO::is_macho_magic(slice) {
            return Err(Error::InvalidMagic(0));
        }

        MachO::parse(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::dyld_chained_fixup::DyldPointerFormat;
    use crate::command::LCLoadCommand;

    fn sample_thin_macho() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xfeed_facfu32.to_le_bytes()); // MH_MAGIC_64
        bytes.extend(0x0100_000cu32.to_le_bytes()); // CPU_TYPE_ARM64
        bytes.extend(0i32.to_le_bytes());
        bytes.extend(2u32.to_le_bytes()); // MH_EXECUTE
        bytes.extend(1u32.to_le_bytes()); // ncmds
        bytes.extend(152u32.to_le_bytes()); // sizeofcmds
        bytes.extend(0u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes()); // reserved

        // one LC_SEGMENT_64, __TEXT, one section with a deliberately wrong declared offset
        bytes.extend((LCLoadCommand::LcSegment64 as u32).to_le_bytes());
        bytes.extend(152u32.to_le_bytes());
        let mut segname = [0u8; 16];
        segname[..6].copy_from_slice(b"__TEXT");
        bytes.extend(segname);
        bytes.extend(0x1_0000_0000u64.to_le_bytes()); // vmaddr
        bytes.extend(0x4000u64.to_le_bytes()); // vmsize
        bytes.extend(0u64.to_le_bytes()); // fileoff
        bytes.extend(0x4000u64.to_le_bytes()); // filesize
        bytes.extend(5u32.to_le_bytes()); // maxprot
        bytes.extend(5u32.to_le_bytes()); // initprot
        bytes.extend(1u32.to_le_bytes()); // nsects
        bytes.extend(0u32.to_le_bytes()); // flags

        let mut sectname = [0u8; 16];
        sectname[..6].copy_from_slice(b"__text");
        bytes.extend(sectname);
        bytes.extend(segname);
        bytes.extend(0x1_0000_1000u64.to_le_bytes()); // addr (implies computed offset 0x1000)
        bytes.extend(0x10u64.to_le_bytes()); // size
        bytes.extend(0x2000u32.to_le_bytes()); // declared offset, deliberately wrong
        bytes.extend(4u32.to_le_bytes()); // align
        bytes.extend(0u32.to_le_bytes()); // reloff
        bytes.extend(0u32.to_le_bytes()); // nreloc
        bytes.extend(0x8000_0400u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());

        bytes
    }

    #[test]
    fn parses_thin_macho_and_lists_sections() {
        let bytes = sample_thin_macho();
        let macho = MachO::parse(&bytes).unwrap();
        assert!(macho.is_64_bit());
        assert_eq!(macho.cpu_type(), Some(CpuType::Arm64));

        let sections = macho.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].sectname, "__text");
    }

    #[test]
    fn repaired_section_offset_recorded_as_diagnostic() {
        let bytes = sample_thin_macho();
        let macho = MachO::parse(&bytes).unwrap();
        let section = macho.find_section("__TEXT", "__text").unwrap();
        assert_eq!(section.declared_offset, 0x2000);
        assert_eq!(section.computed_offset, 0x1000);
        assert!(section.is_repaired());

        let diagnostics = macho.diagnostics();
        assert_eq!(diagnostics.len(), 1);
    }

    fn sample_macho_with_chained_fixups() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xfeed_facfu32.to_le_bytes()); // MH_MAGIC_64
        bytes.extend(0x0100_000cu32.to_le_bytes()); // CPU_TYPE_ARM64
        bytes.extend(0i32.to_le_bytes());
        bytes.extend(2u32.to_le_bytes()); // MH_EXECUTE
        bytes.extend(2u32.to_le_bytes()); // ncmds
        bytes.extend(88u32.to_le_bytes()); // sizeofcmds = 72 (segment, no sections) + 16
        bytes.extend(0u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes()); // reserved
        assert_eq!(bytes.len(), 32);

        // LC_SEGMENT_64 with no sections.
        bytes.extend((LCLoadCommand::LcSegment64 as u32).to_le_bytes());
        bytes.extend(72u32.to_le_bytes());
        let mut segname = [0u8; 16];
        segname[..6].copy_from_slice(b"__TEXT");
        bytes.extend(segname);
        bytes.extend(0x1_0000_0000u64.to_le_bytes()); // vmaddr
        bytes.extend(0x4000u64.to_le_bytes()); // vmsize
        bytes.extend(0u64.to_le_bytes()); // fileoff
        bytes.extend(0x4000u64.to_le_bytes()); // filesize
        bytes.extend(5u32.to_le_bytes()); // maxprot
        bytes.extend(5u32.to_le_bytes()); // initprot
        bytes.extend(0u32.to_le_bytes()); // nsects
        bytes.extend(0u32.to_le_bytes()); // flags
        assert_eq!(bytes.len(), 32 + 72);

        // LC_DYLD_CHAINED_FIXUPS, data right after the load commands, 32 bytes.
        bytes.extend((LCLoadCommand::LcDyldChainedFixups as u32).to_le_bytes());
        bytes.extend(16u32.to_le_bytes());
        bytes.extend(120u32.to_le_bytes()); // dataoff
        bytes.extend(32u32.to_le_bytes()); // datasize
        assert_eq!(bytes.len(), 120);

        // DyldChainedFixupsHeader: version, starts_offset, imports_offset, symbols_offset,
        // imports_count, imports_format, symbols_format (7 x u32 = 28 bytes).
        bytes.extend(0u32.to_le_bytes());
        bytes.extend(28u32.to_le_bytes()); // starts_offset
        bytes.extend(28u32.to_le_bytes()); // imports_offset (unused, imports_count == 0)
        bytes.extend(28u32.to_le_bytes()); // symbols_offset (unused)
        bytes.extend(0u32.to_le_bytes()); // imports_count
        bytes.extend(1u32.to_le_bytes()); // imports_format: Import
        bytes.extend(0u32.to_le_bytes()); // symbols_format: Uncompressed

        // DyldStartsInImage with zero segments.
        bytes.extend(0u32.to_le_bytes()); // seg_count
        assert_eq!(bytes.len(), 152);

        bytes
    }

    #[test]
    fn chained_fixups_round_trip_through_macho() {
        let bytes = sample_macho_with_chained_fixups();
        let macho = MachO::parse(&bytes).unwrap();
        assert!(macho.has_chained_fixups());

        let fixups = macho.parse_chained_fixups().unwrap();
        assert!(fixups.imports().is_empty());
        assert!(fixups.segment_starts().is_empty());

        let decoded = fixups.decode_at(0, DyldPointerFormat::Ptr64).unwrap();
        assert_eq!(decoded.file_offset, 0);

        let err = fixups.decode_at(bytes.len() as u64, DyldPointerFormat::Ptr64);
        assert!(err.is_err());
    }

    #[test]
    fn no_chained_fixups_when_command_absent() {
        let bytes = sample_thin_macho();
        let macho = MachO::parse(&bytes).unwrap();
        assert!(!macho.has_chained_fixups());
        assert!(macho.parse_chained_fixups().is_err());
    }

    #[test]
    fn has_objc_runtime_is_false_without_objc_sections() {
        let bytes = sample_thin_macho();
        let macho = MachO::parse(&bytes).unwrap();
        assert!(!macho.has_objc_runtime());
    }
}
