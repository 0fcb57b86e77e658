#![allow(dead_code, non_camel_case_types)]
//! Header-level magic numbers and flag sets (§4.2).
//!
//! The teacher's retrieved `flags.rs` only carried `LCLoadCommand` and `FatMagic`; its
//! `header.rs` nonetheless imported `MHMagic`/`MHFileType`/`MHFlags` from this module. Those
//! three types are reconstructed here from the Mach-O ABI the rest of the tree already assumes.

use nom::IResult;
use nom_derive::{Nom, Parse};

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Nom)]
pub enum MHMagic {
    MhMagic = 0xfeed_face,
    MhMagic64 = 0xfeed_facf,
}

impl MHMagic {
    pub fn parse(bytes: &[u8]) -> IResult<&[u8], MHMagic> {
        let (bytes, raw) = nom::number::complete::le_u32(bytes)?;
        match raw {
            0xfeed_face => Ok((bytes, MHMagic::MhMagic)),
            0xfeed_facf => Ok((bytes, MHMagic::MhMagic64)),
            _ => Err(nom::Err::Failure(nom::error::Error::new(
                bytes,
                nom::error::ErrorKind::Tag,
            ))),
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Nom)]
pub enum MHFileType {
    Object = 0x1,
    Execute = 0x2,
    FVMLib = 0x3,
    Core = 0x4,
    Preload = 0x5,
    Dylib = 0x6,
    Dylinker = 0x7,
    Bundle = 0x8,
    DylibStub = 0x9,
    Dsym = 0xa,
    KextBundle = 0xb,
    FileSet = 0xc,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MHFlags: u32 {
        const NOUNDEFS = 0x1;
        const INCRLINK = 0x2;
        const DYLDLINK = 0x4;
        const BINDATLOAD = 0x8;
        const PREBOUND = 0x10;
        const SPLIT_SEGS = 0x20;
        const TWOLEVEL = 0x80;
        const FORCE_FLAT = 0x100;
        const NOMULTIDEFS = 0x200;
        const NOFIXPREBINDING = 0x400;
        const PREBINDABLE = 0x800;
        const ALLMODSBOUND = 0x1000;
        const SUBSECTIONS_VIA_SYMBOLS = 0x2000;
        const CANONICAL = 0x4000;
        const WEAK_DEFINES = 0x8000;
        const BINDS_TO_WEAK = 0x1_0000;
        const ALLOW_STACK_EXECUTION = 0x2_0000;
        const PIE = 0x20_0000;
        const NO_HEAP_EXECUTION = 0x100_0000;
        const APP_EXTENSION_SAFE = 0x0200_0000;
        const NLIST_OUTOFSYNC_WITH_DYLDINFO = 0x0400_0000;
    }
}

impl MHFlags {
    pub fn parse(bytes: &[u8]) -> IResult<&[u8], MHFlags> {
        let (bytes, raw) = nom::number::complete::le_u32(bytes)?;
        Ok((bytes, MHFlags::from_bits_truncate(raw)))
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Nom)]
pub enum FatMagic {
    Fat = 0xcafe_babe,
    Fat64 = 0xcafe_babf,
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Nom)]
pub enum LCLoadCommand {
    None = 0x0,
    LcSegment = 0x1,
    LcSymtab = 0x2,
    LcSymseg = 0x3,
    LcThread = 0x4,
    LcUnixThread = 0x5,
    LcDysymtab = 0xb,
    LcLoadDylib = 0xc,
    LcIdDylib = 0xd,
    LcLoadDylinker = 0xe,
    LcIdDylinker = 0xf,
    LcPreboundDylib = 0x10,
    LcRoutines = 0x11,
    LcSubFramework = 0x12,
    LcSubUmbrella = 0x13,
    LcSubClient = 0x14,
    LcSubLibrary = 0x15,
    LcTwolevelHints = 0x16,
    LcPrebindCksum = 0x17,
    LcLoadWeakDylib = 0x18 | Self::LC_REQ_DYLD,
    LcSegment64 = 0x19,
    LcRoutines64 = 0x1a,
    LcUuid = 0x1b,
    LcRpath = 0x1c | Self::LC_REQ_DYLD,
    LcCodeSignature = 0x1d,
    LcSegmentSplitInfo = 0x1e,
    LcReexportDylib = 0x1f | Self::LC_REQ_DYLD,
    LcLazyLoadDylib = 0x20,
    LcEncryptionInfo = 0x21,
    LcDyldInfo = 0x22,
    LcDyldInfoOnly = 0x22 | Self::LC_REQ_DYLD,
    LcLoadUpwardDylib = 0x23 | Self::LC_REQ_DYLD,
    LcVersionMinMacosx = 0x24,
    LcVersionMinIphoneos = 0x25,
    LcFunctionStarts = 0x26,
    LcDyldEnvironment = 0x27,
    LcMain = 0x28 | Self::LC_REQ_DYLD,
    LcDataInCode = 0x29,
    LcSourceVersion = 0x2a,
    LcDylibCodeSignDrs = 0x2b,
    LcEncryptionInfo64 = 0x2c,
    LcLinkerOption = 0x2d,
    LcLinkerOptimizationHint = 0x2e,
    LcVersionMinTvos = 0x2f,
    LcVersionMinWatchos = 0x30,
    LcNote = 0x31,
    LcBuildVersion = 0x32,
    LcDyldExportsTrie = 0x33 | Self::LC_REQ_DYLD,
    LcDyldChainedFixups = 0x34 | Self::LC_REQ_DYLD,
    LcFilesetEntry = 0x35 | Self::LC_REQ_DYLD,
    LcAtomInfo = 0x36,
}

impl LCLoadCommand {
    pub const LC_REQ_DYLD: u32 = 0x8000_0000;

    pub fn serialize(&self) -> Vec<u8> {
        (*self as u32).to_le_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mhmagic_parses_both_widths() {
        let bytes = 0xfeed_facfu32.to_le_bytes();
        let (_, magic) = MHMagic::parse(&bytes).unwrap();
        assert_eq!(magic, MHMagic::MhMagic64);
    }

    #[test]
    fn mhflags_parse_is_truncating() {
        let bytes = 0xffff_ffffu32.to_le_bytes();
        let (_, flags) = MHFlags::parse(&bytes).unwrap();
        assert!(flags.contains(MHFlags::PIE));
    }
}
