#![allow(dead_code)]
//! Fat (universal) binary header and architecture table (§3 "Fat binary", §4.2).

use nom::IResult;

use crate::arch::Arch;
use crate::flags::FatMagic;

#[derive(Debug, Clone, Copy)]
pub struct FatHeader {
    pub magic: FatMagic,
    pub nfat_arch: u32,
}

impl FatHeader {
    pub const SIZE: usize = 8;

    pub fn parse(input: &[u8]) -> IResult<&[u8], FatHeader> {
        let (input, magic) = FatMagic::parse(input)?;
        let (input, nfat_arch) = nom::number::complete::be_u32(input)?;

        Ok((input, FatHeader { magic, nfat_arch }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FatArch32 {
    pub cputype: u32,
    pub cpusubtype: i32,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

impl FatArch32 {
    pub const SIZE: usize = 20;

    pub fn parse(input: &[u8]) -> IResult<&[u8], FatArch32> {
        let (input, cputype) = nom::number::complete::be_u32(input)?;
        let (input, cpusubtype) = nom::number::complete::be_i32(input)?;
        let (input, offset) = nom::number::complete::be_u32(input)?;
        let (input, size) = nom::number::complete::be_u32(input)?;
        let (input, align) = nom::number::complete::be_u32(input)?;

        Ok((
            input,
            FatArch32 {
                cputype,
                cpusubtype,
                offset,
                size,
                align,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FatArch64 {
    pub cputype: u32,
    pub cpusubtype: i32,
    pub offset: u64,
    pub size: u64,
    pub align: u32,
    pub reserved: u32,
}

impl FatArch64 {
    pub const SIZE: usize = 32;

    pub fn parse(input: &[u8]) -> IResult<&[u8], FatArch64> {
        let (input, cputype) = nom::number::complete::be_u32(input)?;
        let (input, cpusubtype) = nom::number::complete::be_i32(input)?;
        let (input, offset) = nom::number::complete::be_u64(input)?;
        let (input, size) = nom::number::complete::be_u64(input)?;
        let (input, align) = nom::number::complete::be_u32(input)?;
        let (input, reserved) = nom::number::complete::be_u32(input)?;

        Ok((
            input,
            FatArch64 {
                cputype,
                cpusubtype,
                offset,
                size,
                align,
                reserved,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FatArch {
    Arch32(FatArch32),
    Arch64(FatArch64),
}

impl FatArch {
    pub fn parse(input: &[u8], magic: FatMagic) -> IResult<&[u8], FatArch> {
        match magic {
            FatMagic::Fat => {
                let (input, arch) = FatArch32::parse(input)?;
                Ok((input, FatArch::Arch32(arch)))
            }
            FatMagic::Fat64 => {
                let (input, arch) = FatArch64::parse(input)?;
                Ok((input, FatArch::Arch64(arch)))
            }
        }
    }

    pub fn cputype(&self) -> u32 {
        match self {
            FatArch::Arch32(arch) => arch.cputype,
            FatArch::Arch64(arch) => arch.cputype,
        }
    }

    pub fn cpusubtype(&self) -> i32 {
        match self {
            FatArch::Arch32(arch) => arch.cpusubtype,
            FatArch::Arch64(arch) => arch.cpusubtype,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            FatArch::Arch32(arch) => arch.offset as u64,
            FatArch::Arch64(arch) => arch.offset,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            FatArch::Arch32(arch) => arch.size as u64,
            FatArch::Arch64(arch) => arch.size,
        }
    }

    pub fn align(&self) -> u32 {
        match self {
            FatArch::Arch32(arch) => arch.align,
            FatArch::Arch64(arch) => arch.align,
        }
    }

    pub fn arch(&self) -> Arch {
        Arch {
            cputype: self.cputype(),
            cpusubtype: self.cpusubtype(),
        }
    }
}

/// A parsed fat header plus its architecture table (§3 "Fat binary").
#[derive(Debug, Clone)]
pub struct FatHeaderTable {
    pub header: FatHeader,
    pub archs: Vec<FatArch>,
}

impl FatHeaderTable {
    pub fn parse(input: &[u8]) -> IResult<&[u8], FatHeaderTable> {
        let (mut input, header) = FatHeader::parse(input)?;
        let mut archs = Vec::with_capacity(header.nfat_arch as usize);
        for _ in 0..header.nfat_arch {
            let (rest, arch) = FatArch::parse(input, header.magic)?;
            archs.push(arch);
            input = rest;
        }
        Ok((input, FatHeaderTable { header, archs }))
    }

    /// Best-matching slice for `target`, per [`Arch::best_match`] (§4.2).
    pub fn best_match(&self, target: &Arch) -> Option<&FatArch> {
        let candidates: Vec<Arch> = self.archs.iter().map(FatArch::arch).collect();
        let best = Arch::best_match(&candidates, target)?;
        self.archs.iter().find(|a| a.arch() == *best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fat_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xcafe_babeu32.to_be_bytes()); // FAT_MAGIC
        bytes.extend(2u32.to_be_bytes()); // nfat_arch
        // arm64 slice
        bytes.extend(0x0100_000cu32.to_be_bytes());
        bytes.extend(0i32.to_be_bytes());
        bytes.extend(0x4000u32.to_be_bytes());
        bytes.extend(0x1000u32.to_be_bytes());
        bytes.extend(14u32.to_be_bytes());
        // x86_64 slice
        bytes.extend(0x0100_0007u32.to_be_bytes());
        bytes.extend(3i32.to_be_bytes());
        bytes.extend(0x5000u32.to_be_bytes());
        bytes.extend(0x1000u32.to_be_bytes());
        bytes.extend(14u32.to_be_bytes());
        bytes
    }

    #[test]
    fn parses_fat_header_and_archs() {
        let bytes = sample_fat_bytes();
        let (_, table) = FatHeaderTable::parse(&bytes).unwrap();
        assert_eq!(table.archs.len(), 2);
        assert_eq!(table.archs[0].offset(), 0x4000);
    }

    #[test]
    fn best_match_prefers_exact_arch() {
        let bytes = sample_fat_bytes();
        let (_, table) = FatHeaderTable::parse(&bytes).unwrap();
        let target = Arch::from_name("x86_64").unwrap();
        let matched = table.best_match(&target).unwrap();
        assert_eq!(matched.offset(), 0x5000);
    }
}
