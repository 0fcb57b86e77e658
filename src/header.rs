#![allow(dead_code)]
//! Mach-O file header (§3 "Mach-O file", §4.2).

use nom::IResult;

use crate::arch::CpuType;
use crate::flags::{MHFileType, MHFlags, MHMagic};

#[derive(Debug, Clone, Copy)]
pub struct MachHeader32 {
    pub magic: MHMagic,
    pub cputype: u32,
    pub cpusubtype: i32,
    pub filetype: MHFileType,
    pub ncmds: u32,
    pub sizeofcmds: u32,
    pub flags: MHFlags,
}

impl MachHeader32 {
    pub const SIZE: u32 = 28;

    pub fn parse(bytes: &[u8]) -> IResult<&[u8], MachHeader32> {
        let (bytes, magic) = MHMagic::parse(bytes)?;
        let (bytes, cputype) = nom::number::complete::le_u32(bytes)?;
        let (bytes, cpusubtype) = nom::number::complete::le_i32(bytes)?;
        let (bytes, filetype) = MHFileType::parse(bytes)?;
        let (bytes, ncmds) = nom::number::complete::le_u32(bytes)?;
        let (bytes, sizeofcmds) = nom::number::complete::le_u32(bytes)?;
        let (bytes, flags) = MHFlags::parse(bytes)?;

        Ok((
            bytes,
            MachHeader32 {
                magic,
                cputype,
                cpusubtype,
                filetype,
                ncmds,
                sizeofcmds,
                flags,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MachHeader64 {
    pub magic: MHMagic,
    pub cputype: u32,
    pub cpusubtype: i32,
    pub filetype: MHFileType,
    pub ncmds: u32,
    pub sizeofcmds: u32,
    pub flags: MHFlags,
    pub reserved: u32,
}

impl MachHeader64 {
    pub const SIZE: u32 = 32;

    pub fn parse(bytes: &[u8]) -> IResult<&[u8], MachHeader64> {
        let (bytes, magic) = MHMagic::parse(bytes)?;
        let (bytes, cputype) = nom::number::complete::le_u32(bytes)?;
        let (bytes, cpusubtype) = nom::number::complete::le_i32(bytes)?;
        let (bytes, filetype) = MHFileType::parse(bytes)?;
        let (bytes, ncmds) = nom::number::complete::le_u32(bytes)?;
        let (bytes, sizeofcmds) = nom::number::complete::le_u32(bytes)?;
        let (bytes, flags) = MHFlags::parse(bytes)?;
        let (bytes, reserved) = nom::number::complete::le_u32(bytes)?;

        Ok((
            bytes,
            MachHeader64 {
                magic,
                cputype,
                cpusubtype,
                filetype,
                ncmds,
                sizeofcmds,
                flags,
                reserved,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MachHeader {
    Header32(MachHeader32),
    Header64(MachHeader64),
}

impl MachHeader {
    pub fn parse(bytes: &[u8]) -> IResult<&[u8], MachHeader> {
        let (_, magic) = MHMagic::parse(bytes)?;
        match magic {
            MHMagic::MhMagic => {
                let (remaining, header) = MachHeader32::parse(bytes)?;
                Ok((remaining, MachHeader::Header32(header)))
            }
            MHMagic::MhMagic64 => {
                let (remaining, header) = MachHeader64::parse(bytes)?;
                Ok((remaining, MachHeader::Header64(header)))
            }
        }
    }

    pub fn magic(&self) -> MHMagic {
        match self {
            MachHeader::Header32(h) => h.magic,
            MachHeader::Header64(h) => h.magic,
        }
    }

    pub fn cputype(&self) -> u32 {
        match self {
            MachHeader::Header32(h) => h.cputype,
            MachHeader::Header64(h) => h.cputype,
        }
    }

    pub fn cpusubtype(&self) -> i32 {
        match self {
            MachHeader::Header32(h) => h.cpusubtype,
            MachHeader::Header64(h) => h.cpusubtype,
        }
    }

    pub fn filetype(&self) -> MHFileType {
        match self {
            MachHeader::Header32(h) => h.filetype,
            MachHeader::Header64(h) => h.filetype,
        }
    }

    pub fn ncmds(&self) -> u32 {
        match self {
            MachHeader::Header32(h) => h.ncmds,
            MachHeader::Header64(h) => h.ncmds,
        }
    }

    pub fn sizeofcmds(&self) -> u32 {
        match self {
            MachHeader::Header32(h) => h.sizeofcmds,
            MachHeader::Header64(h) => h.sizeofcmds,
        }
    }

    pub fn flags(&self) -> MHFlags {
        match self {
            MachHeader::Header32(h) => h.flags,
            MachHeader::Header64(h) => h.flags,
        }
    }

    /// Header size in bytes, as consumed from the start of the buffer (§4.2 load-command bound).
    pub fn size(&self) -> u32 {
        match self {
            MachHeader::Header32(_) => MachHeader32::SIZE,
            MachHeader::Header64(_) => MachHeader64::SIZE,
        }
    }

    pub fn is_64_bit(&self) -> bool {
        matches!(self, MachHeader::Header64(_))
    }

    pub fn cpu_type(&self) -> Option<CpuType> {
        CpuType::from_raw(self.cputype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header64(ncmds: u32, sizeofcmds: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(0xfeed_facfu32.to_le_bytes()); // MH_MAGIC_64
        bytes.extend(0x0100_000cu32.to_le_bytes()); // CPU_TYPE_ARM64
        bytes.extend(0i32.to_le_bytes()); // cpusubtype
        bytes.extend(2u32.to_le_bytes()); // MH_EXECUTE
        bytes.extend(ncmds.to_le_bytes());
        bytes.extend(sizeofcmds.to_le_bytes());
        bytes.extend(0u32.to_le_bytes()); // flags
        bytes.extend(0u32.to_le_bytes()); // reserved
        bytes
    }

    #[test]
    fn parses_64_bit_header() {
        let bytes = sample_header64(5, 512);
        let (_, header) = MachHeader::parse(&bytes).unwrap();
        assert!(header.is_64_bit());
        assert_eq!(header.ncmds(), 5);
        assert_eq!(header.sizeofcmds(), 512);
        assert_eq!(header.size(), 32);
    }
}
