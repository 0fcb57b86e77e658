//! CPU architecture identification (§3 "Architecture slice", §9 "Deprecated host lookups").

#![allow(non_camel_case_types)]

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

#[repr(u32)]
#[derive(Debug, Copy, Clone, FromPrimitive)]
pub enum CpuAbi {
    Abi64 = 0x0100_0000,
    Abi6432 = 0x0200_0000,
}

impl CpuAbi {
    pub const MASK: u32 = 0xff00_0000;
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum CpuType {
    Any = 0,
    Vax = 1,
    Mc680x0 = 6,
    I386 = 7,
    X86_64 = 7 | CpuAbi::Abi64 as u32,
    Mc98000 = 10,
    Hppa = 11,
    Arm = 12,
    Arm64 = 12 | CpuAbi::Abi64 as u32,
    Arm64_32 = 12 | CpuAbi::Abi6432 as u32,
    Mc88000 = 13,
    Sparc = 14,
    I860 = 15,
    PowerPC = 18,
    PowerPC64 = 18 | CpuAbi::Abi64 as u32,
}

impl CpuType {
    pub fn from_raw(value: u32) -> Option<Self> {
        Self::from_u32(value)
    }

    pub fn is_64_bit(self) -> bool {
        (self as u32) & CpuAbi::MASK != 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Arch {
    pub cputype: u32,
    pub cpusubtype: i32,
}

impl Arch {
    pub const CPU_SUBTYPE_MASK: u32 = 0xff00_0000;

    pub fn masked_subtype(&self) -> u32 {
        (self.cpusubtype as u32) & !Self::CPU_SUBTYPE_MASK
    }

    pub fn matches(&self, other: &Arch) -> bool {
        self.cputype == other.cputype && self.masked_subtype() == other.masked_subtype()
    }

    pub fn is_64_bit(&self) -> bool {
        self.cputype & CpuAbi::MASK != 0
    }

    /// Built-in name table for the common architectures (§9: no process/platform lookup).
    pub fn name(&self) -> String {
        let masked = self.masked_subtype();
        match (self.cputype, masked) {
            (c, s) if c == CpuType::X86_64 as u32 => {
                if s == 8 {
                    "x86_64h".to_string()
                } else {
                    "x86_64".to_string()
                }
            }
            (c, _) if c == CpuType::I386 as u32 => "i386".to_string(),
            (c, s) if c == CpuType::Arm64 as u32 => {
                if s == 2 {
                    "arm64e".to_string()
                } else {
                    "arm64".to_string()
                }
            }
            (c, _) if c == CpuType::Arm64_32 as u32 => "arm64_32".to_string(),
            (c, s) if c == CpuType::Arm as u32 => match s {
                9 => "armv7".to_string(),
                11 => "armv7s".to_string(),
                12 => "armv7k".to_string(),
                13 => "armv8".to_string(),
                _ => format!("arm(subtype={s})"),
            },
            (c, _) => format!("unknown(cputype={c:#x},subtype={masked:#x})", masked = masked),
        }
    }

    /// Inverse of [`Arch::name`] for the well-known architectures.
    pub fn from_name(name: &str) -> Option<Arch> {
        let (cputype, cpusubtype) = match name {
            "x86_64" => (CpuType::X86_64 as u32, 3),
            "x86_64h" => (CpuType::X86_64 as u32, 8),
            "i386" => (CpuType::I386 as u32, 3),
            "arm64" => (CpuType::Arm64 as u32, 0),
            "arm64e" => (CpuType::Arm64 as u32, 2),
            "arm64_32" => (CpuType::Arm64_32 as u32, 0),
            "armv7" => (CpuType::Arm as u32, 9),
            "armv7s" => (CpuType::Arm as u32, 11),
            "armv7k" => (CpuType::Arm as u32, 12),
            _ => return None,
        };
        Some(Arch { cputype, cpusubtype })
    }

    /// Best-match selection among a set of candidate arches (§4.2).
    ///
    /// Priority: exact target match, then any 64-bit arch, then any 32-bit arch, then the first
    /// entry in the list.
    pub fn best_match<'a>(candidates: &'a [Arch], target: &Arch) -> Option<&'a Arch> {
        if let Some(exact) = candidates.iter().find(|a| a.matches(target)) {
            return Some(exact);
        }
        if let Some(any64) = candidates.iter().find(|a| a.is_64_bit()) {
            return Some(any64);
        }
        if let Some(any32) = candidates.iter().find(|a| !a.is_64_bit()) {
            return Some(any32);
        }
        candidates.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_naming_scenarios() {
        // §8 scenario 1
        assert_eq!(
            Arch {
                cputype: 0x0100_0007,
                cpusubtype: 3
            }
            .name(),
            "x86_64"
        );
        assert_eq!(
            Arch {
                cputype: 0x0100_000c,
                cpusubtype: 2
            }
            .name(),
            "arm64e"
        );
        let armv7s = Arch::from_name("armv7s").unwrap();
        assert_eq!(armv7s.cputype, 0x0c);
        assert_eq!(armv7s.cpusubtype, 11);
    }

    #[test]
    fn fat_best_match_scenarios() {
        // §8 scenario 2
        let x86_64 = Arch::from_name("x86_64").unwrap();
        let arm64 = Arch::from_name("arm64").unwrap();
        let arm64e = Arch::from_name("arm64e").unwrap();
        let candidates = vec![x86_64, arm64, arm64e];

        let matched = Arch::best_match(&candidates, &arm64).unwrap();
        assert_eq!(matched.name(), "arm64");

        // no armv7 slice present: falls back to "any 64-bit"
        let armv7 = Arch::from_name("armv7").unwrap();
        let matched = Arch::best_match(&candidates, &armv7).unwrap();
        assert!(matched.is_64_bit());
    }
}
