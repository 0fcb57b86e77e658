//! Bit layouts for `__objc_imageinfo` and method-list headers (§4.4).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjCImageInfoFlags: u32 {
        const IS_REPLACEMENT = 1 << 0;
        const SUPPORTS_GC = 1 << 1;
        const REQUIRES_GC = 1 << 2;
        const OPTIMIZED_BY_DYLD = 1 << 3;
        const CORRECTED_SYNTHESIZE = 1 << 4;
        const IS_SIMULATED = 1 << 5;
        const HAS_CATEGORY_CLASS_PROPERTIES = 1 << 6;
        const OPTIMIZED_BY_DYLD_CLOSURE = 1 << 31;
    }
}

pub const SWIFT_STABLE_VERSION_MASK: u32 = 0xff << 16;
pub const SWIFT_UNSTABLE_VERSION_MASK: u32 = 0xff << 8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodListFlags: u32 {
        const UNIQUED = 1 << 0;
        const SORTED = 1 << 1;
        const RELATIVE_SELECTORS_ARE_DIRECT = 0x4000_0000;
        const SMALL_METHOD_LIST = 0x8000_0000;
    }
}

/// `entsize_and_flags` packs a 16-bit entry size into the low bits and flag bits above it;
/// `SIZE_MASK` isolates the entry size, `FLAGS_MASK` the recognized flag bits.
pub const METHOD_LIST_FLAGS_MASK: u32 = 0xFFFF_0003;
pub const METHOD_LIST_SIZE_MASK: u32 = 0x0000_FFFC;

/// Low bits of a class's `data` field that distinguish Swift ABI generations, per §4.4 "Class
/// record (64-bit layout)".
pub const CLASS_DATA_FAST_IS_SWIFT_STABLE: u64 = 0x1;
pub const CLASS_DATA_FAST_IS_SWIFT_LEGACY: u64 = 0x2;
pub const CLASS_DATA_FAST_MASK: u64 = !0x3;
