//! Resolves symbolic references inside a mangled Swift name (§4.5 "Symbolic references", §4.8).
//!
//! A mangled name is ordinarily a run of mangling-alphabet bytes terminated by `NUL`, but control
//! bytes `0x01..=0x17` switch to a symbolic reference: a following 4-byte relative offset naming
//! another context or protocol directly, rather than spelling it out. `0x01` and `0x02` are the
//! well-understood forms (direct and indirect-via-pointer); `0x09..=0x0c` (a handful of
//! less common referent kinds added in later runtimes) are resolved the same best-effort way as
//! `0x01`; anything else is recorded as unresolved rather than guessed at (Open Question (b)).

use crate::command::dyld_chained_fixup::ChainedFixups;
use crate::context::ProcessingContext;
use crate::demangle::OutputStyle;
use crate::macho::MachO;
use crate::objc::loader::read_pointer;
use crate::objc::PointerValue;

use super::descriptor::peek_type_name;

const MAX_SCAN_LEN: usize = 4096;
const DIRECT_MIN: u8 = 0x01;
const DIRECT_MAX: u8 = 0x17;
const INDIRECT: u8 = 0x02;
const BEST_EFFORT_MIN: u8 = 0x09;
const BEST_EFFORT_MAX: u8 = 0x0c;

fn resolve_reference(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    kind: u8,
    site_offset: u64,
    raw: i32,
) -> String {
    let target = (site_offset as i64 + raw as i64) as u64;
    let buf = macho.buffer();

    if kind == INDIRECT {
        return match read_pointer(macho, chained, target) {
            Ok(PointerValue::Bind(name)) => name,
            Ok(PointerValue::Rebase(vmaddr)) => macho
                .address_translator()
                .translate(vmaddr)
                .and_then(|offset| peek_type_name(buf, offset))
                .unwrap_or_else(|| format!("<unresolved:{vmaddr:#x}>")),
            Err(_) => format!("<unresolved:{kind:#04x}>"),
        };
    }

    if kind == DIRECT_MIN || (BEST_EFFORT_MIN..=BEST_EFFORT_MAX).contains(&kind) {
        return peek_type_name(buf, target).unwrap_or_else(|| format!("<unresolved:{kind:#04x}>"));
    }

    format!("<unresolved:{kind:#04x}>")
}

/// Reads the mangled name at `file_offset`, resolving every symbolic reference it contains, and
/// returns `(raw, demangled)`: `raw` is the on-disk bytes with each reference replaced by its
/// resolved text (useful for display even when demangling fails), `demangled` is that text run
/// through the demangler in `style`.
pub fn resolve_mangled_name(
    macho: &MachO,
    chained: Option<&ChainedFixups>,
    context: &ProcessingContext,
    file_offset: u64,
    style: OutputStyle,
) -> (String, String) {
    let buf = macho.buffer();
    let mut resolved = String::new();
    let mut literal = String::new();
    let mut i = file_offset as usize;
    let end = buf.len().min(file_offset as usize + MAX_SCAN_LEN);

    while i < end {
        let byte = buf[i];
        if byte == 0 {
            break;
        }
        if (DIRECT_MIN..=DIRECT_MAX).contains(&byte) {
            if !literal.is_empty() {
                resolved.push_str(&literal);
                literal.clear();
            }
            let Some(raw_bytes) = buf.get(i + 1..i + 5) else {
                resolved.push_str(&format!("<unresolved:{byte:#04x}>"));
                break;
            };
            let raw = i32::from_le_bytes(raw_bytes.try_into().unwrap());
            resolved.push_str(&resolve_reference(macho, chained, byte, (i + 1) as u64, raw));
            i += 5;
            continue;
        }
        literal.push(byte as char);
        i += 1;
    }

    if !literal.is_empty() {
        resolved.push_str(&literal);
    }

    let demangled = context.demangle(&resolved, style);
    (resolved, demangled)
}
