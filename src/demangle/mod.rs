//! Swift name demangler (§4.8): a hand-written prefix decoder, not a full mangling-grammar
//! parser — sufficient to recover readable type names from symbolic references and metadata
//! descriptors.

mod prefixes;
mod validate;

use std::collections::HashMap;
use std::sync::Mutex;

pub use prefixes::OutputStyle;

const MAX_GENERIC_DEPTH: u32 = 10;

/// Per-run memoization cache (§4.9), keyed by the raw mangled name — never a process-wide
/// static, unlike the small lookup tables in [`prefixes`].
#[derive(Default)]
pub struct DemangleCache {
    cache: Mutex<HashMap<(String, OutputStyle), String>>,
}

impl DemangleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn demangle(&self, name: &str, style: OutputStyle) -> String {
        let key = (name.to_string(), style);
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            return hit.clone();
        }
        let result = demangle(name, style);
        self.cache.lock().unwrap().insert(key, result.clone());
        result
    }
}

/// Demangles `name` in isolation (no cache). [`DemangleCache::demangle`] is the path processing
/// code should use; this is exposed for tests and one-off callers.
pub fn demangle(name: &str, style: OutputStyle) -> String {
    let mut depth = 0;
    let decoded = prefixes::decode(name, style, &mut depth, MAX_GENERIC_DEPTH);
    match decoded {
        Some(text) if validate::looks_fully_demangled(&text) => text,
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdlib_array_type_demangles() {
        assert_eq!(demangle("aGSi_", OutputStyle::Swift), "[Int]");
    }

    #[test]
    fn unrecognized_name_falls_back_to_raw() {
        assert_eq!(demangle("totally_not_mangled", OutputStyle::Swift), "totally_not_mangled");
    }

    #[test]
    fn cache_returns_same_result_as_direct_call() {
        let cache = DemangleCache::new();
        let direct = demangle("aGSi_", OutputStyle::Swift);
        assert_eq!(cache.demangle("aGSi_", OutputStyle::Swift), direct);
        assert_eq!(cache.demangle("aGSi_", OutputStyle::Swift), direct);
    }
}
