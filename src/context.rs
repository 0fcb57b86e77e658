//! `ProcessingContext`: the crate's single piece of explicitly-scoped mutable state (§4.9, §9).
//!
//! The teacher lineage cached parsed records in `lazy_static! { static ref CACHE: Mutex<HashMap<...>> }`
//! globals keyed by file offset — fine for a single-shot CLI process, but it cross-contaminates
//! results if more than one binary (or the same binary twice) is processed in one process. Every
//! cache that used to be a global here hangs off a `ProcessingContext` instead, created fresh per
//! top-level call into `process_objc`/`process_swift`/`visit` and never shared across runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::demangle::{DemangleCache, OutputStyle};
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::encoding::EncodingCache;

/// `file_offset -> interned_string`, populated by the C-string reader (§4.9).
#[derive(Default)]
struct StringTableCache {
    strings: Mutex<HashMap<u64, Arc<str>>>,
}

impl StringTableCache {
    fn intern(&self, offset: u64, value: &str) -> Arc<str> {
        let mut strings = self.strings.lock().unwrap();
        if let Some(existing) = strings.get(&offset) {
            return existing.clone();
        }
        let interned: Arc<str> = Arc::from(value);
        strings.insert(offset, interned.clone());
        interned
    }

    fn get(&self, offset: u64) -> Option<Arc<str>> {
        self.strings.lock().unwrap().get(&offset).cloned()
    }
}

/// `vm_address -> file_offset`, the memoized output of address translation (§4.9). Kept distinct
/// from the translator itself (`crate::cursor::AddressTranslator`), which does the actual
/// section-range binary search; this only avoids repeating that search for a hot address.
#[derive(Default)]
struct AddressTranslatorCache {
    entries: Mutex<HashMap<u64, u64>>,
}

impl AddressTranslatorCache {
    fn get_or_insert_with(&self, vmaddr: u64, f: impl FnOnce() -> Option<u64>) -> Option<u64> {
        if let Some(hit) = self.entries.lock().unwrap().get(&vmaddr) {
            return Some(*hit);
        }
        let value = f()?;
        self.entries.lock().unwrap().insert(vmaddr, value);
        Some(value)
    }
}

/// Owns every cache and registry for one call into `process_objc`/`process_swift`/`visit`.
/// Created fresh per top-level call; never shared across binaries or across runs.
pub struct ProcessingContext {
    pool: rayon::ThreadPool,
    strings: StringTableCache,
    address_translations: AddressTranslatorCache,
    encodings: EncodingCache,
    demangled: DemangleCache,
    diagnostics: Diagnostics,
    cancelled: AtomicBool,
}

impl ProcessingContext {
    /// Builds a context with a `rayon` thread pool sized to the core count (§4.9 default).
    pub fn new() -> Self {
        Self::with_threads(None)
    }

    /// Builds a context with an explicit thread-pool size; `None` defers to `rayon`'s default
    /// (core count).
    pub fn with_threads(threads: Option<usize>) -> Self {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().expect("failed to build processing thread pool");
        ProcessingContext {
            pool,
            strings: StringTableCache::default(),
            address_translations: AddressTranslatorCache::default(),
            encodings: EncodingCache::new(),
            demangled: DemangleCache::new(),
            diagnostics: Diagnostics::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Runs `f` inside the context's scoped thread pool (§4.9 "structured task pool").
    pub fn scope<'scope, F, R>(&'scope self, f: F) -> R
    where
        F: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(f)
    }

    pub fn intern_string(&self, offset: u64, value: &str) -> Arc<str> {
        self.strings.intern(offset, value)
    }

    pub fn cached_string(&self, offset: u64) -> Option<Arc<str>> {
        self.strings.get(offset)
    }

    /// Returns the cached file offset for `vmaddr`, computing and caching it via `translate` on a
    /// miss. `translate` returning `None` means the address isn't covered by any section and is
    /// not cached.
    pub fn translate_address(
        &self,
        vmaddr: u64,
        translate: impl FnOnce() -> Option<u64>,
    ) -> Option<u64> {
        self.address_translations.get_or_insert_with(vmaddr, translate)
    }

    pub fn encodings(&self) -> &EncodingCache {
        &self.encodings
    }

    pub fn demangle(&self, name: &str, style: OutputStyle) -> String {
        self.demangled.demangle(name, style)
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    /// Requests cancellation (§4.9): in-flight work units finish, but no new unit starts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for ProcessingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_cache_returns_same_allocation_on_hit() {
        let ctx = ProcessingContext::new();
        let first = ctx.intern_string(100, "NSObject");
        let second = ctx.intern_string(100, "ignored-on-hit");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*second, "NSObject");
    }

    #[test]
    fn address_translation_cache_only_calls_translate_once() {
        let ctx = ProcessingContext::new();
        let mut calls = 0;
        let mut lookup = || {
            calls += 1;
            Some(0x4000u64)
        };
        assert_eq!(ctx.translate_address(0x1000, &mut lookup), Some(0x4000));
        assert_eq!(ctx.translate_address(0x1000, &mut lookup), Some(0x4000));
        assert_eq!(calls, 1);
    }

    #[test]
    fn demangle_cache_is_reachable_through_context() {
        let ctx = ProcessingContext::new();
        assert_eq!(ctx.demangle("aGSi_", OutputStyle::Swift), "[Int]");
    }

    #[test]
    fn diagnostics_accumulate_across_the_run() {
        let ctx = ProcessingContext::new();
        ctx.record(Diagnostic::warning("objc", "placeholder"));
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn cancellation_flag_round_trips() {
        let ctx = ProcessingContext::new();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }
}
