//! Objective-C type-encoding lexer, parser, and formatter (§4.6, §4.7).
//!
//! Unlike the rest of the crate, this grammar is line-oriented ASCII text embedded in a Mach-O
//! (a selector's `@encode`-style string), not a binary layout, so the parser works over `&str`
//! with a small hand-rolled recursive descent rather than `nom`'s byte combinators.

pub mod ast;
pub mod attributes;
pub mod formatter;
pub mod parser;

pub use ast::{MethodSignature, Role, TypeNode};
pub use attributes::{parse_property_attributes, PropertyAttributes};
pub use formatter::{format_declaration, format_type};
pub use parser::{parse_method_encoding, parse_type};

use std::collections::HashMap;
use std::sync::Mutex;

/// Memoizes [`parse_type`] and [`parse_method_encoding`] by their raw encoding string (§4.6
/// "Caches"), scoped into one [`crate::context::ProcessingContext`] rather than a process-wide
/// static.
#[derive(Default)]
pub struct EncodingCache {
    types: Mutex<HashMap<String, TypeNode>>,
    methods: Mutex<HashMap<String, MethodSignature>>,
}

impl EncodingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&self, encoding: &str) -> crate::error::Result<TypeNode> {
        if let Some(node) = self.types.lock().unwrap().get(encoding) {
            return Ok(node.clone());
        }
        let (node, _) = parse_type(encoding)?;
        self.types
            .lock()
            .unwrap()
            .insert(encoding.to_string(), node.clone());
        Ok(node)
    }

    pub fn method_of(&self, encoding: &str) -> crate::error::Result<MethodSignature> {
        if let Some(sig) = self.methods.lock().unwrap().get(encoding) {
            return Ok(sig.clone());
        }
        let sig = parse_method_encoding(encoding)?;
        self.methods
            .lock()
            .unwrap()
            .insert(encoding.to_string(), sig.clone());
        Ok(sig)
    }
}
