//! The four concrete [`crate::visitor::Sink`] implementations (§6 "Output sinks").

pub mod json;
pub mod symbol_graph;
pub mod text_objc;
pub mod text_swift;

pub use json::JsonSink;
pub use symbol_graph::SymbolGraphSink;
pub use text_objc::TextObjcSink;
pub use text_swift::TextSwiftSink;
