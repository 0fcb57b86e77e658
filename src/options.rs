//! The crate's one configuration surface (§6 "Configuration options", §2 component 14): a plain
//! struct built with chainable setters, the teacher's preferred shape for configuration — no
//! config file format, no environment variables, no implicit global state.

use crate::demangle::OutputStyle as DemangleStyle;

/// Selects the rendering idiom for method declarations in a text sink (§6 "Method style").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodStyle {
    Objc,
    Swift,
}

/// Selects the overall text-sink dialect (§6 "output_style"), distinct from [`DemangleStyle`]:
/// this picks which of the two text sinks renders the model, not how a Swift name is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Objc,
    Swift,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub show_method_addresses: bool,
    pub show_ivar_offsets: bool,
    pub show_raw_types: bool,
    pub show_structures: bool,
    pub show_protocols: bool,
    pub hide_classes: bool,
    pub hide_protocols: bool,
    pub hide_structures: bool,
    pub sort_alphabetic: bool,
    pub sort_by_inheritance: bool,
    pub arch: Option<String>,
    pub demangle_style: DemangleStyle,
    pub method_style: MethodStyle,
    pub output_style: TextStyle,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            show_method_addresses: false,
            show_ivar_offsets: false,
            show_raw_types: false,
            show_structures: false,
            show_protocols: true,
            hide_classes: false,
            hide_protocols: false,
            hide_structures: false,
            sort_alphabetic: false,
            sort_by_inheritance: false,
            arch: None,
            demangle_style: DemangleStyle::Swift,
            method_style: MethodStyle::Objc,
            output_style: TextStyle::Objc,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_method_addresses(mut self, value: bool) -> Self {
        self.show_method_addresses = value;
        self
    }

    pub fn show_ivar_offsets(mut self, value: bool) -> Self {
        self.show_ivar_offsets = value;
        self
    }

    pub fn show_raw_types(mut self, value: bool) -> Self {
        self.show_raw_types = value;
        self
    }

    pub fn show_structures(mut self, value: bool) -> Self {
        self.show_structures = value;
        self
    }

    pub fn show_protocols(mut self, value: bool) -> Self {
        self.show_protocols = value;
        self
    }

    pub fn hide_classes(mut self, value: bool) -> Self {
        self.hide_classes = value;
        self
    }

    pub fn hide_protocols(mut self, value: bool) -> Self {
        self.hide_protocols = value;
        self
    }

    pub fn hide_structures(mut self, value: bool) -> Self {
        self.hide_structures = value;
        self
    }

    pub fn sort_alphabetic(mut self, value: bool) -> Self {
        self.sort_alphabetic = value;
        self
    }

    pub fn sort_by_inheritance(mut self, value: bool) -> Self {
        self.sort_by_inheritance = value;
        self
    }

    pub fn arch(mut self, name: impl Into<String>) -> Self {
        self.arch = Some(name.into());
        self
    }

    pub fn demangle_style(mut self, style: DemangleStyle) -> Self {
        self.demangle_style = style;
        self
    }

    pub fn method_style(mut self, style: MethodStyle) -> Self {
        self.method_style = style;
        self
    }

    pub fn output_style(mut self, style: TextStyle) -> Self {
        self.output_style = style;
        self
    }

    pub fn classes_visible(&self) -> bool {
        !self.hide_classes
    }

    pub fn protocols_visible(&self) -> bool {
        self.show_protocols && !self.hide_protocols
    }

    pub fn structures_visible(&self) -> bool {
        self.show_structures && !self.hide_structures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains_to_a_custom_options_value() {
        let options = Options::new()
            .show_method_addresses(true)
            .hide_protocols(true)
            .method_style(MethodStyle::Swift);
        assert!(options.show_method_addresses);
        assert!(!options.protocols_visible());
        assert_eq!(options.method_style, MethodStyle::Swift);
    }
}
