//! Shared line-rendering helpers for the two text sinks (§6 sinks 1–2): parses a record's raw
//! type encoding on demand (no cache — the visitor runs once per call, unlike the parallel
//! loaders in `objc`/`swift`) and renders it in either dialect per [`crate::options::MethodStyle`].

use std::collections::HashSet;

use crate::encoding::ast::{MethodSignature, TypeNode};
use crate::encoding::{format_declaration, format_type, parse_method_encoding, parse_type, Role};
use crate::objc::{ObjcIvar, ObjcMethod, ObjcProperty};
use crate::options::{MethodStyle, Options};

use super::MethodKind;

fn parsed_method_signature(method: &ObjcMethod) -> Option<MethodSignature> {
    parse_method_encoding(&method.type_encoding).ok()
}

/// The encoding's `argument_types` always carries the implicit `self`/`_cmd` pair first; only
/// what follows is a user-visible argument (§4.6).
fn user_arguments(sig: &MethodSignature) -> &[TypeNode] {
    if sig.argument_types.len() >= 2 {
        &sig.argument_types[2..]
    } else {
        &[]
    }
}

pub fn format_ivar_line(ivar: &ObjcIvar, known: &HashSet<String>, options: &Options) -> String {
    let node = parse_type(&ivar.type_encoding)
        .map(|(node, _)| node)
        .unwrap_or(TypeNode::UnknownCode('?'));
    let mut line = format_declaration(&node, &ivar.name, Role::Ivar, known);
    line.push(';');
    if options.show_ivar_offsets {
        line.push_str(&format!(" // {:#x}", ivar.offset));
    }
    if options.show_raw_types {
        line.push_str(&format!(" /* {} */", ivar.type_encoding));
    }
    line
}

pub fn format_property_line(property: &ObjcProperty, known: &HashSet<String>, options: &Options) -> String {
    match options.method_style {
        MethodStyle::Objc => format_property_line_objc(property, known, options),
        MethodStyle::Swift => format_property_line_swift(property, options),
    }
}

fn format_property_line_objc(property: &ObjcProperty, known: &HashSet<String>, options: &Options) -> String {
    let attrs = &property.attributes;
    let mut flags = Vec::new();
    if attrs.copy {
        flags.push("copy");
    }
    if attrs.retain {
        flags.push("retain");
    }
    if attrs.weak {
        flags.push("weak");
    }
    if attrs.nonatomic {
        flags.push("nonatomic");
    }
    if attrs.readonly {
        flags.push("readonly");
    }
    let attr_part = if flags.is_empty() {
        String::new()
    } else {
        format!("({})", flags.join(", "))
    };
    let node = attrs.type_encoding.clone().unwrap_or(TypeNode::Id(None));
    let decl = format_declaration(&node, &property.name, Role::Property, known);
    let mut line = format!("@property{attr_part} {decl};");
    if options.show_raw_types {
        line.push_str(&format!(" /* {} */", property.raw_attributes));
    }
    line
}

fn format_property_line_swift(property: &ObjcProperty, _options: &Options) -> String {
    let attrs = &property.attributes;
    let node = attrs.type_encoding.clone().unwrap_or(TypeNode::Id(None));
    let accessors = if attrs.readonly { "{ get }" } else { "{ get set }" };
    format!("var {}: {} {accessors}", property.name, swift_type_name(&node))
}

pub fn format_method_line(method: &ObjcMethod, kind: MethodKind, known: &HashSet<String>, options: &Options) -> String {
    match options.method_style {
        MethodStyle::Objc => format_method_line_objc(method, kind, known, options),
        MethodStyle::Swift => format_method_line_swift(method, kind, options),
    }
}

fn format_method_line_objc(method: &ObjcMethod, kind: MethodKind, known: &HashSet<String>, options: &Options) -> String {
    let prefix = if kind == MethodKind::Class { '+' } else { '-' };
    let sig = parsed_method_signature(method);
    let return_rendered = sig
        .as_ref()
        .map(|s| format_type(&s.return_type, Role::MethodReturn, known))
        .unwrap_or_else(|| "id".to_string());

    let mut line = format!("{prefix} ({return_rendered})");
    if method.name.contains(':') {
        let parts: Vec<&str> = method.name.trim_end_matches(':').split(':').collect();
        let user_args: Vec<TypeNode> = sig
            .as_ref()
            .map(|s| user_arguments(s).to_vec())
            .unwrap_or_default();
        for (i, part) in parts.iter().enumerate() {
            let arg_type = user_args
                .get(i)
                .map(|t| format_type(t, Role::MethodArg, known))
                .unwrap_or_else(|| "id".to_string());
            line.push_str(&format!("{part}:({arg_type})arg{} ", i + 1));
        }
        line = line.trim_end().to_string();
    } else {
        line.push_str(&method.name);
    }
    line.push(';');
    if options.show_method_addresses {
        if let Some(address) = method.implementation {
            line.push_str(&format!(" // IMP={address:#x}"));
        }
    }
    if options.show_raw_types {
        line.push_str(&format!(" /* {} */", method.type_encoding));
    }
    line
}

fn format_method_line_swift(method: &ObjcMethod, kind: MethodKind, options: &Options) -> String {
    let sig = parsed_method_signature(method);
    let return_rendered = sig
        .as_ref()
        .map(|s| swift_type_name(&s.return_type))
        .unwrap_or_else(|| "Any".to_string());
    let prefix = if kind == MethodKind::Class { "static " } else { "" };

    let rendered = if method.name.contains(':') {
        let selector_parts: Vec<&str> = method.name.trim_end_matches(':').split(':').collect();
        let base = selector_parts.first().copied().unwrap_or(&method.name);
        let user_args: Vec<TypeNode> = sig
            .as_ref()
            .map(|s| user_arguments(s).to_vec())
            .unwrap_or_default();
        let args: Vec<String> = user_args
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let label = if i == 0 {
                    "_".to_string()
                } else {
                    selector_parts.get(i).map(|s| s.to_string()).unwrap_or_default()
                };
                format!("{label} arg{}: {}", i + 1, swift_type_name(node))
            })
            .collect();
        format!("{base}({})", args.join(", "))
    } else {
        format!("{}()", method.name)
    };

    let mut line = format!("{prefix}func {rendered} -> {return_rendered}");
    if options.show_method_addresses {
        if let Some(address) = method.implementation {
            line.push_str(&format!(" // IMP={address:#x}"));
        }
    }
    line
}

/// A deliberately partial ObjC-type-encoding → Swift-type-name bridge: enough to render the
/// common primitives, `id`, and pointer-to-known-class cases an `@objc`-exposed interface
/// actually uses, not a full bridging-header implementation.
pub fn swift_type_name(node: &TypeNode) -> String {
    match node {
        TypeNode::Primitive(c) => primitive_swift_name(*c).to_string(),
        TypeNode::Id(None) => "Any".to_string(),
        TypeNode::Id(Some(q)) if q.starts_with('<') => {
            let protocols = q.trim_start_matches('<').trim_end_matches('>').replace("><", " & ");
            format!("(any {protocols})?")
        }
        TypeNode::Id(Some(class)) => format!("{}?", bridged_class_name(class)),
        TypeNode::Pointer(inner) => match inner.as_ref() {
            TypeNode::Primitive('c') => "UnsafePointer<Int8>?".to_string(),
            TypeNode::Struct { tag, .. } if !tag.is_empty() => format!("UnsafeMutablePointer<{tag}>?"),
            other => format!("{}?", swift_type_name(other)),
        },
        TypeNode::Block(_) => "(() -> Void)?".to_string(),
        TypeNode::Struct { tag, .. } if !tag.is_empty() => tag.clone(),
        _ => "Any".to_string(),
    }
}

fn bridged_class_name(name: &str) -> &str {
    match name {
        "NSString" => "String",
        "NSArray" => "NSArray",
        "NSDictionary" => "NSDictionary",
        "NSNumber" => "NSNumber",
        other => other,
    }
}

fn primitive_swift_name(code: char) -> &'static str {
    match code {
        'c' => "Int8",
        'C' => "UInt8",
        's' => "Int16",
        'S' => "UInt16",
        'i' => "Int32",
        'I' => "UInt32",
        'l' => "Int",
        'L' => "UInt",
        'q' => "Int64",
        'Q' => "UInt64",
        'f' => "Float",
        'd' => "Double",
        'B' => "Bool",
        'v' => "Void",
        '*' => "UnsafePointer<Int8>?",
        '#' => "AnyClass",
        ':' => "Selector",
        _ => "Any",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objc::ObjcMethod;

    #[test]
    fn renders_objc_method_with_two_args() {
        let method = ObjcMethod {
            name: "doSomething:withValue:".to_string(),
            type_encoding: "@28@0:8@16i24".to_string(),
            implementation: None,
        };
        let options = Options::default();
        let known = HashSet::new();
        let line = format_method_line(&method, MethodKind::Instance, &known, &options);
        assert_eq!(line, "- (id)doSomething:(id)arg1 withValue:(int)arg2;");
    }

    #[test]
    fn renders_swift_method_with_two_args() {
        let method = ObjcMethod {
            name: "doSomething:withValue:".to_string(),
            type_encoding: "@28@0:8@16i24".to_string(),
            implementation: None,
        };
        let options = Options::default().method_style(MethodStyle::Swift);
        let line = format_method_line(&method, MethodKind::Instance, &HashSet::new(), &options);
        assert_eq!(line, "func doSomething(_ arg1: Any, withValue arg2: Int32) -> Any");
    }
}
