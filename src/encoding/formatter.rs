//! Renders a parsed [`TypeNode`] to canonical Objective-C source text (§4.6 "Formatter
//! contract").

use std::collections::HashSet;

use super::ast::{MethodSignature, Role, TypeNode};

/// Formats `node` as it would appear standing alone (an ivar type, a method return type, ...).
/// `known_structs` is the tag set already seen by the structure registry (§4.6): a pointer to a
/// known struct renders as `StructName *`, otherwise `struct StructName *`.
pub fn format_type(node: &TypeNode, role: Role, known_structs: &HashSet<String>) -> String {
    match node {
        TypeNode::Primitive(c) => primitive_name(*c).to_string(),
        TypeNode::Pointer(inner) => format_pointer(inner, known_structs),
        TypeNode::Array { count, element } => {
            format!("{}[{}]", format_type(element, role, known_structs), count)
        }
        TypeNode::Struct { tag, .. } => struct_type_name("struct", tag),
        TypeNode::Union { tag, .. } => struct_type_name("union", tag),
        TypeNode::Bitfield(width) => format!("unsigned int :{width}"),
        TypeNode::Block(sig) => format_block(sig.as_ref(), None, known_structs),
        TypeNode::Id(qualifier) => format_id(qualifier.as_deref()),
        TypeNode::UnknownCode(c) => format!("/* unknown({c}) */ void"),
    }
}

/// Formats `node` as a declaration of `name` — the only case this differs from [`format_type`]
/// is a block, whose name sits inside the `(^name)` group rather than after the type.
pub fn format_declaration(
    node: &TypeNode,
    name: &str,
    role: Role,
    known_structs: &HashSet<String>,
) -> String {
    if let TypeNode::Block(sig) = node {
        return format_block(sig.as_ref(), Some(name), known_structs);
    }
    if let TypeNode::Pointer(inner) = node {
        if let TypeNode::Block(sig) = inner.as_ref() {
            return format_block(sig.as_ref(), Some(name), known_structs);
        }
    }

    let rendered = format_type(node, role, known_structs);
    if rendered.ends_with('*') {
        format!("{rendered}{name}")
    } else {
        format!("{rendered} {name}")
    }
}

fn format_pointer(inner: &TypeNode, known_structs: &HashSet<String>) -> String {
    match inner {
        TypeNode::Primitive('c') => "char *".to_string(),
        TypeNode::Struct { tag, .. } => {
            if known_structs.contains(tag) {
                format!("{tag} *")
            } else {
                format!("struct {tag} *")
            }
        }
        TypeNode::Union { tag, .. } => format!("union {tag} *"),
        other => format!("{} *", format_type(other, Role::TopLevel, known_structs)),
    }
}

fn format_block(
    sig: Option<&MethodSignature>,
    name: Option<&str>,
    known_structs: &HashSet<String>,
) -> String {
    let name = name.unwrap_or("");
    match sig {
        Some(sig) => {
            let ret = format_type(&sig.return_type, Role::MethodReturn, known_structs);
            let args = sig
                .argument_types
                .iter()
                .map(|a| format_type(a, Role::MethodArg, known_structs))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{ret} (^{name})({args})")
        }
        None => format!("id (^{name})(void)"),
    }
}

fn format_id(qualifier: Option<&str>) -> String {
    match qualifier {
        None => "id".to_string(),
        Some(q) if q.starts_with('<') => format!("id<{}>", strip_angle_brackets(q)),
        Some(class) => format!("{class} *"),
    }
}

fn strip_angle_brackets(q: &str) -> String {
    q.trim_start_matches('<')
        .trim_end_matches('>')
        .replace("><", ", ")
}

fn struct_type_name(keyword: &str, tag: &str) -> String {
    if tag.is_empty() {
        format!("{keyword} {{anonymous}}")
    } else {
        format!("{keyword} {tag}")
    }
}

fn primitive_name(code: char) -> &'static str {
    match code {
        'c' => "char",
        'C' => "unsigned char",
        's' => "short",
        'S' => "unsigned short",
        'i' => "int",
        'I' => "unsigned int",
        'l' => "long",
        'L' => "unsigned long",
        'q' => "long long",
        'Q' => "unsigned long long",
        'f' => "float",
        'd' => "double",
        'B' => "bool",
        'v' => "void",
        '*' => "char *",
        '#' => "Class",
        ':' => "SEL",
        '?' => "void",
        _ => "void",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::parser::parse_type;

    #[test]
    fn formats_pointer_to_known_struct() {
        let known: HashSet<String> = ["CGRect".to_string()].into_iter().collect();
        let (node, _) = parse_type("^{CGRect=dddd}").unwrap();
        assert_eq!(format_type(&node, Role::Ivar, &known), "CGRect *");
    }

    #[test]
    fn formats_pointer_to_unknown_struct() {
        let known = HashSet::new();
        let (node, _) = parse_type("^{CGRect=dddd}").unwrap();
        assert_eq!(format_type(&node, Role::Ivar, &known), "struct CGRect *");
    }

    #[test]
    fn formats_id_with_protocols() {
        let known = HashSet::new();
        let (node, _) = parse_type("@\"<NSCopying><NSCoding>\"").unwrap();
        assert_eq!(format_type(&node, Role::Property, &known), "id<NSCopying, NSCoding>");
    }

    #[test]
    fn formats_block_declaration() {
        let known = HashSet::new();
        let (node, _) = parse_type("@?<v@i>").unwrap();
        assert_eq!(
            format_declaration(&node, "handler", Role::Property, &known),
            "void (^handler)(id, int)"
        );
    }
}
