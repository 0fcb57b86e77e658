//! Recursive-descent parser for the type-encoding grammar (§4.6).

use crate::error::{Error, Result};

use super::ast::{MethodSignature, TypeNode};

const PRIMITIVES: &[char] = &[
    'c', 'C', 's', 'S', 'i', 'I', 'l', 'L', 'q', 'Q', 'f', 'd', 'B', 'v', '*', '#', ':', '?',
];

/// Parses one [`TypeNode`] from the front of `input`, returning the node and the unconsumed
/// remainder.
pub fn parse_type(input: &str) -> Result<(TypeNode, &str)> {
    let mut chars = input.chars();
    let first = chars.next().ok_or(Error::InvalidEncoding)?;
    let rest = chars.as_str();

    match first {
        '^' => {
            let (inner, rest) = parse_type(rest)?;
            Ok((TypeNode::Pointer(Box::new(inner)), rest))
        }
        '[' => parse_array(rest),
        '{' => parse_aggregate(rest, '}', TypeNode::Struct {
            tag: String::new(),
            members: None,
        }),
        '(' => parse_aggregate(rest, ')', TypeNode::Union {
            tag: String::new(),
            members: None,
        }),
        'b' => {
            let (digits, rest) = take_digits(rest);
            let width: u32 = digits.parse().map_err(|_| Error::InvalidEncoding)?;
            Ok((TypeNode::Bitfield(width), rest))
        }
        '@' => parse_id_or_block(rest),
        c if PRIMITIVES.contains(&c) => Ok((TypeNode::Primitive(c), rest)),
        c => Ok((TypeNode::UnknownCode(c), rest)),
    }
}

fn parse_array(input: &str) -> Result<(TypeNode, &str)> {
    let (digits, rest) = take_digits(input);
    let count: u32 = digits.parse().map_err(|_| Error::InvalidEncoding)?;
    let (element, rest) = parse_type(rest)?;
    let rest = expect(rest, ']')?;
    Ok((
        TypeNode::Array {
            count,
            element: Box::new(element),
        },
        rest,
    ))
}

/// Shared shape of `{tag=members}` and `(tag=members)`: reads the tag up to `=` or the closing
/// delimiter, then (if `=` was present) member types until the delimiter.
fn parse_aggregate<'a>(input: &'a str, close: char, template: TypeNode) -> Result<(TypeNode, &'a str)> {
    let tag_end = input
        .find(|c| c == '=' || c == close)
        .ok_or(Error::InvalidEncoding)?;
    let tag = input[..tag_end].to_string();
    let mut rest = &input[tag_end..];

    let members = if rest.starts_with('=') {
        rest = &rest[1..];
        let mut members = Vec::new();
        while !rest.starts_with(close) {
            let (member, next) = parse_type(rest)?;
            members.push(member);
            rest = next;
        }
        Some(members)
    } else {
        None
    };

    let rest = expect(rest, close)?;
    let node = match template {
        TypeNode::Struct { .. } => TypeNode::Struct { tag, members },
        TypeNode::Union { .. } => TypeNode::Union { tag, members },
        other => other,
    };
    Ok((node, rest))
}

fn parse_id_or_block(input: &str) -> Result<(TypeNode, &str)> {
    if let Some(rest) = input.strip_prefix('?') {
        // Block: @? optionally followed by <embedded-signature>.
        if let Some(rest) = rest.strip_prefix('<') {
            let end = rest.find('>').ok_or(Error::InvalidEncoding)?;
            let sig_str = &rest[..end];
            let rest = &rest[end + 1..];
            let sig = parse_method_signature_str(sig_str)?;
            return Ok((TypeNode::Block(Some(sig)), rest));
        }
        return Ok((TypeNode::Block(None), rest));
    }

    if let Some(rest) = input.strip_prefix('"') {
        let end = rest.find('"').ok_or(Error::InvalidEncoding)?;
        let name = rest[..end].to_string();
        return Ok((TypeNode::Id(Some(name)), &rest[end + 1..]));
    }

    Ok((TypeNode::Id(None), input))
}

/// Parses a bare sequence of types (no byte-offset digits) — the form embedded inside `@?<...>`.
fn parse_method_signature_str(input: &str) -> Result<MethodSignature> {
    let (return_type, mut rest) = parse_type(input)?;
    let mut argument_types = Vec::new();
    while !rest.is_empty() {
        let (arg, next) = parse_type(rest)?;
        argument_types.push(arg);
        rest = next;
    }
    Ok(MethodSignature {
        return_type: Box::new(return_type),
        argument_types,
    })
}

/// Parses a full Objective-C method type encoding, e.g. `v24@0:8@16` — each type is followed by
/// a decimal stack-offset that this parser discards (§4.6).
pub fn parse_method_encoding(input: &str) -> Result<MethodSignature> {
    let (return_type, rest) = parse_type(input)?;
    let (_, mut rest) = take_digits(rest);

    let mut argument_types = Vec::new();
    while !rest.is_empty() {
        let (arg, next) = parse_type(rest)?;
        let (_, next) = take_digits(next);
        argument_types.push(arg);
        rest = next;
    }

    Ok(MethodSignature {
        return_type: Box::new(return_type),
        argument_types,
    })
}

fn take_digits(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    (&input[..end], &input[end..])
}

fn expect(input: &str, c: char) -> Result<&str> {
    input.strip_prefix(c).ok_or(Error::InvalidEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive() {
        let (node, rest) = parse_type("i").unwrap();
        assert_eq!(node, TypeNode::Primitive('i'));
        assert_eq!(rest, "");
    }

    #[test]
    fn parses_pointer_to_struct() {
        let (node, rest) = parse_type("^{CGRect={CGPoint=dd}{CGSize=dd}}").unwrap();
        assert_eq!(rest, "");
        match node {
            TypeNode::Pointer(inner) => match *inner {
                TypeNode::Struct { tag, members } => {
                    assert_eq!(tag, "CGRect");
                    assert_eq!(members.unwrap().len(), 2);
                }
                _ => panic!("expected struct"),
            },
            _ => panic!("expected pointer"),
        }
    }

    #[test]
    fn parses_id_with_protocol() {
        let (node, rest) = parse_type("@\"<NSCopying>\"").unwrap();
        assert_eq!(rest, "");
        assert_eq!(node, TypeNode::Id(Some("<NSCopying>".to_string())));
    }

    #[test]
    fn parses_block_signature() {
        let (node, rest) = parse_type("@?<v@?@>").unwrap();
        assert_eq!(rest, "");
        match node {
            TypeNode::Block(Some(sig)) => {
                assert_eq!(*sig.return_type, TypeNode::Primitive('v'));
                assert_eq!(sig.argument_types.len(), 2);
            }
            _ => panic!("expected block with signature"),
        }
    }

    #[test]
    fn parses_full_method_encoding() {
        let sig = parse_method_encoding("v24@0:8@16").unwrap();
        assert_eq!(*sig.return_type, TypeNode::Primitive('v'));
        assert_eq!(sig.argument_types.len(), 3);
        assert_eq!(sig.argument_types[0], TypeNode::Id(None));
        assert_eq!(sig.argument_types[1], TypeNode::Primitive(':'));
        assert_eq!(sig.argument_types[2], TypeNode::Id(None));
    }

    #[test]
    fn unknown_primitive_is_not_an_error() {
        let (node, rest) = parse_type("%").unwrap();
        assert_eq!(node, TypeNode::UnknownCode('%'));
        assert_eq!(rest, "");
    }
}
