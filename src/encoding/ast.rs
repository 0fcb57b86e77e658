//! Parsed shape of an Objective-C type encoding (§4.6).

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// One of the single-character primitive codes (`c`, `i`, `f`, `v`, `*`, `#`, `:`, ...).
    Primitive(char),
    Pointer(Box<TypeNode>),
    Array {
        count: u32,
        element: Box<TypeNode>,
    },
    Struct {
        tag: String,
        members: Option<Vec<TypeNode>>,
    },
    Union {
        tag: String,
        members: Option<Vec<TypeNode>>,
    },
    Bitfield(u32),
    /// `@?`, optionally carrying an embedded block signature.
    Block(Option<MethodSignature>),
    /// `@`, optionally carrying the quoted class name or protocol list (e.g. `"NSString"`,
    /// `"<NSCopying><NSCoding>"`).
    Id(Option<String>),
    /// A character the grammar doesn't recognize; not an error (§4.6).
    UnknownCode(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub return_type: Box<TypeNode>,
    pub argument_types: Vec<TypeNode>,
}

/// Where a formatted type is being emitted, since the same [`TypeNode`] renders differently by
/// position (§4.6 "Formatter contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    TopLevel,
    Ivar,
    MethodReturn,
    MethodArg,
    StructMember,
    Property,
}
