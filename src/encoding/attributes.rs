//! Property attribute-string parsing (§4.7): `T@"NSString",C,N,V_name` and friends.

use crate::diagnostic::Diagnostic;

use super::ast::TypeNode;
use super::parser::parse_type;

#[derive(Debug, Clone, Default)]
pub struct PropertyAttributes {
    pub type_encoding: Option<TypeNode>,
    pub readonly: bool,
    pub copy: bool,
    pub retain: bool,
    pub weak: bool,
    pub nonatomic: bool,
    pub getter: Option<String>,
    pub setter: Option<String>,
    pub dynamic: bool,
    pub gc_eligible: bool,
    pub backing_ivar: Option<String>,
}

/// Parses a comma-separated attribute string. Duplicate keys are recoverable: the first
/// occurrence wins and a diagnostic is appended to `diagnostics` (§4.7).
pub fn parse_property_attributes(raw: &str, diagnostics: &mut Vec<Diagnostic>) -> PropertyAttributes {
    let mut attrs = PropertyAttributes::default();
    let mut seen = std::collections::HashSet::new();

    for token in raw.split(',') {
        if token.is_empty() {
            continue;
        }
        let mut chars = token.chars();
        let key = match chars.next() {
            Some(k) => k,
            None => continue,
        };
        let payload = chars.as_str();

        if !seen.insert(key) {
            diagnostics.push(Diagnostic::recoverable(
                "encoding",
                format!("duplicate property attribute key '{key}', keeping first occurrence"),
            ));
            continue;
        }

        match key {
            'T' => attrs.type_encoding = parse_type(payload).ok().map(|(node, _)| node),
            'R' => attrs.readonly = true,
            'C' => attrs.copy = true,
            '&' => attrs.retain = true,
            'W' => attrs.weak = true,
            'N' => attrs.nonatomic = true,
            'G' => attrs.getter = Some(payload.to_string()),
            'S' => attrs.setter = Some(payload.to_string()),
            'D' => attrs.dynamic = true,
            'P' => attrs.gc_eligible = true,
            'V' => attrs.backing_ivar = Some(payload.to_string()),
            _ => {}
        }
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_attribute_string() {
        let mut diagnostics = Vec::new();
        let attrs = parse_property_attributes("T@\"NSString\",C,N,V_name", &mut diagnostics);
        assert!(attrs.copy);
        assert!(attrs.nonatomic);
        assert_eq!(attrs.backing_ivar.as_deref(), Some("_name"));
        assert!(diagnostics.is_empty());
        assert_eq!(attrs.type_encoding, Some(TypeNode::Id(Some("NSString".to_string()))));
    }

    #[test]
    fn duplicate_key_is_recoverable() {
        let mut diagnostics = Vec::new();
        let attrs = parse_property_attributes("N,N", &mut diagnostics);
        assert!(attrs.nonatomic);
        assert_eq!(diagnostics.len(), 1);
    }
}
