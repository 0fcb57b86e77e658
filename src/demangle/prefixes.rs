//! Static prefix/lookup tables for the demangler (§4.8). These are read-only for the lifetime
//! of the process — the one legitimate remaining use of `lazy_static` after §9's "Deprecated
//! host lookups" move everything that changes per run into `ProcessingContext`.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStyle {
    /// Module-qualified, e.g. `any MyModule.MyProtocol`.
    Swift,
    /// Module stripped, e.g. `MyProtocol`.
    Objc,
    /// Mangled pass-through; used when the caller wants the raw symbol preserved.
    None,
}

lazy_static! {
    static ref CONCURRENCY: HashMap<&'static str, &'static str> = HashMap::from([
        ("ScT", "Task"),
        ("ScC", "CheckedContinuation"),
        ("ScU", "UnsafeContinuation"),
        ("ScS", "AsyncStream"),
        ("ScF", "AsyncThrowingStream"),
        ("ScA", "Actor"),
        ("ScM", "MainActor"),
        ("Scg", "TaskGroup"),
        ("ScP", "TaskPriority"),
    ]);

    static ref STDLIB_S_SUFFIX: HashMap<char, &'static str> = HashMap::from([
        ('i', "Int"),
        ('u', "UInt"),
        ('S', "String"),
        ('f', "Float"),
        ('d', "Double"),
        ('b', "Bool"),
        ('q', "Optional"),
    ]);
}

pub fn decode(input: &str, style: OutputStyle, depth: &mut u32, max_depth: u32) -> Option<String> {
    if *depth >= max_depth {
        return None;
    }

    if input.len() >= 3 {
        if let Some(name) = CONCURRENCY.get(&input[..3]) {
            let rest = &input[3..];
            if let Some(args_rest) = rest.strip_prefix('y') {
                if let Some(close) = args_rest.find('G') {
                    let arg_str = &args_rest[..close];
                    *depth += 1;
                    let arg = decode(arg_str, style, depth, max_depth).unwrap_or_else(|| arg_str.to_string());
                    return Some(format!("{name}<{arg}>"));
                }
            }
            return Some((*name).to_string());
        }
    }

    // Private-type mangling: P<digits>_<type> drops the private-discriminator.
    if let Some(rest) = input.strip_prefix('P') {
        let digit_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digit_len > 0 {
            if let Some(rest) = rest[digit_len..].strip_prefix('_') {
                return decode(rest, style, depth, max_depth);
            }
        }
    }

    // Stdlib container shorthand: a/h/D followed by a generic block `G...{_}`.
    if let Some(c) = input.chars().next() {
        if matches!(c, 'a' | 'h' | 'D') {
            let rest = &input[1..];
            if let Some(rest) = rest.strip_prefix('G') {
                if let Some(underscore) = rest.find('_') {
                    let inner = &rest[..underscore];
                    return Some(format_container(c, inner, style, depth, max_depth));
                }
            }
        }
    }

    // `S` + one-letter stdlib suffix (string/numeric/bool/optional types).
    if let Some(rest) = input.strip_prefix('S') {
        if let Some(c2) = rest.chars().next() {
            if let Some(name) = STDLIB_S_SUFFIX.get(&c2) {
                let after = &rest[1..];
                if *name == "Optional" && !after.is_empty() {
                    *depth += 1;
                    let inner = decode(after, style, depth, max_depth).unwrap_or_else(|| after.to_string());
                    return Some(format!("{inner}?"));
                }
                return Some((*name).to_string());
            }
        }
    }

    // `_Tt` / `$s` symbol openers for a nominal type: <kind><mod-len><mod><type-len><type>.
    for opener in ["_Tt", "$s"] {
        if let Some(rest) = input.strip_prefix(opener) {
            if let Some(result) = decode_nominal(rest, style) {
                return Some(result);
            }
        }
    }

    // Module-qualified protocol existential: <mod-len><mod><type-len><type>_p
    if let Some(stripped) = input.strip_suffix("_p") {
        if let Some((module, ty)) = decode_mod_qualified(stripped) {
            return Some(match style {
                OutputStyle::Objc => format!("any {ty}"),
                _ => format!("any {module}.{ty}"),
            });
        }
    }

    None
}

fn format_container(c: char, inner: &str, style: OutputStyle, depth: &mut u32, max_depth: u32) -> String {
    *depth += 1;
    match c {
        'a' => {
            let elem = decode(inner, style, depth, max_depth).unwrap_or_else(|| inner.to_string());
            format!("[{elem}]")
        }
        'h' => {
            let elem = decode(inner, style, depth, max_depth).unwrap_or_else(|| inner.to_string());
            format!("Set<{elem}>")
        }
        'D' => match inner.find('y') {
            Some(sep) => {
                let (k, v) = (&inner[..sep], &inner[sep + 1..]);
                let k = decode(k, style, depth, max_depth).unwrap_or_else(|| k.to_string());
                let v = decode(v, style, depth, max_depth).unwrap_or_else(|| v.to_string());
                format!("[{k}: {v}]")
            }
            None => format!("Dictionary<{inner}>"),
        },
        _ => inner.to_string(),
    }
}

fn take_length_prefixed(s: &str) -> Option<(&str, &str)> {
    let digit_len = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digit_len == 0 {
        return None;
    }
    let n: usize = s[..digit_len].parse().ok()?;
    let rest = &s[digit_len..];
    if rest.len() < n {
        return None;
    }
    Some((&rest[..n], &rest[n..]))
}

fn decode_mod_qualified(s: &str) -> Option<(String, String)> {
    let (module, rest) = take_length_prefixed(s)?;
    let (ty, _rest) = take_length_prefixed(rest)?;
    Some((module.to_string(), ty.to_string()))
}

fn decode_nominal(s: &str, style: OutputStyle) -> Option<String> {
    let mut chars = s.chars();
    let kind = chars.next()?;
    if !matches!(kind, 'C' | 'V' | 'O' | 'P') {
        return None;
    }
    let (module, ty) = decode_mod_qualified(chars.as_str())?;
    Some(match style {
        OutputStyle::Objc => ty,
        _ => format!("{module}.{ty}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_array_shorthand() {
        let mut depth = 0;
        assert_eq!(
            decode("aGSi_", OutputStyle::Swift, &mut depth, 10),
            Some("[Int]".to_string())
        );
    }

    #[test]
    fn decodes_dictionary_shorthand() {
        let mut depth = 0;
        assert_eq!(
            decode("DGSSySi__", OutputStyle::Swift, &mut depth, 10),
            Some("[String: Int]".to_string())
        );
    }

    #[test]
    fn decodes_nominal_class_swift_style() {
        let mut depth = 0;
        assert_eq!(
            decode("$sC6MyMod5Thing", OutputStyle::Swift, &mut depth, 10),
            Some("MyMod.Thing".to_string())
        );
    }

    #[test]
    fn decodes_nominal_class_objc_style() {
        let mut depth = 0;
        assert_eq!(
            decode("$sC6MyMod5Thing", OutputStyle::Objc, &mut depth, 10),
            Some("Thing".to_string())
        );
    }

    #[test]
    fn decodes_concurrency_task() {
        let mut depth = 0;
        assert_eq!(decode("ScT", OutputStyle::Swift, &mut depth, 10), Some("Task".to_string()));
    }
}
