use std::collections::HashSet;

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToUpperCamelCase};

use crate::error::Error;

/// C++ keywords a sanitized variable name may land on.
const CPP_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue", "default",
    "delete", "do", "double", "else", "enum", "explicit", "export", "extern", "false", "float",
    "for", "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
    "operator", "private", "protected", "public", "register", "return", "short", "signed",
    "sizeof", "static", "struct", "switch", "template", "this", "throw", "true", "try",
    "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual", "void",
    "volatile", "while",
];

/// Member name reserved for the implicit enum sentinel.
pub const UNKNOWN_MEMBER: &str = "UNKNOWN";

/// Class name reserved for the runtime support of generated parsers.
pub const RESERVED_CLASS: &str = "XmlParser";

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A C++ identifier may not be empty or start with a digit.
fn guard(mut name: String) -> String {
    if name.is_empty() {
        name.push('_');
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// XML name to generated class name: UpperCamelCase over the sanitized
/// input.
pub fn to_class_name(name: &str) -> String {
    guard(sanitize(name).to_upper_camel_case())
}

/// XML name to member variable / parameter name: lowerCamelCase over the
/// sanitized input, with C++ keywords pushed out of the way.
pub fn to_variable_name(name: &str) -> String {
    let candidate = guard(sanitize(name).to_lower_camel_case());
    if CPP_KEYWORDS.contains(&candidate.as_str()) {
        return format!("{candidate}_");
    }
    candidate
}

/// Enumeration literal to enum member name: SHOUTY_SNAKE_CASE over the
/// sanitized input. A literal that sanitizes to the reserved sentinel
/// name is renamed.
pub fn to_enum_member_name(name: &str) -> String {
    let candidate = guard(sanitize(name).to_shouty_snake_case());
    if candidate == UNKNOWN_MEMBER {
        return format!("{UNKNOWN_MEMBER}_");
    }
    candidate
}

/// Package segment to namespace identifier: the segment is kept as
/// written apart from identifier hygiene.
pub fn to_namespace_segment(name: &str) -> String {
    guard(sanitize(name))
}

/// `get`/`has`/`getFirst` accessor suffix for a variable name.
pub fn accessor_suffix(variable_name: &str) -> String {
    let mut chars = variable_name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Tracks every generated class and enum name. The set is seeded with
/// the reserved parser support class; a duplicate insertion is fatal.
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        let mut names = HashSet::new();
        names.insert(RESERVED_CLASS.to_string());
        Self { names }
    }

    pub fn register(&mut self, name: &str) -> Result<(), Error> {
        if !self.names.insert(name.to_string()) {
            return Err(Error::NameCollision(name.to_string()));
        }
        Ok(())
    }
}
