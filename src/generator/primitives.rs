use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::error::Error;

/// How a lowered simple value behaves in the generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Text, carried through unparsed.
    String,
    /// Numeric value with a lexical-to-value conversion.
    Plain,
    Bool,
    /// Generated enum class; parsed via its `stringTo` function.
    Enum,
}

/// Lowering of one XSD built-in: the C++ type, the parse expression
/// template (`{}` marks the raw string), and whether the lexical form is
/// a whitespace-separated list.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub cpp_type: &'static str,
    pub parse_template: &'static str,
    pub kind: ValueKind,
    pub is_list: bool,
}

const fn primitive(
    cpp_type: &'static str,
    parse_template: &'static str,
    kind: ValueKind,
    is_list: bool,
) -> Primitive {
    Primitive {
        cpp_type,
        parse_template,
        kind,
        is_list,
    }
}

lazy_static! {
    /// Closed table over the XSD 1.0 built-in types (pt. 2, §3).
    static ref PREDEFINED_TYPES: HashMap<&'static str, Primitive> = {
        let mut table = HashMap::new();
        let string = primitive("std::string", "{}", ValueKind::String, false);
        for name in [
            "string", "token", "normalizedString", "language", "ENTITY", "ID", "IDREF",
            "Name", "NCName", "NMTOKEN", "anyURI", "anyType", "QName", "NOTATION",
            // Date/time and binary builtins stay textual; the generated
            // parser is non-validating.
            "date", "dateTime", "time", "duration", "gDay", "gMonth", "gYear",
            "gMonthDay", "gYearMonth", "base64Binary", "hexBinary",
        ] {
            table.insert(name, string.clone());
        }
        for name in ["ENTITIES", "IDREFS", "NMTOKENS"] {
            table.insert(name, primitive("std::string", "{}", ValueKind::String, true));
        }
        for name in ["decimal", "double"] {
            table.insert(name, primitive("double", "std::stod({})", ValueKind::Plain, false));
        }
        table.insert("float", primitive("float", "std::stof({})", ValueKind::Plain, false));
        for name in [
            "integer", "negativeInteger", "nonNegativeInteger", "positiveInteger",
            "nonPositiveInteger", "long",
        ] {
            table.insert(name, primitive("int64_t", "std::stoll({})", ValueKind::Plain, false));
        }
        table.insert(
            "unsignedLong",
            primitive("uint64_t", "std::stoull({})", ValueKind::Plain, false),
        );
        table.insert("int", primitive("int32_t", "std::stoi({})", ValueKind::Plain, false));
        table.insert(
            "unsignedInt",
            primitive("uint32_t", "static_cast<uint32_t>(std::stoul({}))", ValueKind::Plain, false),
        );
        table.insert(
            "short",
            primitive("int16_t", "static_cast<int16_t>(std::stoi({}))", ValueKind::Plain, false),
        );
        table.insert(
            "unsignedShort",
            primitive("uint16_t", "static_cast<uint16_t>(std::stoi({}))", ValueKind::Plain, false),
        );
        table.insert(
            "byte",
            primitive("int8_t", "static_cast<int8_t>(std::stoi({}))", ValueKind::Plain, false),
        );
        table.insert(
            "unsignedByte",
            primitive("uint8_t", "static_cast<uint8_t>(std::stoi({}))", ValueKind::Plain, false),
        );
        table.insert("boolean", primitive("bool", "({} == \"true\")", ValueKind::Bool, false));
        table
    };
}

/// Looks up an XSD built-in by local name.
pub fn predefined_type(local_name: &str) -> Result<&'static Primitive, Error> {
    PREDEFINED_TYPES
        .get(local_name)
        .ok_or_else(|| Error::UnknownBuiltin(local_name.to_string()))
}
