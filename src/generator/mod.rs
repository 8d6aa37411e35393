pub mod naming;
pub mod primitives;
pub mod resolver;

mod cpp;

use crate::error::Error;
use crate::xsd::Schema;

/// Knobs of the C++ backend, filled from the command line.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Dot-separated package; becomes the nested namespace and the
    /// output file stem.
    pub package: String,
    /// Also emit writing code.
    pub writer: bool,
    /// `isX()` instead of `getX()` for boolean-typed members.
    pub boolean_getter: bool,
    /// Target tinyxml2 instead of libxml2.
    pub tinyxml: bool,
    /// Populate only the enum file pair.
    pub enums_only: bool,
    /// Populate only the parser file pair.
    pub parser_only: bool,
    /// Root elements to derive entrypoints from; empty means the
    /// schema's single top-level element.
    pub roots: Vec<String>,
}

/// The four generated translation units. Pairs not selected by the
/// emission mode stay empty; the caller still writes them out so build
/// systems always see the same file set.
#[derive(Clone, Debug, Default)]
pub struct GeneratedFiles {
    pub file_stem: String,
    pub parser_header: String,
    pub parser_impl: String,
    pub enums_header: String,
    pub enums_impl: String,
}

pub fn generate(schema: &Schema, options: &Options) -> Result<GeneratedFiles, Error> {
    cpp::CppGenerator::new(schema, options).generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(xml: &str) -> Schema {
        let doc = roxmltree::Document::parse(xml).unwrap();
        Schema::map_from_xml(doc.root_element()).unwrap()
    }

    fn options() -> Options {
        Options {
            package: "com.example.config".to_string(),
            writer: true,
            ..Options::default()
        }
    }

    fn generate_or_fail(xml: &str, options: &Options) -> GeneratedFiles {
        generate(&schema(xml), options).unwrap()
    }

    #[test]
    fn minimal_scalar_root() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="greeting" type="xs:string"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("#ifndef COM_EXAMPLE_CONFIG_H"));
        assert!(header.contains("namespace com {"));
        assert!(header.contains("namespace config {"));
        // A single root keeps the entrypoint names unqualified.
        assert!(header.contains("std::optional<std::string> read(const char *_configFile);"));
        assert!(header.contains("std::optional<std::string> parse(const char *_xml);"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("xmlParseFile(_configFile)"));
        assert!(implementation
            .contains("!xmlStrcmp(_root->name, reinterpret_cast<const xmlChar *>(\"greeting\"))"));
        assert!(implementation.contains(
            "_out << \"<?xml version=\\\"1.0\\\" encoding=\\\"utf-8\\\"?>\" << std::endl;"
        ));
        assert!(implementation
            .contains("_out << \"<greeting>\" << _value << \"</greeting>\" << std::endl;"));
    }

    #[test]
    fn enums_round_trip_through_the_string_maps() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="color">
                   <xs:restriction base="xs:string">
                     <xs:enumeration value="red"/>
                     <xs:enumeration value="green"/>
                     <xs:enumeration value="blue"/>
                   </xs:restriction>
                 </xs:simpleType>
                 <xs:element name="paint" type="color"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.enums_header;
        assert!(header.contains("enum class Color {"));
        assert!(header.contains("    UNKNOWN = -1,"));
        assert!(header.contains("    GREEN,"));
        assert!(header.contains("Color stringToColor(const std::string &value);"));
        let implementation = &files.enums_impl;
        // The lookup table holds real members only; toString covers
        // every declared literal.
        assert!(implementation.contains("{\"green\", Color::GREEN},"));
        assert!(!implementation.contains("UNKNOWN},"));
        assert!(implementation.contains("case Color::GREEN: return \"green\";"));
        assert!(implementation.contains("default: return std::to_string(static_cast<int>(o));"));
        // Reflective values array outside the package namespace.
        assert!(files.enums_header.contains("namespace xsdcpp {"));
        assert!(files
            .enums_header
            .contains("struct EnumValues<::com::example::config::Color>"));
        // The root uses the enum's parse expression.
        assert!(files.parser_impl.contains("stringToColor(_raw)"));
    }

    #[test]
    fn multi_valued_element_is_a_vector_with_first_accessor() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="bag">
                   <xs:sequence>
                     <xs:element name="item" type="xs:int" maxOccurs="unbounded"/>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:element name="bag" type="bag"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("class Bag {"));
        assert!(header.contains("const std::vector<int32_t> item_;"));
        assert!(header.contains("explicit Bag(std::vector<int32_t> item);"));
        assert!(header.contains("const std::vector<int32_t> &getItem() const;"));
        assert!(header.contains("bool hasItem() const;"));
        assert!(header.contains("const int32_t *getFirstItem() const;"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("item.push_back(std::stoi(_value));"));
        assert!(implementation.contains("return !(item_.empty());"));
        assert!(implementation.contains("return &item_[0];"));
    }

    #[test]
    fn optional_attribute_is_an_optional_field_with_assert_on_get() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="node">
                   <xs:sequence/>
                   <xs:attribute name="label" type="xs:string"/>
                 </xs:complexType>
                 <xs:element name="node" type="node"/>
               </xs:schema>"#,
            &options(),
        );
        assert!(files
            .parser_header
            .contains("const std::optional<std::string> label_;"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("_raw = getXmlAttribute(_root, \"label\");"));
        assert!(implementation.contains("_xsdc_assert(label_.has_value());"));
        assert!(implementation.contains("return label_.has_value();"));
    }

    #[test]
    fn inheritance_keeps_base_members_first() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="a">
                   <xs:sequence>
                     <xs:element name="x" type="xs:string"/>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:complexType name="b">
                   <xs:complexContent>
                     <xs:extension base="a">
                       <xs:sequence>
                         <xs:element name="y" type="xs:string"/>
                       </xs:sequence>
                     </xs:extension>
                   </xs:complexContent>
                 </xs:complexType>
                 <xs:element name="b" type="b"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("class B : public A {"));
        assert!(header.contains("B(std::string x, std::string y);"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("B::B(std::string x, std::string y)\n    : A(x), y_(y) {}"));
        // Reading fills the inherited member before the own one, and
        // writing emits them in the same order.
        let x_read = implementation.find("xmlChar *>(\"x\")").unwrap();
        let y_read = implementation.find("xmlChar *>(\"y\")").unwrap();
        assert!(x_read < y_read);
        let write_body = &implementation[implementation.find("void B::write").unwrap()..];
        let x_write = write_body.find("\"<x>\"").unwrap();
        let y_write = write_body.find("\"<y>\"").unwrap();
        assert!(x_write < y_write);
    }

    #[test]
    fn multiple_roots_need_an_explicit_selection() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                       <xs:complexType name="t"><xs:sequence/></xs:complexType>
                       <xs:element name="a" type="t"/>
                       <xs:element name="b" type="t"/>
                     </xs:schema>"#;
        let error = generate(&schema(xml), &options()).unwrap_err();
        match error {
            Error::Usage(message) => {
                assert!(message.contains('a') && message.contains('b'));
            }
            other => panic!("expected a usage error, got {other:?}"),
        }

        // Selecting one root makes the entrypoints element-qualified.
        let mut selected = options();
        selected.roots = vec!["b".to_string()];
        let files = generate(&schema(xml), &selected).unwrap();
        assert!(files
            .parser_header
            .contains("std::optional<T> readB(const char *_configFile);"));
        assert!(files
            .parser_header
            .contains("std::optional<T> parseB(const char *_xml);"));
        assert!(!files.parser_header.contains("readA"));

        let mut unknown = options();
        unknown.roots = vec!["c".to_string()];
        assert!(matches!(
            generate(&schema(xml), &unknown),
            Err(Error::Usage(_))
        ));
    }

    #[test]
    fn reserved_and_duplicate_class_names_collide() {
        let reserved = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                            <xs:complexType name="xmlParser"><xs:sequence/></xs:complexType>
                            <xs:element name="r" type="xmlParser"/>
                          </xs:schema>"#;
        assert!(matches!(
            generate(&schema(reserved), &options()),
            Err(Error::NameCollision(_))
        ));

        // Distinct XML names may sanitize to one class name.
        let duplicate = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                             <xs:complexType name="audio-policy"><xs:sequence/></xs:complexType>
                             <xs:complexType name="audioPolicy"><xs:sequence/></xs:complexType>
                             <xs:element name="r" type="audioPolicy"/>
                           </xs:schema>"#;
        assert!(matches!(
            generate(&schema(duplicate), &options()),
            Err(Error::NameCollision(_))
        ));
    }

    #[test]
    fn anonymous_inline_type_becomes_a_nested_class() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="outer">
                   <xs:sequence>
                     <xs:element name="settings">
                       <xs:complexType>
                         <xs:sequence>
                           <xs:element name="key" type="xs:string" maxOccurs="unbounded"/>
                         </xs:sequence>
                       </xs:complexType>
                     </xs:element>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:element name="outer" type="outer"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("class Outer {"));
        assert!(header.contains("    class Settings {"));
        assert!(header.contains("const std::vector<Outer::Settings> settings_;"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("Outer::Settings Outer::Settings::read("));
        assert!(implementation
            .contains("Outer::Settings _value = Outer::Settings::read(_child);"));
    }

    #[test]
    fn simple_content_gets_value_accessors_and_set_value() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="measure">
                   <xs:simpleContent>
                     <xs:extension base="xs:int">
                       <xs:attribute name="unit" type="xs:string" use="required"/>
                     </xs:extension>
                   </xs:simpleContent>
                 </xs:complexType>
                 <xs:element name="measure" type="measure"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("std::optional<int32_t> value_;"));
        assert!(header.contains("const int32_t &getValue() const;"));
        assert!(header.contains("void setValue(int32_t value);"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("_instance.setValue(std::stoi(_raw));"));
        // Required attributes are value-initialized, not optional.
        assert!(implementation.contains("std::string unit{};"));
        // The writer puts the text value on the element line.
        assert!(implementation.contains("_out << \"</\" << _name << \">\" << std::endl;"));
    }

    #[test]
    fn boolean_getter_flag_switches_the_prefix() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                       <xs:complexType name="t">
                         <xs:sequence/>
                         <xs:attribute name="enabled" type="xs:boolean" use="required"/>
                       </xs:complexType>
                       <xs:element name="t" type="t"/>
                     </xs:schema>"#;
        let plain = generate_or_fail(xml, &options());
        assert!(plain.parser_header.contains("const bool &getEnabled() const;"));

        let mut with_is = options();
        with_is.boolean_getter = true;
        let files = generate_or_fail(xml, &with_is);
        assert!(files.parser_header.contains("const bool &isEnabled() const;"));
        assert!(!files.parser_header.contains("getEnabled"));
        // Booleans are written textually so they parse back.
        assert!(files
            .parser_impl
            .contains("(isEnabled() ? \"true\" : \"false\")"));
    }

    #[test]
    fn tinyxml_flavor_swaps_the_dom_calls() {
        let mut tiny = options();
        tiny.tinyxml = true;
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="bag">
                   <xs:sequence>
                     <xs:element name="item" type="xs:string" maxOccurs="unbounded"/>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:element name="bag" type="bag"/>
               </xs:schema>"#,
            &tiny,
        );
        assert!(files.parser_header.contains("#include <tinyxml2.h>"));
        assert!(files
            .parser_header
            .contains("static Bag read(const tinyxml2::XMLElement *_root);"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("_doc.LoadFile(_configFile)"));
        assert!(implementation.contains("!strcmp(_child->Name(), \"item\")"));
        assert!(implementation.contains("child->ToText()"));
        assert!(!implementation.contains("xmlParseFile"));
    }

    #[test]
    fn choice_members_get_the_optional_suffix() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="t">
                   <xs:choice>
                     <xs:element name="left" type="xs:string"/>
                     <xs:element name="right" type="xs:string"/>
                   </xs:choice>
                 </xs:complexType>
                 <xs:element name="t" type="t"/>
               </xs:schema>"#,
            &options(),
        );
        let header = &files.parser_header;
        assert!(header.contains("const std::optional<std::string> left_optional_;"));
        assert!(header.contains("const std::optional<std::string> right_optional_;"));
        assert!(header.contains("bool hasLeft_optional() const;"));
    }

    #[test]
    fn list_attribute_parses_token_wise() {
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="t">
                   <xs:sequence/>
                   <xs:attribute name="ids" type="xs:NMTOKENS" use="required"/>
                 </xs:complexType>
                 <xs:element name="t" type="t"/>
               </xs:schema>"#,
            &options(),
        );
        assert!(files
            .parser_header
            .contains("const std::vector<std::string> ids_;"));
        let implementation = &files.parser_impl;
        assert!(implementation.contains("std::istringstream _stream(_raw);"));
        assert!(implementation.contains("for (std::string _token; _stream >> _token;)"));
    }

    #[test]
    fn emission_modes_populate_one_pair_only() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                       <xs:simpleType name="color">
                         <xs:restriction base="xs:string">
                           <xs:enumeration value="red"/>
                         </xs:restriction>
                       </xs:simpleType>
                       <xs:element name="paint" type="color"/>
                     </xs:schema>"#;

        let mut enums_only = options();
        enums_only.enums_only = true;
        let files = generate_or_fail(xml, &enums_only);
        assert!(!files.enums_header.is_empty());
        assert!(files.parser_header.is_empty());
        assert!(files.parser_impl.is_empty());

        let mut parser_only = options();
        parser_only.parser_only = true;
        let files = generate_or_fail(xml, &parser_only);
        assert!(files.enums_header.is_empty());
        assert!(files.enums_impl.is_empty());
        // The parser still includes the enum header generated by the
        // other mode.
        assert!(files
            .parser_header
            .contains("#include \"com_example_config_enums.h\""));
    }

    #[test]
    fn writer_emission_is_opt_in() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                       <xs:complexType name="t"><xs:sequence/></xs:complexType>
                       <xs:element name="t" type="t"/>
                     </xs:schema>"#;
        let mut no_writer = options();
        no_writer.writer = false;
        let files = generate_or_fail(xml, &no_writer);
        assert!(!files.parser_header.contains("void write"));
        assert!(!files.parser_impl.contains("_indentDepth"));
    }

    #[test]
    fn digit_leading_package_segments_are_prefixed() {
        let mut numeric = options();
        numeric.package = "com.1x.cfg".to_string();
        let files = generate_or_fail(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="g" type="xs:string"/>
               </xs:schema>"#,
            &numeric,
        );
        assert!(files.parser_header.contains("namespace _1x {"));
        assert_eq!(files.file_stem, "com_1x_cfg");
    }
}
