use std::collections::HashMap;

use super::naming;
use super::primitives::{predefined_type, Primitive, ValueKind};
use crate::error::Error;
use crate::xsd::{
    AttributeDecl, AttributeGroupDef, ComplexTypeDef, ElementDecl, GroupDef, QName, Schema,
    SimpleDerivation, SimpleTypeDef, TypeDef, TypeUse,
};

/// Lowering of a simple type: the scalar C++ type, how its lexical form
/// is parsed, and whether the value is a whitespace-separated list.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueType {
    pub cpp_type: String,
    pub parse_template: String,
    pub kind: ValueKind,
    pub is_list: bool,
}

impl ValueType {
    fn from_primitive(primitive: &Primitive) -> Self {
        Self {
            cpp_type: primitive.cpp_type.to_string(),
            parse_template: primitive.parse_template.to_string(),
            kind: primitive.kind,
            is_list: primitive.is_list,
        }
    }

    /// The full storage type: lists wrap the scalar in a vector.
    pub fn full_type(&self) -> String {
        if self.is_list {
            format!("std::vector<{}>", self.cpp_type)
        } else {
            self.cpp_type.clone()
        }
    }

    /// The lexical-to-value conversion applied to one raw token.
    pub fn parse_expr(&self, raw: &str) -> String {
        self.parse_template.replace("{}", raw)
    }

    /// The value-to-lexical conversion used by the writer.
    pub fn write_expr(&self, value: &str) -> String {
        match self.kind {
            ValueKind::Enum => format!("toString({value})"),
            ValueKind::Bool => format!("({value} ? \"true\" : \"false\")"),
            ValueKind::String | ValueKind::Plain => value.to_string(),
        }
    }
}

/// A type at a use site, lowered for emission: either a simple value or
/// a generated class.
#[derive(Clone, Debug, PartialEq)]
pub enum LoweredType {
    Value(ValueType),
    Complex(String),
}

/// An element stacked by the flattener, tagged with the named complex
/// type whose declaration contributed it (`None` inside an anonymous
/// type).
#[derive(Copy, Clone, Debug)]
pub struct StackedElement<'s> {
    pub element: &'s ElementDecl,
    pub owner: Option<&'s str>,
}

#[derive(Copy, Clone, Debug)]
pub struct StackedAttribute<'s> {
    pub attribute: &'s AttributeDecl,
    pub owner: Option<&'s str>,
}

/// Dereferences the schema's `ref=`/`base=` graph and lowers types for
/// the emitter. Simple-type lowerings are memoized by local name; the
/// cache lives and dies with the schema borrow.
pub struct Resolver<'s> {
    schema: &'s Schema,
    simple_cache: HashMap<String, ValueType>,
}

impl<'s> Resolver<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            simple_cache: HashMap::new(),
        }
    }

    pub fn resolve_element(&self, element: &'s ElementDecl) -> Result<&'s ElementDecl, Error> {
        match element.reference.as_ref() {
            Some(reference) => self
                .schema
                .element_by_name(&reference.local_name)
                .ok_or_else(|| {
                    Error::UnresolvedReference(format!(
                        "unknown element {}",
                        reference.local_name
                    ))
                }),
            None => Ok(element),
        }
    }

    pub fn resolve_attribute(
        &self,
        attribute: &'s AttributeDecl,
    ) -> Result<&'s AttributeDecl, Error> {
        match attribute.reference.as_ref() {
            Some(reference) => self
                .schema
                .attribute_by_name(&reference.local_name)
                .ok_or_else(|| {
                    Error::UnresolvedReference(format!(
                        "unknown attribute {}",
                        reference.local_name
                    ))
                }),
            None => Ok(attribute),
        }
    }

    pub fn resolve_group(&self, group: &'s GroupDef) -> Result<&'s GroupDef, Error> {
        match group.reference.as_ref() {
            Some(reference) => self.named_group(&reference.local_name),
            None => Ok(group),
        }
    }

    pub fn resolve_attribute_group(
        &self,
        attribute_group: &'s AttributeGroupDef,
    ) -> Result<&'s AttributeGroupDef, Error> {
        match attribute_group.reference.as_ref() {
            Some(reference) => self.named_attribute_group(&reference.local_name),
            None => Ok(attribute_group),
        }
    }

    fn named_group(&self, name: &str) -> Result<&'s GroupDef, Error> {
        self.schema
            .group_by_name(name)
            .ok_or_else(|| Error::UnresolvedReference(format!("unknown group {name}")))
    }

    fn named_attribute_group(&self, name: &str) -> Result<&'s AttributeGroupDef, Error> {
        self.schema.attribute_group_by_name(name).ok_or_else(|| {
            Error::UnresolvedReference(format!("unknown attributeGroup {name}"))
        })
    }

    pub fn get_type(&self, name: &str) -> Result<&'s TypeDef, Error> {
        self.schema
            .type_by_name(name)
            .ok_or_else(|| Error::UnresolvedReference(format!("unknown type {name}")))
    }

    /// Lowers the type at a use site. `default_name` names the class
    /// generated for an anonymous inline complex type; it is the use
    /// site's element name. An absent type means `xs:anyType`.
    pub fn parse_type(
        &mut self,
        type_use: Option<&'s TypeUse>,
        default_name: &str,
    ) -> Result<LoweredType, Error> {
        let Some(type_use) = type_use else {
            return Ok(LoweredType::Value(ValueType::from_primitive(
                predefined_type("anyType")?,
            )));
        };
        match type_use {
            TypeUse::Named(reference) if reference.is_builtin() => Ok(LoweredType::Value(
                ValueType::from_primitive(predefined_type(&reference.local_name)?),
            )),
            TypeUse::Named(reference) => match self.get_type(&reference.local_name)? {
                TypeDef::Complex(complex_type) => {
                    let name = complex_type
                        .name
                        .as_deref()
                        .unwrap_or(default_name);
                    Ok(LoweredType::Complex(naming::to_class_name(name)))
                }
                TypeDef::Simple(simple_type) => self
                    .parse_simple_type_value(simple_type)
                    .map(LoweredType::Value),
            },
            TypeUse::InlineComplex(_) => {
                Ok(LoweredType::Complex(naming::to_class_name(default_name)))
            }
            TypeUse::InlineSimple(simple_type) => self
                .parse_simple_type_value(simple_type)
                .map(LoweredType::Value),
        }
    }

    /// Lowers a simple type definition to its value type.
    pub fn parse_simple_type_value(
        &mut self,
        simple_type: &'s SimpleTypeDef,
    ) -> Result<ValueType, Error> {
        if let Some(name) = simple_type.name.as_deref() {
            if let Some(hit) = self.simple_cache.get(name) {
                return Ok(hit.clone());
            }
        }

        let lowered = match &simple_type.derivation {
            SimpleDerivation::Restriction { base, .. } => match simple_type.name.as_deref() {
                Some(name) if simple_type.is_enum() => {
                    let class_name = naming::to_class_name(name);
                    ValueType {
                        parse_template: format!("stringTo{class_name}({{}})"),
                        cpp_type: class_name,
                        kind: ValueKind::Enum,
                        is_list: false,
                    }
                }
                // Restrictions below enumerations carry no value-space
                // effect; lower to the base.
                _ => self.lower_reference(base)?,
            },
            SimpleDerivation::List { item_type } => {
                let mut item = self.lower_reference(item_type)?;
                item.is_list = true;
                item
            }
            SimpleDerivation::Union { member_types } => {
                let mut is_list = false;
                for member in member_types {
                    if self.lower_reference(member)?.is_list {
                        is_list = true;
                    }
                }
                ValueType {
                    cpp_type: "std::string".to_string(),
                    parse_template: "{}".to_string(),
                    kind: ValueKind::String,
                    is_list,
                }
            }
        };

        if let Some(name) = simple_type.name.as_deref() {
            self.simple_cache.insert(name.to_string(), lowered.clone());
        }
        Ok(lowered)
    }

    /// Lowers a reference that must denote a simple type: an XSD
    /// built-in or a user simple type.
    fn lower_reference(&mut self, reference: &'s QName) -> Result<ValueType, Error> {
        if reference.is_builtin() {
            return Ok(ValueType::from_primitive(predefined_type(
                &reference.local_name,
            )?));
        }
        match self.get_type(&reference.local_name)? {
            TypeDef::Simple(simple_type) => self.parse_simple_type_value(simple_type),
            TypeDef::Complex(_) => Err(Error::Structural(format!(
                "complex type {} used as a simple type",
                reference.local_name
            ))),
        }
    }

    /// The text-content value type of a simple-content complex type:
    /// walks `base` until a simple type (built-in or user) is reached.
    pub fn value_type(&mut self, complex_type: &'s ComplexTypeDef) -> Result<ValueType, Error> {
        let base = complex_type.base.as_ref().ok_or_else(|| {
            Error::Structural(format!(
                "simple content without base in {}",
                complex_type.name.as_deref().unwrap_or("<anonymous>")
            ))
        })?;
        if base.is_builtin() {
            return Ok(ValueType::from_primitive(predefined_type(
                &base.local_name,
            )?));
        }
        match self.get_type(&base.local_name)? {
            TypeDef::Simple(simple_type) => self.parse_simple_type_value(simple_type),
            TypeDef::Complex(parent) if parent.simple_content => self.value_type(parent),
            TypeDef::Complex(_) => Err(Error::Structural(format!(
                "base {} of simple content is not a simple type",
                base.local_name
            ))),
        }
    }

    /// True when the complex type's own extension base is the simple
    /// type that contributes the text value, i.e. the value field and
    /// its accessors belong to this class rather than an ancestor.
    pub fn has_own_value(&self, complex_type: &'s ComplexTypeDef) -> Result<bool, Error> {
        if !complex_type.simple_content {
            return Ok(false);
        }
        let Some(base) = complex_type.base.as_ref() else {
            return Ok(false);
        };
        if base.is_builtin() {
            return Ok(true);
        }
        Ok(matches!(
            self.get_type(&base.local_name)?,
            TypeDef::Simple(_)
        ))
    }

    /// The C++ base class of a complex type, if its extension base is
    /// another complex type of this schema.
    pub fn base_class(&self, complex_type: &'s ComplexTypeDef) -> Result<Option<String>, Error> {
        let Some(base) = complex_type.base.as_ref() else {
            return Ok(None);
        };
        if base.is_builtin() {
            return Ok(None);
        }
        match self.get_type(&base.local_name)? {
            TypeDef::Complex(parent) => Ok(Some(naming::to_class_name(
                parent.name.as_deref().unwrap_or(&base.local_name),
            ))),
            TypeDef::Simple(_) => Ok(None),
        }
    }

    /// Flattens the full member list of a complex type (§ Flatten):
    /// inherited members first, then elements contributed by the group
    /// reference, then own elements; attribute-group attributes before
    /// own attributes. Declaration order is preserved throughout.
    pub fn stack_components(
        &self,
        complex_type: &'s ComplexTypeDef,
    ) -> Result<(Vec<StackedElement<'s>>, Vec<StackedAttribute<'s>>), Error> {
        let mut elements = Vec::new();
        let mut attributes = Vec::new();
        self.stack_into(complex_type, &mut elements, &mut attributes)?;
        Ok((elements, attributes))
    }

    fn stack_into(
        &self,
        complex_type: &'s ComplexTypeDef,
        elements: &mut Vec<StackedElement<'s>>,
        attributes: &mut Vec<StackedAttribute<'s>>,
    ) -> Result<(), Error> {
        if let Some(base) = complex_type.base.as_ref() {
            if !base.is_builtin() {
                if let TypeDef::Complex(parent) = self.get_type(&base.local_name)? {
                    self.stack_into(parent, elements, attributes)?;
                }
                // A simple base contributes no members; its text value is
                // handled through the value accessors.
            }
        }

        let owner = complex_type.name.as_deref();
        if let Some(group) = complex_type.group.as_ref() {
            self.stack_group(self.named_group(&group.local_name)?, owner, elements)?;
        }
        for element in &complex_type.elements {
            elements.push(StackedElement { element, owner });
        }
        for attribute_group in &complex_type.attribute_groups {
            self.stack_attribute_group(
                self.named_attribute_group(&attribute_group.local_name)?,
                owner,
                attributes,
            )?;
        }
        for attribute in &complex_type.attributes {
            attributes.push(StackedAttribute { attribute, owner });
        }
        Ok(())
    }

    fn stack_group(
        &self,
        group: &'s GroupDef,
        owner: Option<&'s str>,
        elements: &mut Vec<StackedElement<'s>>,
    ) -> Result<(), Error> {
        let group = self.resolve_group(group)?;
        for element in &group.elements {
            elements.push(StackedElement { element, owner });
        }
        for nested in &group.groups {
            self.stack_group(nested, owner, elements)?;
        }
        Ok(())
    }

    fn stack_attribute_group(
        &self,
        attribute_group: &'s AttributeGroupDef,
        owner: Option<&'s str>,
        attributes: &mut Vec<StackedAttribute<'s>>,
    ) -> Result<(), Error> {
        let attribute_group = self.resolve_attribute_group(attribute_group)?;
        for attribute in &attribute_group.attributes {
            attributes.push(StackedAttribute {
                attribute,
                owner,
            });
        }
        for nested in &attribute_group.attribute_groups {
            self.stack_attribute_group(nested, owner, attributes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(xml: &str) -> Schema {
        let doc = roxmltree::Document::parse(xml).unwrap();
        Schema::map_from_xml(doc.root_element()).unwrap()
    }

    fn lower(schema: &Schema, type_name: &str) -> ValueType {
        let mut resolver = Resolver::new(schema);
        let TypeDef::Simple(simple_type) = schema.type_by_name(type_name).unwrap() else {
            panic!("expected a simple type");
        };
        resolver.parse_simple_type_value(simple_type).unwrap()
    }

    #[test]
    fn enumerated_restriction_lowers_to_enum() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="color">
                   <xs:restriction base="xs:string">
                     <xs:enumeration value="red"/>
                   </xs:restriction>
                 </xs:simpleType>
               </xs:schema>"#,
        );
        let value = lower(&schema, "color");
        assert_eq!(value.cpp_type, "Color");
        assert_eq!(value.kind, ValueKind::Enum);
        assert_eq!(value.parse_expr("raw"), "stringToColor(raw)");
    }

    #[test]
    fn plain_restriction_lowers_to_its_base() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="percent">
                   <xs:restriction base="xs:int"/>
                 </xs:simpleType>
               </xs:schema>"#,
        );
        let value = lower(&schema, "percent");
        assert_eq!(value.cpp_type, "int32_t");
        assert_eq!(value.kind, ValueKind::Plain);
    }

    #[test]
    fn list_marks_the_item_type_plural() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="ints">
                   <xs:list itemType="xs:int"/>
                 </xs:simpleType>
               </xs:schema>"#,
        );
        let value = lower(&schema, "ints");
        assert!(value.is_list);
        assert_eq!(value.full_type(), "std::vector<int32_t>");
    }

    #[test]
    fn union_lowers_to_string_and_keeps_list_cardinality() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="scalarUnion">
                   <xs:union memberTypes="xs:int xs:string"/>
                 </xs:simpleType>
                 <xs:simpleType name="listUnion">
                   <xs:union memberTypes="xs:int xs:NMTOKENS"/>
                 </xs:simpleType>
               </xs:schema>"#,
        );
        let scalar = lower(&schema, "scalarUnion");
        assert_eq!(scalar.cpp_type, "std::string");
        assert!(!scalar.is_list);
        let list = lower(&schema, "listUnion");
        assert_eq!(list.cpp_type, "std::string");
        assert!(list.is_list);
    }

    #[test]
    fn simple_content_value_type_walks_the_base_chain() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="inner">
                   <xs:simpleContent>
                     <xs:extension base="xs:int">
                       <xs:attribute name="unit" type="xs:string"/>
                     </xs:extension>
                   </xs:simpleContent>
                 </xs:complexType>
                 <xs:complexType name="outer">
                   <xs:simpleContent>
                     <xs:extension base="inner">
                       <xs:attribute name="scale" type="xs:string"/>
                     </xs:extension>
                   </xs:simpleContent>
                 </xs:complexType>
               </xs:schema>"#,
        );
        let mut resolver = Resolver::new(&schema);
        let TypeDef::Complex(outer) = schema.type_by_name("outer").unwrap() else {
            panic!();
        };
        let value = resolver.value_type(outer).unwrap();
        assert_eq!(value.cpp_type, "int32_t");
        assert!(!resolver.has_own_value(outer).unwrap());
        let TypeDef::Complex(inner) = schema.type_by_name("inner").unwrap() else {
            panic!();
        };
        assert!(resolver.has_own_value(inner).unwrap());
    }

    #[test]
    fn unresolved_references_are_fatal() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="t">
                   <xs:sequence>
                     <xs:element ref="missing"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        );
        let resolver = Resolver::new(&schema);
        let TypeDef::Complex(complex_type) = schema.type_by_name("t").unwrap() else {
            panic!();
        };
        let result = resolver.resolve_element(&complex_type.elements[0]);
        assert!(matches!(result, Err(Error::UnresolvedReference(_))));
    }

    #[test]
    fn flatten_stacks_inherited_before_group_before_own() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:attributeGroup name="common">
                   <xs:attribute name="fromGroup" type="xs:string"/>
                 </xs:attributeGroup>
                 <xs:group name="extras">
                   <xs:sequence>
                     <xs:element name="extra" type="xs:string"/>
                   </xs:sequence>
                 </xs:group>
                 <xs:complexType name="base">
                   <xs:sequence>
                     <xs:element name="inherited" type="xs:string"/>
                   </xs:sequence>
                   <xs:attribute name="baseAttr" type="xs:string"/>
                 </xs:complexType>
                 <xs:complexType name="derived">
                   <xs:complexContent>
                     <xs:extension base="base">
                       <xs:group ref="extras"/>
                       <xs:sequence>
                         <xs:element name="own" type="xs:string"/>
                       </xs:sequence>
                       <xs:attributeGroup ref="common"/>
                       <xs:attribute name="ownAttr" type="xs:string"/>
                     </xs:extension>
                   </xs:complexContent>
                 </xs:complexType>
               </xs:schema>"#,
        );
        let resolver = Resolver::new(&schema);
        let TypeDef::Complex(derived) = schema.type_by_name("derived").unwrap() else {
            panic!();
        };
        let (elements, attributes) = resolver.stack_components(derived).unwrap();
        let element_names: Vec<_> =
            elements.iter().map(|e| e.element.name.as_str()).collect();
        assert_eq!(element_names, ["inherited", "extra", "own"]);
        assert_eq!(elements[0].owner, Some("base"));
        assert_eq!(elements[2].owner, Some("derived"));
        let attribute_names: Vec<_> = attributes
            .iter()
            .map(|a| a.attribute.name.as_str())
            .collect();
        assert_eq!(attribute_names, ["baseAttr", "fromGroup", "ownAttr"]);
    }
}
