use roxmltree::Node;

use super::complex_type_def::ComplexTypeDef;
use super::simple_type_def::SimpleTypeDef;
use super::xstypes::QName;
use crate::error::Error;

/// The type occurring at a use site (element or attribute): either a
/// reference to a named type or an inline anonymous definition.
#[derive(Clone, Debug)]
pub enum TypeUse {
    Named(QName),
    InlineSimple(SimpleTypeDef),
    InlineComplex(ComplexTypeDef),
}

impl TypeUse {
    /// Maps the type of an `<element>` or `<attribute>` node: the `type`
    /// attribute if present, otherwise an inline `<simpleType>` or
    /// `<complexType>` child. Absence is legal and means `xs:anyType`
    /// (§3.3, {type definition}).
    pub fn map_from_xml(node: Node) -> Result<Option<Self>, Error> {
        if let Some(type_) = node.attribute("type") {
            return Ok(Some(Self::Named(QName::parse(type_, node)?)));
        }
        if let Some(simple_type) = node
            .children()
            .find(|c| c.tag_name().name() == SimpleTypeDef::TAG_NAME)
        {
            return Ok(Some(Self::InlineSimple(SimpleTypeDef::map_from_xml(
                simple_type,
            )?)));
        }
        if let Some(complex_type) = node
            .children()
            .find(|c| c.tag_name().name() == ComplexTypeDef::TAG_NAME)
        {
            return Ok(Some(Self::InlineComplex(ComplexTypeDef::map_from_xml(
                complex_type,
            )?)));
        }
        Ok(None)
    }
}
