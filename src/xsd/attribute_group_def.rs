use roxmltree::Node;

use super::attribute_decl::AttributeDecl;
use super::xstypes::QName;
use crate::error::Error;

/// Attribute group definition (§3.6). A referential `AttributeGroupDef`
/// (only `reference` set) occurs when an attribute group nests another.
#[derive(Clone, Debug, Default)]
pub struct AttributeGroupDef {
    pub name: Option<String>,
    pub reference: Option<QName>,
    pub attributes: Vec<AttributeDecl>,
    pub attribute_groups: Vec<AttributeGroupDef>,
}

impl AttributeGroupDef {
    pub const TAG_NAME: &'static str = "attributeGroup";

    pub fn map_from_xml(node: Node) -> Result<Self, Error> {
        let mut def = Self {
            name: node.attribute("name").map(str::to_string),
            reference: node
                .attribute("ref")
                .map(|r| QName::parse(r, node))
                .transpose()?,
            ..Self::default()
        };
        if def.name.is_none() && def.reference.is_none() {
            return Err(Error::Structural(
                "attributeGroup without name or ref".to_string(),
            ));
        }
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                AttributeDecl::TAG_NAME => {
                    def.attributes.push(AttributeDecl::map_from_xml(child)?)
                }
                Self::TAG_NAME => def.attribute_groups.push(Self::map_from_xml(child)?),
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported attribute group content <{other}>"
                    )))
                }
            }
        }
        Ok(def)
    }
}
