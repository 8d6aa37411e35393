use roxmltree::Node;

use super::element_decl::{occurs_attribute, ElementDecl, ElementVariant};
use super::xstypes::QName;
use crate::error::Error;

/// Model group definition (§3.7): a named, reusable list of elements.
/// A referential `GroupDef` (only `reference` set) occurs when a group
/// nests another group.
#[derive(Clone, Debug, Default)]
pub struct GroupDef {
    pub name: Option<String>,
    pub reference: Option<QName>,
    pub elements: Vec<ElementDecl>,
    pub groups: Vec<GroupDef>,
}

impl GroupDef {
    pub const TAG_NAME: &'static str = "group";

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
            return Err(Error::Structural("group without name or ref".to_string()));
        }
        def.map_compositors(node, ElementVariant::Normal, false)?;
        Ok(def)
    }

    fn map_compositors(
        &mut self,
        node: Node,
        variant: ElementVariant,
        force_multiple: bool,
    ) -> Result<(), Error> {
        let multiple = force_multiple || occurs_attribute(node, "maxOccurs")?.unwrap_or(1) > 1;
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "sequence" => self.map_compositors(child, variant, multiple)?,
                "choice" => self.map_compositors(child, ElementVariant::Choice, multiple)?,
                "all" => self.map_compositors(child, ElementVariant::All, multiple)?,
                ElementDecl::TAG_NAME => self
                    .elements
                    .push(ElementDecl::map_from_xml(child, variant, multiple)?),
                Self::TAG_NAME => self.groups.push(Self::map_from_xml(child)?),
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported group content <{other}>"
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_group_collects_elements_and_nested_refs() {
        let doc = roxmltree::Document::parse(
            r#"<group name="g">
                 <sequence>
                   <element name="a"/>
                   <group ref="other"/>
                 </sequence>
               </group>"#,
        )
        .unwrap();
        let group = GroupDef::map_from_xml(doc.root_element()).unwrap();
        assert_eq!(group.name.as_deref(), Some("g"));
        assert_eq!(group.elements.len(), 1);
        assert_eq!(group.groups.len(), 1);
        assert_eq!(
            group.groups[0].reference.as_ref().unwrap().local_name,
            "other"
        );
    }
}
