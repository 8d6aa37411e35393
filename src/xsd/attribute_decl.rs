use roxmltree::Node;

use super::shared::TypeUse;
use super::xstypes::QName;
use crate::error::Error;

/// Attribute declaration (§3.2).
#[derive(Clone, Debug)]
pub struct AttributeDecl {
    pub name: String,
    pub reference: Option<QName>,
    pub type_use: Option<TypeUse>,
    /// `use="required"`.
    pub required: bool,
}

impl AttributeDecl {
    pub const TAG_NAME: &'static str = "attribute";

    pub fn map_from_xml(node: Node) -> Result<Self, Error> {
        let reference = node
            .attribute("ref")
            .map(|r| QName::parse(r, node))
            .transpose()?;

        let name = match node.attribute("name") {
            Some(name) => name.to_string(),
            None => match reference.as_ref() {
                Some(reference) => reference.local_name.clone(),
                None => {
                    return Err(Error::Structural(
                        "attribute without name or ref".to_string(),
                    ))
                }
            },
        };

        let type_use = TypeUse::map_from_xml(node)?;

        Ok(Self {
            name,
            reference,
            type_use,
            required: node.attribute("use") == Some("required"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_required_is_mapped() {
        let doc =
            roxmltree::Document::parse(r#"<attribute name="a" use="required"/>"#).unwrap();
        let attribute = AttributeDecl::map_from_xml(doc.root_element()).unwrap();
        assert!(attribute.required);

        let doc = roxmltree::Document::parse(r#"<attribute name="a"/>"#).unwrap();
        let attribute = AttributeDecl::map_from_xml(doc.root_element()).unwrap();
        assert!(!attribute.required);
    }
}
