use roxmltree::Node;

use super::shared::TypeUse;
use super::xstypes::QName;
use crate::error::Error;

/// Element declaration (§3.3). Carries the effective multiplicity of the
/// use site instead of raw minOccurs/maxOccurs; the generated parser is
/// non-validating, so only `maxOccurs > 1` and `minOccurs > 0` survive
/// the mapping.
#[derive(Clone, Debug)]
pub struct ElementDecl {
    pub name: String,
    pub reference: Option<QName>,
    pub type_use: Option<TypeUse>,
    /// Effective `maxOccurs > 1`.
    pub multiple: bool,
    /// Effective `minOccurs > 0`. Always false for choice members.
    pub required: bool,
    pub variant: ElementVariant,
}

/// Tags an element with the compositor that introduced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementVariant {
    Normal,
    Choice,
    All,
}

pub(super) fn occurs_attribute(node: Node, name: &str) -> Result<Option<u64>, Error> {
    match node.attribute(name) {
        None => Ok(None),
        Some("unbounded") => Ok(Some(u64::MAX)),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            Error::Structural(format!("invalid {name} value {raw:?}"))
        }),
    }
}

impl ElementDecl {
    pub const TAG_NAME: &'static str = "element";

    /// Maps an `<element>` node. `variant` and `force_multiple` carry
    /// the context of the enclosing compositor: elements of a choice or
    /// all group are tagged, and a repeated compositor makes every
    /// member effectively repeated.
    pub fn map_from_xml(
        node: Node,
        variant: ElementVariant,
        force_multiple: bool,
    ) -> Result<Self, Error> {
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
                        "element without name or ref".to_string(),
                    ))
                }
            },
        };

        let min_occurs = occurs_attribute(node, "minOccurs")?.unwrap_or(1);
        let max_occurs = occurs_attribute(node, "maxOccurs")?.unwrap_or(1);

        let type_use = TypeUse::map_from_xml(node)?;

        Ok(Self {
            name,
            reference,
            type_use,
            multiple: force_multiple || max_occurs > 1,
            required: min_occurs > 0 && variant == ElementVariant::Normal,
            variant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_element(xml: &str) -> ElementDecl {
        let doc = roxmltree::Document::parse(xml).unwrap();
        ElementDecl::map_from_xml(doc.root_element(), ElementVariant::Normal, false).unwrap()
    }

    #[test]
    fn plain_element_is_required_and_single() {
        let element = parse_element(r#"<element name="x" type="s"/>"#);
        assert_eq!(element.name, "x");
        assert!(element.required);
        assert!(!element.multiple);
    }

    #[test]
    fn unbounded_element_is_multiple() {
        let element = parse_element(r#"<element name="x" maxOccurs="unbounded"/>"#);
        assert!(element.multiple);
    }

    #[test]
    fn zero_min_occurs_is_optional() {
        let element = parse_element(r#"<element name="x" minOccurs="0"/>"#);
        assert!(!element.required);
    }

    #[test]
    fn missing_name_and_ref_is_rejected() {
        let doc = roxmltree::Document::parse(r#"<element type="s"/>"#).unwrap();
        let result =
            ElementDecl::map_from_xml(doc.root_element(), ElementVariant::Normal, false);
        assert!(matches!(result, Err(Error::Structural(_))));
    }
}
