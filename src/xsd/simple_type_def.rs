use roxmltree::Node;

use super::xstypes::QName;
use crate::error::Error;

/// Simple type definition (§3.16): a restriction, list, or union.
///
/// Restrictions keep only their enumeration facets; every other
/// constraining facet is dropped because the generated parser does not
/// validate value spaces.
#[derive(Clone, Debug)]
pub struct SimpleTypeDef {
    pub name: Option<String>,
    pub derivation: SimpleDerivation,
}

#[derive(Clone, Debug)]
pub enum SimpleDerivation {
    Restriction {
        base: QName,
        enumerations: Vec<String>,
    },
    List {
        item_type: QName,
    },
    Union {
        member_types: Vec<QName>,
    },
}

impl SimpleTypeDef {
    pub const TAG_NAME: &'static str = "simpleType";

    pub fn map_from_xml(node: Node) -> Result<Self, Error> {
        let name = node.attribute("name").map(str::to_string);

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "restriction" => {
                    let base = child.attribute("base").ok_or_else(|| {
                        Error::Structural(format!(
                            "restriction without base in simple type {:?}",
                            name.as_deref().unwrap_or("<anonymous>")
                        ))
                    })?;
                    let base = QName::parse(base, child)?;

                    let mut enumerations = Vec::new();
                    for enumeration in child
                        .children()
                        .filter(|c| c.tag_name().name() == "enumeration")
                    {
                        let value = enumeration.attribute("value").ok_or_else(|| {
                            Error::Structural("enumeration without value".to_string())
                        })?;
                        if value.is_empty() {
                            return Err(Error::Structural(
                                "empty enumeration value".to_string(),
                            ));
                        }
                        enumerations.push(value.to_string());
                    }

                    return Ok(Self {
                        name,
                        derivation: SimpleDerivation::Restriction {
                            base,
                            enumerations,
                        },
                    });
                }
                "list" => {
                    let item_type = child.attribute("itemType").ok_or_else(|| {
                        Error::Structural("list without itemType".to_string())
                    })?;
                    return Ok(Self {
                        name,
                        derivation: SimpleDerivation::List {
                            item_type: QName::parse(item_type, child)?,
                        },
                    });
                }
                "union" => {
                    let members = child.attribute("memberTypes").ok_or_else(|| {
                        Error::Structural("union without memberTypes".to_string())
                    })?;
                    let member_types = members
                        .split_ascii_whitespace()
                        .map(|m| QName::parse(m, child))
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(Self {
                        name,
                        derivation: SimpleDerivation::Union { member_types },
                    });
                }
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported simple type derivation <{other}>"
                    )))
                }
            }
        }

        Err(Error::Structural(format!(
            "simple type {:?} without derivation",
            name.as_deref().unwrap_or("<anonymous>")
        )))
    }

    /// The declared enumeration literals, or an empty slice for
    /// non-restriction derivations.
    pub fn enumerations(&self) -> &[String] {
        match &self.derivation {
            SimpleDerivation::Restriction { enumerations, .. } => enumerations,
            _ => &[],
        }
    }

    /// A named restriction with at least one enumeration literal lowers
    /// to a generated C++ enum class.
    pub fn is_enum(&self) -> bool {
        self.name.is_some() && !self.enumerations().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> SimpleTypeDef {
        let doc = roxmltree::Document::parse(xml).unwrap();
        SimpleTypeDef::map_from_xml(doc.root_element()).unwrap()
    }

    #[test]
    fn restriction_with_enumerations() {
        let simple_type = parse(
            r#"<simpleType name="color" xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <restriction base="xs:string">
                   <enumeration value="red"/>
                   <enumeration value="green"/>
                 </restriction>
               </simpleType>"#,
        );
        assert_eq!(simple_type.enumerations(), ["red", "green"]);
        assert!(simple_type.is_enum());
    }

    #[test]
    fn anonymous_enumerated_restriction_is_not_an_enum() {
        let simple_type = parse(
            r#"<simpleType xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <restriction base="xs:string">
                   <enumeration value="red"/>
                 </restriction>
               </simpleType>"#,
        );
        assert!(!simple_type.is_enum());
    }

    #[test]
    fn union_member_types_are_split() {
        let simple_type = parse(
            r#"<simpleType name="u" xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <union memberTypes="xs:int xs:NMTOKENS"/>
               </simpleType>"#,
        );
        match &simple_type.derivation {
            SimpleDerivation::Union { member_types } => assert_eq!(member_types.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
    }
}
