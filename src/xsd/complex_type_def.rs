use roxmltree::Node;

use super::attribute_decl::AttributeDecl;
use super::element_decl::{occurs_attribute, ElementDecl, ElementVariant};
use super::xstypes::QName;
use crate::error::Error;

/// Complex type definition (§3.4), flattened over its XML representation:
/// the content model compositors are walked at mapping time and their
/// elements collected in declaration order, tagged with the compositor
/// variant that introduced them.
#[derive(Clone, Debug, Default)]
pub struct ComplexTypeDef {
    pub name: Option<String>,
    /// Extension base (`complexContent` or `simpleContent`).
    pub base: Option<QName>,
    /// True for `simpleContent` types: text value plus attributes.
    pub simple_content: bool,
    pub elements: Vec<ElementDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub attribute_groups: Vec<QName>,
    /// Reference to a named element group contributing further elements.
    pub group: Option<QName>,
}

impl ComplexTypeDef {
    pub const TAG_NAME: &'static str = "complexType";

    pub fn map_from_xml(node: Node) -> Result<Self, Error> {
        let mut def = Self {
            name: node.attribute("name").map(str::to_string),
            ..Self::default()
        };
        def.map_content(node, false)?;
        Ok(def)
    }

    fn map_content(&mut self, node: Node, force_multiple: bool) -> Result<(), Error> {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "sequence" => {
                    self.map_particles(child, ElementVariant::Normal, force_multiple)?
                }
                "choice" => self.map_particles(child, ElementVariant::Choice, force_multiple)?,
                "all" => self.map_particles(child, ElementVariant::All, force_multiple)?,
                "group" => self.group = Some(reference_of(child)?),
                "attribute" => self.attributes.push(AttributeDecl::map_from_xml(child)?),
                "attributeGroup" => self.attribute_groups.push(reference_of(child)?),
                "complexContent" => self.map_derived_content(child, force_multiple)?,
                "simpleContent" => {
                    self.simple_content = true;
                    self.map_derived_content(child, force_multiple)?;
                }
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported complex type content <{other}>"
                    )))
                }
            }
        }
        Ok(())
    }

    /// `<complexContent>`/`<simpleContent>` wrap an `<extension>` or
    /// `<restriction>` carrying the base type and the own content.
    fn map_derived_content(&mut self, node: Node, force_multiple: bool) -> Result<(), Error> {
        for derivation in node.children().filter(Node::is_element) {
            match derivation.tag_name().name() {
                "extension" | "restriction" => {
                    let base = derivation.attribute("base").ok_or_else(|| {
                        Error::Structural(format!(
                            "derivation without base in complex type {:?}",
                            self.name.as_deref().unwrap_or("<anonymous>")
                        ))
                    })?;
                    self.base = Some(QName::parse(base, derivation)?);
                    self.map_content(derivation, force_multiple)?;
                }
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported content derivation <{other}>"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Walks a compositor (`sequence`, `choice`, `all`) and collects the
    /// element declarations it contains. A repeated compositor makes all
    /// of its members effectively repeated.
    fn map_particles(
        &mut self,
        node: Node,
        variant: ElementVariant,
        force_multiple: bool,
    ) -> Result<(), Error> {
        let multiple = force_multiple || occurs_attribute(node, "maxOccurs")?.unwrap_or(1) > 1;
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                ElementDecl::TAG_NAME => self
                    .elements
                    .push(ElementDecl::map_from_xml(child, variant, multiple)?),
                "choice" => self.map_particles(child, ElementVariant::Choice, multiple)?,
                "sequence" => self.map_particles(child, variant, multiple)?,
                "group" => self.group = Some(reference_of(child)?),
                "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported compositor content <{other}>"
                    )))
                }
            }
        }
        Ok(())
    }
}

fn reference_of(node: Node) -> Result<QName, Error> {
    let reference = node.attribute("ref").ok_or_else(|| {
        Error::Structural(format!("<{}> without ref", node.tag_name().name()))
    })?;
    QName::parse(reference, node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> ComplexTypeDef {
        let doc = roxmltree::Document::parse(xml).unwrap();
        ComplexTypeDef::map_from_xml(doc.root_element()).unwrap()
    }

    #[test]
    fn sequence_elements_keep_declaration_order() {
        let complex_type = parse(
            r#"<complexType name="t" xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <sequence>
                   <element name="a" type="xs:string"/>
                   <element name="b" type="xs:int"/>
                 </sequence>
                 <attribute name="x" type="xs:string"/>
               </complexType>"#,
        );
        let names: Vec<_> = complex_type.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(complex_type.attributes.len(), 1);
    }

    #[test]
    fn choice_members_are_tagged_and_optional() {
        let complex_type = parse(
            r#"<complexType name="t">
                 <sequence>
                   <choice>
                     <element name="a"/>
                     <element name="b"/>
                   </choice>
                 </sequence>
               </complexType>"#,
        );
        assert!(complex_type
            .elements
            .iter()
            .all(|e| e.variant == ElementVariant::Choice && !e.required));
    }

    #[test]
    fn repeated_choice_makes_members_multiple() {
        let complex_type = parse(
            r#"<complexType name="t">
                 <choice maxOccurs="unbounded">
                   <element name="a"/>
                 </choice>
               </complexType>"#,
        );
        assert!(complex_type.elements[0].multiple);
    }

    #[test]
    fn extension_carries_base_and_own_content() {
        let complex_type = parse(
            r#"<complexType name="derived">
                 <complexContent>
                   <extension base="base">
                     <sequence>
                       <element name="own"/>
                     </sequence>
                   </extension>
                 </complexContent>
               </complexType>"#,
        );
        assert_eq!(complex_type.base.as_ref().unwrap().local_name, "base");
        assert_eq!(complex_type.elements[0].name, "own");
        assert!(!complex_type.simple_content);
    }

    #[test]
    fn simple_content_extension() {
        let complex_type = parse(
            r#"<complexType name="t" xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <simpleContent>
                   <extension base="xs:string">
                     <attribute name="unit" type="xs:string"/>
                   </extension>
                 </simpleContent>
               </complexType>"#,
        );
        assert!(complex_type.simple_content);
        assert_eq!(complex_type.attributes.len(), 1);
    }
}
