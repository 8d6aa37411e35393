use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use roxmltree::Node;

use super::attribute_decl::AttributeDecl;
use super::attribute_group_def::AttributeGroupDef;
use super::complex_type_def::ComplexTypeDef;
use super::element_decl::{ElementDecl, ElementVariant};
use super::group_def::GroupDef;
use super::simple_type_def::SimpleTypeDef;
use crate::error::Error;

/// A top-level type definition. Simple and complex types share one name
/// space (§3.17).
#[derive(Clone, Debug)]
pub enum TypeDef {
    Simple(SimpleTypeDef),
    Complex(ComplexTypeDef),
}

impl TypeDef {
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeDef::Simple(simple_type) => simple_type.name.as_deref(),
            TypeDef::Complex(complex_type) => complex_type.name.as_deref(),
        }
    }
}

/// The aggregated schema: one ordered list per component kind, local
/// names unique within each kind. Declaration order is preserved because
/// it is the emission order of the generator.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub types: Vec<TypeDef>,
    pub elements: Vec<ElementDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub groups: Vec<GroupDef>,
    pub attribute_groups: Vec<AttributeGroupDef>,
    pub target_namespace: Option<String>,
    /// Every schema file pulled in via `xs:include`, in inclusion order.
    pub included_files: Vec<PathBuf>,
}

impl Schema {
    /// Reads the schema file at `path` and every transitively included
    /// schema, merging all top-level components into one `Schema`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut schema = Self::default();
        let mut seen = HashSet::new();
        seen.insert(path.to_path_buf());
        schema.load_file(path, &mut seen)?;
        Ok(schema)
    }

    fn load_file(&mut self, path: &Path, seen: &mut HashSet<PathBuf>) -> Result<(), Error> {
        debug!("reading schema {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| Error::SchemaIo {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let document = roxmltree::Document::parse(&text).map_err(|e| Error::SchemaIo {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let root = document.root_element();
        if root.tag_name().name() != "schema" {
            return Err(Error::SchemaIo {
                path: path.to_path_buf(),
                reason: format!("root element is <{}>, not <schema>", root.tag_name().name()),
            });
        }

        // Includes are assembled before the including document's own
        // components (§4.2.3, assembling a schema from multiple
        // documents). Each file is pulled in at most once.
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for include in root.children().filter(|c| c.tag_name().name() == "include") {
            let location = include.attribute("schemaLocation").ok_or_else(|| {
                Error::Structural("include without schemaLocation".to_string())
            })?;
            let included = base_dir.join(location);
            if seen.insert(included.clone()) {
                self.included_files.push(included.clone());
                self.load_file(&included, seen)?;
            }
        }

        self.merge(Self::map_from_xml(root)?)
    }

    /// Maps the top-level components of a single `<schema>` document.
    /// Includes are not followed here; `load` is responsible for that.
    pub fn map_from_xml(schema: Node) -> Result<Self, Error> {
        let mut mapped = Self {
            target_namespace: schema.attribute("targetNamespace").map(str::to_string),
            ..Self::default()
        };

        for top_level in schema.children().filter(Node::is_element) {
            match top_level.tag_name().name() {
                SimpleTypeDef::TAG_NAME => {
                    let simple_type = SimpleTypeDef::map_from_xml(top_level)?;
                    require_name(simple_type.name.as_deref(), SimpleTypeDef::TAG_NAME)?;
                    mapped.types.push(TypeDef::Simple(simple_type));
                }
                ComplexTypeDef::TAG_NAME => {
                    let complex_type = ComplexTypeDef::map_from_xml(top_level)?;
                    require_name(complex_type.name.as_deref(), ComplexTypeDef::TAG_NAME)?;
                    mapped.types.push(TypeDef::Complex(complex_type));
                }
                ElementDecl::TAG_NAME => mapped.elements.push(ElementDecl::map_from_xml(
                    top_level,
                    ElementVariant::Normal,
                    false,
                )?),
                AttributeDecl::TAG_NAME => mapped
                    .attributes
                    .push(AttributeDecl::map_from_xml(top_level)?),
                GroupDef::TAG_NAME => mapped.groups.push(GroupDef::map_from_xml(top_level)?),
                AttributeGroupDef::TAG_NAME => mapped
                    .attribute_groups
                    .push(AttributeGroupDef::map_from_xml(top_level)?),
                "include" | "annotation" => {}
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported top-level element <{other}>"
                    )))
                }
            }
        }

        Ok(mapped)
    }

    /// Merges the components of one mapped document into the aggregate,
    /// enforcing name uniqueness within each kind.
    fn merge(&mut self, other: Self) -> Result<(), Error> {
        if self.target_namespace.is_none() {
            self.target_namespace = other.target_namespace;
        }
        for type_def in other.types {
            if let Some(name) = type_def.name() {
                if self.type_by_name(name).is_some() {
                    return Err(Error::NameCollision(format!("duplicate type {name}")));
                }
            }
            self.types.push(type_def);
        }
        for element in other.elements {
            if self.element_by_name(&element.name).is_some() {
                return Err(Error::NameCollision(format!(
                    "duplicate element {}",
                    element.name
                )));
            }
            self.elements.push(element);
        }
        for attribute in other.attributes {
            if self.attribute_by_name(&attribute.name).is_some() {
                return Err(Error::NameCollision(format!(
                    "duplicate attribute {}",
                    attribute.name
                )));
            }
            self.attributes.push(attribute);
        }
        for group in other.groups {
            if let Some(name) = group.name.as_deref() {
                if self.group_by_name(name).is_some() {
                    return Err(Error::NameCollision(format!("duplicate group {name}")));
                }
            }
            self.groups.push(group);
        }
        for attribute_group in other.attribute_groups {
            if let Some(name) = attribute_group.name.as_deref() {
                if self.attribute_group_by_name(name).is_some() {
                    return Err(Error::NameCollision(format!(
                        "duplicate attributeGroup {name}"
                    )));
                }
            }
            self.attribute_groups.push(attribute_group);
        }
        Ok(())
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name() == Some(name))
    }

    pub fn element_by_name(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&GroupDef> {
        self.groups.iter().find(|g| g.name.as_deref() == Some(name))
    }

    pub fn attribute_group_by_name(&self, name: &str) -> Option<&AttributeGroupDef> {
        self.attribute_groups
            .iter()
            .find(|g| g.name.as_deref() == Some(name))
    }
}

fn require_name(name: Option<&str>, kind: &str) -> Result<(), Error> {
    if name.is_none() {
        return Err(Error::Structural(format!("unnamed top-level <{kind}>")));
    }
    Ok(())
}
