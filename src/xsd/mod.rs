pub mod attribute_decl;
pub mod attribute_group_def;
pub mod complex_type_def;
pub mod element_decl;
pub mod group_def;
pub mod schema;
pub mod shared;
pub mod simple_type_def;
pub mod xstypes;

pub use attribute_decl::AttributeDecl;
pub use attribute_group_def::AttributeGroupDef;
pub use complex_type_def::ComplexTypeDef;
pub use element_decl::{ElementDecl, ElementVariant};
pub use group_def::GroupDef;
pub use schema::{Schema, TypeDef};
pub use shared::TypeUse;
pub use simple_type_def::{SimpleDerivation, SimpleTypeDef};
pub use xstypes::QName;

/// Namespace used by the XML Schema specification (pt. 1, §1.3.1).
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

impl QName {
    /// True when the name points into the XSD namespace itself, i.e. it
    /// refers to a built-in type.
    pub fn is_builtin(&self) -> bool {
        self.namespace.as_deref() == Some(XS_NAMESPACE)
    }
}
