use std::fmt;

use crate::error::Error;

/// Qualified name with the prefix already resolved against the in-scope
/// namespace declarations of the node it was read from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = self.namespace.as_ref() {
            write!(f, "{{{}}}{}", namespace, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl QName {
    pub fn with_namespace(
        namespace: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn parse(source: &str, context: roxmltree::Node) -> Result<Self, Error> {
        if let Some((prefix, local)) = source.rsplit_once(':') {
            // The prefix xml is by definition bound to
            // http://www.w3.org/XML/1998/namespace.
            // (Namespaces in XML 1.0, §3, Reserved Prefixes and Namespace Names)
            let namespace = if prefix == "xml" {
                "http://www.w3.org/XML/1998/namespace"
            } else {
                context.lookup_namespace_uri(Some(prefix)).ok_or_else(|| {
                    Error::UnresolvedReference(format!("namespace prefix {prefix}"))
                })?
            };
            Ok(Self::with_namespace(Some(namespace), local))
        } else {
            // An unprefixed name takes the default namespace if one is in
            // scope. (Namespaces in XML 1.0, §6.2)
            let namespace = context.lookup_namespace_uri(None);
            Ok(Self::with_namespace(namespace, source))
        }
    }
}
