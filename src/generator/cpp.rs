use std::collections::HashSet;

use log::debug;

use super::naming::{self, NameRegistry};
use super::primitives::ValueKind;
use super::resolver::{LoweredType, Resolver, ValueType};
use super::{GeneratedFiles, Options};
use crate::error::Error;
use crate::xsd::{
    ComplexTypeDef, ElementDecl, ElementVariant, Schema, SimpleTypeDef, TypeDef, TypeUse,
};

/// One flattened element member, lowered and named for emission.
struct ElementPlan<'s> {
    xml_name: String,
    variable: String,
    lowered: LoweredType,
    multiple: bool,
    required: bool,
    own: bool,
    /// The inline complex type to emit as a nested class, set for own
    /// local elements carrying one.
    inline_complex: Option<&'s ComplexTypeDef>,
}

impl ElementPlan<'_> {
    /// Complex-typed and repeated elements are stored in a vector.
    fn is_collection(&self) -> bool {
        self.multiple || matches!(self.lowered, LoweredType::Complex(_))
    }

    /// The type of one stored element value.
    fn value_type(&self) -> String {
        match &self.lowered {
            LoweredType::Complex(class_name) => class_name.clone(),
            LoweredType::Value(value) => value.full_type(),
        }
    }

    /// The member field type.
    fn field_type(&self) -> String {
        let value_type = self.value_type();
        if self.is_collection() {
            format!("std::vector<{value_type}>")
        } else if self.required {
            value_type
        } else {
            format!("std::optional<{value_type}>")
        }
    }

    fn value(&self) -> Option<&ValueType> {
        match &self.lowered {
            LoweredType::Value(value) => Some(value),
            LoweredType::Complex(_) => None,
        }
    }

    fn movable(&self) -> bool {
        self.is_collection() || self.value().is_some_and(|value| value.is_list)
    }
}

/// One flattened attribute member.
struct AttributePlan {
    xml_name: String,
    variable: String,
    value: ValueType,
    required: bool,
    own: bool,
}

impl AttributePlan {
    fn field_type(&self) -> String {
        let value_type = self.value.full_type();
        if self.required {
            value_type
        } else {
            format!("std::optional<{value_type}>")
        }
    }
}

struct RootPlan {
    xml_name: String,
    suffix: String,
    lowered: LoweredType,
}

impl RootPlan {
    fn cpp_type(&self) -> String {
        match &self.lowered {
            LoweredType::Complex(class_name) => class_name.clone(),
            LoweredType::Value(value) => value.full_type(),
        }
    }
}

pub(super) struct CppGenerator<'s> {
    schema: &'s Schema,
    options: &'s Options,
    resolver: Resolver<'s>,
    names: NameRegistry,
    namespace: Vec<String>,
    stem: String,
    parser_header: String,
    parser_impl: String,
    enums_header: String,
    enums_impl: String,
}

impl<'s> CppGenerator<'s> {
    pub(super) fn new(schema: &'s Schema, options: &'s Options) -> Self {
        let namespace = options
            .package
            .split('.')
            .map(naming::to_namespace_segment)
            .collect();
        Self {
            schema,
            options,
            resolver: Resolver::new(schema),
            names: NameRegistry::new(),
            namespace,
            stem: options.package.replace('.', "_"),
            parser_header: String::new(),
            parser_impl: String::new(),
            enums_header: String::new(),
            enums_impl: String::new(),
        }
    }

    pub(super) fn generate(mut self) -> Result<GeneratedFiles, Error> {
        let enums = self.collect_enums();
        for (_, class_name) in &enums {
            self.names.register(class_name)?;
        }
        let roots = self.root_plans()?;

        debug!(
            "generating package {}: {} enums, {} types, {} roots",
            self.options.package,
            enums.len(),
            self.schema.types.len(),
            roots.len()
        );

        if !self.options.parser_only {
            self.emit_enum_files(&enums)?;
        }
        if !self.options.enums_only {
            self.emit_parser_files(!enums.is_empty(), &roots)?;
        }

        Ok(GeneratedFiles {
            file_stem: self.stem,
            parser_header: self.parser_header,
            parser_impl: self.parser_impl,
            enums_header: self.enums_header,
            enums_impl: self.enums_impl,
        })
    }

    fn collect_enums(&self) -> Vec<(&'s SimpleTypeDef, String)> {
        self.schema
            .types
            .iter()
            .filter_map(|type_def| match type_def {
                TypeDef::Simple(simple_type) if simple_type.is_enum() => Some((
                    simple_type,
                    naming::to_class_name(simple_type.name.as_deref().unwrap_or_default()),
                )),
                _ => None,
            })
            .collect()
    }

    /// The elements to derive entrypoints from: the user-selected set,
    /// or the schema's single top-level element.
    fn root_plans(&mut self) -> Result<Vec<RootPlan>, Error> {
        let elements: Vec<&'s ElementDecl> = if self.options.roots.is_empty() {
            match self.schema.elements.len() {
                0 | 1 => self.schema.elements.iter().collect(),
                _ => {
                    let candidates = self
                        .schema
                        .elements
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(Error::Usage(format!(
                        "multiple root elements, pick with --root: {candidates}"
                    )));
                }
            }
        } else {
            self.options
                .roots
                .iter()
                .map(|root| {
                    self.schema
                        .element_by_name(root)
                        .ok_or_else(|| Error::Usage(format!("unknown root element {root}")))
                })
                .collect::<Result<_, _>>()?
        };

        let qualify = self.schema.elements.len() > 1;
        elements
            .into_iter()
            .map(|element| {
                let lowered = self
                    .resolver
                    .parse_type(element.type_use.as_ref(), &element.name)?;
                Ok(RootPlan {
                    xml_name: element.name.clone(),
                    suffix: if qualify {
                        naming::to_class_name(&element.name)
                    } else {
                        String::new()
                    },
                    lowered,
                })
            })
            .collect()
    }

    // ---- shared layout ----------------------------------------------

    fn namespace_open(&self) -> String {
        let mut out = String::new();
        for segment in &self.namespace {
            out.push_str(&format!("namespace {segment} {{\n"));
        }
        out
    }

    fn namespace_close(&self) -> String {
        let mut out = String::new();
        for segment in self.namespace.iter().rev() {
            out.push_str(&format!("}}  // namespace {segment}\n"));
        }
        out
    }

    fn node_parameter(&self) -> &'static str {
        if self.options.tinyxml {
            "const tinyxml2::XMLElement *"
        } else {
            "xmlNode *"
        }
    }

    fn tag_matches(&self, node: &str, name: &str) -> String {
        if self.options.tinyxml {
            format!("!strcmp({node}->Name(), \"{name}\")")
        } else {
            format!("!xmlStrcmp({node}->name, reinterpret_cast<const xmlChar *>(\"{name}\"))")
        }
    }

    // ---- enum emission ----------------------------------------------

    fn emit_enum_files(&mut self, enums: &[(&'s SimpleTypeDef, String)]) -> Result<(), Error> {
        if enums.is_empty() {
            return Ok(());
        }

        let guard = format!("{}_ENUMS_H", self.stem.to_uppercase());
        let open = self.namespace_open();
        let close = self.namespace_close();
        let namespace_path = self.namespace.join("::");

        self.enums_header
            .push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        self.enums_header
            .push_str("#include <array>\n#include <string>\n\n");
        self.enums_header.push_str(&open);
        self.enums_header.push('\n');

        self.enums_impl
            .push_str(&format!("#include \"{}_enums.h\"\n\n#include <map>\n\n", self.stem));
        self.enums_impl.push_str(&open);
        self.enums_impl.push('\n');

        // Reflective member listing in schema order, kept outside the
        // package namespace.
        let mut details = String::new();
        details.push_str("namespace xsdcpp {\nnamespace details {\n");
        details.push_str("template <typename T> struct EnumValues;\n");

        for (simple_type, class_name) in enums {
            let mut members = Vec::new();
            let mut seen = HashSet::new();
            for literal in simple_type.enumerations() {
                let member = naming::to_enum_member_name(literal);
                if !seen.insert(member.clone()) {
                    return Err(Error::NameCollision(format!("{class_name}::{member}")));
                }
                members.push((literal.as_str(), member));
            }

            self.enums_header.push_str(&format!("enum class {class_name} {{\n"));
            self.enums_header
                .push_str(&format!("    {} = -1,\n", naming::UNKNOWN_MEMBER));
            for (_, member) in &members {
                self.enums_header.push_str(&format!("    {member},\n"));
            }
            self.enums_header.push_str("};\n\n");
            self.enums_header
                .push_str(&format!("{class_name} stringTo{class_name}(const std::string &value);\n"));
            self.enums_header
                .push_str(&format!("std::string toString({class_name} o);\n\n"));

            // The lookup table carries the real members only; a miss
            // maps to the sentinel.
            self.enums_impl.push_str(&format!(
                "const std::map<std::string, {class_name}> {class_name}String {{\n"
            ));
            for (literal, member) in &members {
                self.enums_impl
                    .push_str(&format!("    {{\"{literal}\", {class_name}::{member}}},\n"));
            }
            self.enums_impl.push_str("};\n\n");
            self.enums_impl.push_str(&format!(
                "{class_name} stringTo{class_name}(const std::string &value) {{\n\
                 \x20   auto enumValue = {class_name}String.find(value);\n\
                 \x20   return enumValue != {class_name}String.end() ? enumValue->second : {class_name}::{};\n\
                 }}\n\n",
                naming::UNKNOWN_MEMBER
            ));
            self.enums_impl
                .push_str(&format!("std::string toString({class_name} o) {{\n    switch (o) {{\n"));
            for (literal, member) in &members {
                self.enums_impl.push_str(&format!(
                    "        case {class_name}::{member}: return \"{literal}\";\n"
                ));
            }
            self.enums_impl
                .push_str("        default: return std::to_string(static_cast<int>(o));\n");
            self.enums_impl.push_str("    }\n}\n\n");

            let qualified = format!("::{namespace_path}::{class_name}");
            details.push_str(&format!("template <>\nstruct EnumValues<{qualified}> {{\n"));
            details.push_str(&format!(
                "    static constexpr std::array<{qualified}, {}> values = {{\n",
                members.len()
            ));
            for (_, member) in &members {
                details.push_str(&format!("        {qualified}::{member},\n"));
            }
            details.push_str("    };\n};\n");
        }

        details.push_str("}  // namespace details\n}  // namespace xsdcpp\n");

        self.enums_header.push_str(&close);
        self.enums_header.push('\n');
        self.enums_header.push_str(&details);
        self.enums_header.push_str(&format!("\n#endif  // {guard}\n"));

        self.enums_impl.push_str(&close);
        Ok(())
    }

    // ---- parser emission --------------------------------------------

    fn emit_parser_files(&mut self, has_enums: bool, roots: &[RootPlan]) -> Result<(), Error> {
        let guard = format!("{}_H", self.stem.to_uppercase());
        let open = self.namespace_open();
        let close = self.namespace_close();

        self.parser_header
            .push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        self.parser_header
            .push_str("#include <optional>\n#include <string>\n#include <vector>\n");
        if self.options.writer {
            self.parser_header.push_str("#include <ostream>\n");
        }
        self.parser_header.push('\n');
        if self.options.tinyxml {
            self.parser_header.push_str("#include <tinyxml2.h>\n\n");
        } else {
            self.parser_header
                .push_str("#include <libxml/parser.h>\n#include <libxml/xinclude.h>\n\n");
        }
        if has_enums {
            self.parser_header
                .push_str(&format!("#include \"{}_enums.h\"\n\n", self.stem));
        }
        self.parser_header.push_str(&open);
        self.parser_header.push('\n');

        // Forward declarations keep recursive element containment
        // representable; every namespace-level class appears here.
        let schema = self.schema;
        let mut forward = String::new();
        for type_def in &schema.types {
            if let Some(name) = type_def.name() {
                if matches!(type_def, TypeDef::Complex(_)) {
                    forward.push_str(&format!("class {};\n", naming::to_class_name(name)));
                }
            }
        }
        for element in &schema.elements {
            if matches!(element.type_use, Some(TypeUse::InlineComplex(_))) {
                forward.push_str(&format!("class {};\n", naming::to_class_name(&element.name)));
            }
        }
        if !forward.is_empty() {
            self.parser_header.push_str(&forward);
            self.parser_header.push('\n');
        }

        self.emit_implementation_prelude(&open);

        // Named complex types first, element-rooted anonymous types
        // after them, both in declaration order.
        for type_def in &schema.types {
            if let TypeDef::Complex(complex_type) = type_def {
                let class_name =
                    naming::to_class_name(complex_type.name.as_deref().unwrap_or_default());
                let mut declaration = String::new();
                self.emit_class(complex_type, &[class_name], 0, &mut declaration)?;
                self.parser_header.push_str(&declaration);
            }
        }
        for element in &schema.elements {
            if let Some(TypeUse::InlineComplex(complex_type)) = element.type_use.as_ref() {
                let class_name = naming::to_class_name(&element.name);
                let mut declaration = String::new();
                self.emit_class(complex_type, &[class_name], 0, &mut declaration)?;
                self.parser_header.push_str(&declaration);
            }
        }

        self.emit_entrypoints(roots);

        self.parser_header.push_str(&close);
        self.parser_header
            .push_str(&format!("\n#endif  // {guard}\n"));
        self.parser_impl.push_str(&close);
        Ok(())
    }

    /// Includes, the abort guard, the DOM helpers, and the writer's
    /// indent state of the generated implementation file.
    fn emit_implementation_prelude(&mut self, namespace_open: &str) {
        self.parser_impl
            .push_str(&format!("#include \"{}.h\"\n\n", self.stem));
        self.parser_impl
            .push_str("#include <cstdio>\n#include <cstdlib>\n#include <sstream>\n");
        if self.options.tinyxml {
            self.parser_impl.push_str("#include <cstring>\n");
        } else {
            self.parser_impl.push_str("#include <memory>\n");
        }
        self.parser_impl.push('\n');
        self.parser_impl.push_str(
            r#"#define _xsdc_assert(e)                                                      \
    do {                                                                     \
        if (!(e)) {                                                          \
            fprintf(stderr, "%s:%d: assertion '%s' failed\n", __FILE__,      \
                    __LINE__, #e);                                           \
            abort();                                                         \
        }                                                                    \
    } while (false)

"#,
        );
        self.parser_impl.push_str(namespace_open);
        self.parser_impl.push('\n');

        if self.options.tinyxml {
            self.parser_impl.push_str(
                r#"static std::string getXmlAttribute(const tinyxml2::XMLElement *element,
                                   const char *attribute) {
    const char *value = element->Attribute(attribute);
    if (value == nullptr) {
        return "";
    }
    return value;
}

static std::string getXmlContent(const tinyxml2::XMLElement *element) {
    std::string content;
    for (const tinyxml2::XMLNode *child = element->FirstChild(); child != nullptr;
         child = child->NextSibling()) {
        if (child->ToText() != nullptr) {
            content += child->Value();
        }
    }
    return content;
}

"#,
            );
        } else {
            self.parser_impl.push_str(
                r#"struct XmlCharDeleter {
    void operator()(xmlChar *value) const { xmlFree(value); }
};
using XmlCharPtr = std::unique_ptr<xmlChar, XmlCharDeleter>;

struct XmlDocDeleter {
    void operator()(xmlDoc *doc) const { xmlFreeDoc(doc); }
};
using XmlDocPtr = std::unique_ptr<xmlDoc, XmlDocDeleter>;

static std::string getXmlAttribute(const xmlNode *node, const char *attribute) {
    XmlCharPtr value(xmlGetProp(const_cast<xmlNode *>(node),
                                reinterpret_cast<const xmlChar *>(attribute)));
    if (value == nullptr) {
        return "";
    }
    return reinterpret_cast<const char *>(value.get());
}

static std::string getXmlContent(const xmlNode *node) {
    XmlCharPtr content(xmlNodeListGetString(node->doc, node->xmlChildrenNode, 1));
    if (content == nullptr) {
        return "";
    }
    return reinterpret_cast<const char *>(content.get());
}

"#,
            );
        }

        if self.options.writer {
            self.parser_impl.push_str(
                r#"static int _indentDepth = 0;

static std::string printIndent() {
    std::string indent;
    for (int i = 0; i < _indentDepth; ++i) {
        indent += "    ";
    }
    return indent;
}

"#,
            );
        }
    }

    // ---- member planning --------------------------------------------

    fn plan_members(
        &mut self,
        complex_type: &'s ComplexTypeDef,
        path: &[String],
    ) -> Result<(Vec<ElementPlan<'s>>, Vec<AttributePlan>), Error> {
        let (stacked_elements, stacked_attributes) =
            self.resolver.stack_components(complex_type)?;
        let current = path.join("::");

        let mut elements = Vec::with_capacity(stacked_elements.len());
        for stacked in stacked_elements {
            let resolved = self.resolver.resolve_element(stacked.element)?;
            let mut variable = naming::to_variable_name(&stacked.element.name);
            match stacked.element.variant {
                ElementVariant::Choice => variable.push_str("_optional"),
                ElementVariant::All => variable.push_str("_all"),
                ElementVariant::Normal => {}
            }

            let lowered = self
                .resolver
                .parse_type(resolved.type_use.as_ref(), &resolved.name)?;
            let inline_complex = match resolved.type_use.as_ref() {
                Some(TypeUse::InlineComplex(inline)) if stacked.element.reference.is_none() => {
                    Some(inline)
                }
                _ => None,
            };
            // An anonymous inline class is owned by its element and
            // nested in the class of the complex type that declared it;
            // a referenced top-level element's class lives at namespace
            // level under the element's own name.
            let lowered = match lowered {
                LoweredType::Complex(class_name) if inline_complex.is_some() => {
                    let prefix = match stacked.owner {
                        owner if owner == complex_type.name.as_deref() => current.clone(),
                        Some(owner) => naming::to_class_name(owner),
                        None => current.clone(),
                    };
                    LoweredType::Complex(format!("{prefix}::{class_name}"))
                }
                other => other,
            };
            let own = stacked.owner == complex_type.name.as_deref();

            elements.push(ElementPlan {
                xml_name: resolved.name.clone(),
                variable,
                lowered,
                multiple: stacked.element.multiple,
                required: stacked.element.required,
                own,
                inline_complex: inline_complex.filter(|_| own),
            });
        }

        let mut attributes = Vec::with_capacity(stacked_attributes.len());
        for stacked in stacked_attributes {
            let resolved = self.resolver.resolve_attribute(stacked.attribute)?;
            let lowered = self
                .resolver
                .parse_type(resolved.type_use.as_ref(), &resolved.name)?;
            let value = match lowered {
                LoweredType::Value(value) => value,
                LoweredType::Complex(_) => {
                    return Err(Error::Structural(format!(
                        "attribute {} has a complex type",
                        resolved.name
                    )))
                }
            };
            attributes.push(AttributePlan {
                xml_name: resolved.name.clone(),
                variable: naming::to_variable_name(&stacked.attribute.name),
                value,
                required: stacked.attribute.required,
                own: stacked.owner == complex_type.name.as_deref(),
            });
        }

        Ok((elements, attributes))
    }

    // ---- class emission ---------------------------------------------

    fn emit_class(
        &mut self,
        complex_type: &'s ComplexTypeDef,
        path: &[String],
        indent: usize,
        declaration: &mut String,
    ) -> Result<(), Error> {
        let leaf = path.last().cloned().unwrap_or_default();
        self.names.register(&leaf)?;

        let (elements, attributes) = self.plan_members(complex_type, path)?;
        let base_class = self.resolver.base_class(complex_type)?;
        let value = if complex_type.simple_content {
            Some(self.resolver.value_type(complex_type)?)
        } else {
            None
        };
        let own_value = self.resolver.has_own_value(complex_type)?;

        let qualified = path.join("::");
        let i0 = "    ".repeat(indent);
        let i1 = format!("{i0}    ");

        match &base_class {
            Some(base) => {
                declaration.push_str(&format!("{i0}class {leaf} : public {base} {{\n"))
            }
            None => declaration.push_str(&format!("{i0}class {leaf} {{\n")),
        }

        // Nested classes for anonymous inline types come first so the
        // enclosing members can refer to them.
        let nested: Vec<(&'s ComplexTypeDef, String)> = elements
            .iter()
            .filter_map(|plan| {
                plan.inline_complex
                    .map(|inline| (inline, naming::to_class_name(&plan.xml_name)))
            })
            .collect();
        if !nested.is_empty() {
            declaration.push_str(&format!("{i1}public:\n"));
            for (inner, inner_class) in nested {
                let mut inner_path = path.to_vec();
                inner_path.push(inner_class);
                self.emit_class(inner, &inner_path, indent + 1, declaration)?;
            }
        }

        declaration.push_str(&format!("{i1}private:\n"));
        for plan in elements.iter().filter(|p| p.own) {
            declaration.push_str(&format!(
                "{i1}const {} {}_;\n",
                plan.field_type(),
                plan.variable
            ));
        }
        for plan in attributes.iter().filter(|p| p.own) {
            declaration.push_str(&format!(
                "{i1}const {} {}_;\n",
                plan.field_type(),
                plan.variable
            ));
        }
        if own_value {
            if let Some(value) = value.as_ref() {
                declaration.push_str(&format!(
                    "{i1}std::optional<{}> value_;\n",
                    value.full_type()
                ));
            }
        }

        declaration.push_str(&format!("{i1}public:\n"));
        self.emit_constructor(
            &qualified,
            &leaf,
            &i1,
            &elements,
            &attributes,
            base_class.as_deref(),
            declaration,
        );
        self.emit_accessors(&qualified, &i1, &elements, &attributes, declaration);
        if own_value {
            if let Some(value) = value.as_ref() {
                self.emit_value_accessors(&qualified, &i1, value, declaration);
            }
        }

        declaration.push_str(&format!(
            "{i1}static {leaf} read({}_root);\n",
            self.node_parameter()
        ));
        self.emit_read(&qualified, &leaf, &elements, &attributes, value.as_ref());

        if self.options.writer {
            declaration.push_str(&format!(
                "{i1}void write(std::ostream &_out, const std::string &_name) const;\n"
            ));
            self.emit_write(&qualified, &elements, &attributes, value.as_ref());
        }

        declaration.push_str(&format!("{i0}}};\n\n"));
        Ok(())
    }

    fn forwarded(variable: &str, movable: bool) -> String {
        if movable {
            format!("std::move({variable})")
        } else {
            variable.to_string()
        }
    }

    fn emit_constructor(
        &mut self,
        qualified: &str,
        leaf: &str,
        i1: &str,
        elements: &[ElementPlan],
        attributes: &[AttributePlan],
        base_class: Option<&str>,
        declaration: &mut String,
    ) {
        // Flattened elements first, attributes after them, both in
        // stacking order; inherited values travel up to the base
        // constructor, own ones initialize the fields.
        let mut signature = Vec::new();
        for plan in elements {
            signature.push(format!("{} {}", plan.field_type(), plan.variable));
        }
        for plan in attributes {
            signature.push(format!("{} {}", plan.field_type(), plan.variable));
        }
        let explicit = if signature.len() == 1 { "explicit " } else { "" };
        let signature = signature.join(", ");
        declaration.push_str(&format!("{i1}{explicit}{leaf}({signature});\n"));

        let mut initializers = Vec::new();
        if let Some(base) = base_class {
            let mut base_arguments = Vec::new();
            for plan in elements.iter().filter(|p| !p.own) {
                base_arguments.push(Self::forwarded(&plan.variable, plan.movable()));
            }
            for plan in attributes.iter().filter(|p| !p.own) {
                base_arguments.push(Self::forwarded(&plan.variable, plan.value.is_list));
            }
            initializers.push(format!("{base}({})", base_arguments.join(", ")));
        }
        for plan in elements.iter().filter(|p| p.own) {
            initializers.push(format!(
                "{}_({})",
                plan.variable,
                Self::forwarded(&plan.variable, plan.movable())
            ));
        }
        for plan in attributes.iter().filter(|p| p.own) {
            initializers.push(format!(
                "{}_({})",
                plan.variable,
                Self::forwarded(&plan.variable, plan.value.is_list)
            ));
        }

        self.parser_impl
            .push_str(&format!("{qualified}::{leaf}({signature})"));
        if !initializers.is_empty() {
            self.parser_impl
                .push_str(&format!("\n    : {}", initializers.join(", ")));
        }
        self.parser_impl.push_str(" {}\n\n");
    }

    fn getter_name(&self, kind: Option<ValueKind>, suffix: &str) -> String {
        if self.options.boolean_getter && kind == Some(ValueKind::Bool) {
            format!("is{suffix}")
        } else {
            format!("get{suffix}")
        }
    }

    /// Accessors are generated for the own members only; inherited ones
    /// come with the base class.
    fn emit_accessors(
        &mut self,
        qualified: &str,
        i1: &str,
        elements: &[ElementPlan],
        attributes: &[AttributePlan],
        declaration: &mut String,
    ) {
        for plan in elements.iter().filter(|p| p.own) {
            let suffix = naming::accessor_suffix(&plan.variable);
            let value_type = plan.value_type();
            let getter = self.getter_name(plan.value().map(|v| v.kind), &suffix);
            let field = format!("{}_", plan.variable);

            if plan.is_collection() {
                declaration.push_str(&format!(
                    "{i1}const std::vector<{value_type}> &{getter}() const;\n"
                ));
                declaration.push_str(&format!("{i1}bool has{suffix}() const;\n"));
                self.parser_impl.push_str(&format!(
                    "const std::vector<{value_type}> &{qualified}::{getter}() const {{\n    return {field};\n}}\n\n"
                ));
                self.parser_impl.push_str(&format!(
                    "bool {qualified}::has{suffix}() const {{\n    return !({field}.empty());\n}}\n\n"
                ));
                // Pointer to element 0; vector<bool> has no addressable
                // storage, so booleans come back by value with a false
                // default.
                let scalar_bool = matches!(
                    plan.value(),
                    Some(value) if value.kind == ValueKind::Bool && !value.is_list
                );
                if scalar_bool {
                    declaration.push_str(&format!("{i1}bool getFirst{suffix}() const;\n"));
                    self.parser_impl.push_str(&format!(
                        "bool {qualified}::getFirst{suffix}() const {{\n    if ({field}.empty()) {{\n        return false;\n    }}\n    return {field}[0];\n}}\n\n"
                    ));
                } else {
                    declaration.push_str(&format!(
                        "{i1}const {value_type} *getFirst{suffix}() const;\n"
                    ));
                    self.parser_impl.push_str(&format!(
                        "const {value_type} *{qualified}::getFirst{suffix}() const {{\n    if ({field}.empty()) {{\n        return nullptr;\n    }}\n    return &{field}[0];\n}}\n\n"
                    ));
                }
            } else {
                declaration.push_str(&format!("{i1}const {value_type} &{getter}() const;\n"));
                declaration.push_str(&format!("{i1}bool has{suffix}() const;\n"));
                if plan.required {
                    self.parser_impl.push_str(&format!(
                        "const {value_type} &{qualified}::{getter}() const {{\n    return {field};\n}}\n\n"
                    ));
                    self.parser_impl.push_str(&format!(
                        "bool {qualified}::has{suffix}() const {{\n    return true;\n}}\n\n"
                    ));
                } else {
                    self.parser_impl.push_str(&format!(
                        "const {value_type} &{qualified}::{getter}() const {{\n    _xsdc_assert({field}.has_value());\n    return {field}.value();\n}}\n\n"
                    ));
                    self.parser_impl.push_str(&format!(
                        "bool {qualified}::has{suffix}() const {{\n    return {field}.has_value();\n}}\n\n"
                    ));
                }
            }
        }

        for plan in attributes.iter().filter(|p| p.own) {
            let suffix = naming::accessor_suffix(&plan.variable);
            let value_type = plan.value.full_type();
            let getter = self.getter_name(Some(plan.value.kind), &suffix);
            let field = format!("{}_", plan.variable);
            declaration.push_str(&format!("{i1}const {value_type} &{getter}() const;\n"));
            declaration.push_str(&format!("{i1}bool has{suffix}() const;\n"));
            if plan.required {
                self.parser_impl.push_str(&format!(
                    "const {value_type} &{qualified}::{getter}() const {{\n    return {field};\n}}\n\n"
                ));
                self.parser_impl.push_str(&format!(
                    "bool {qualified}::has{suffix}() const {{\n    return true;\n}}\n\n"
                ));
            } else {
                self.parser_impl.push_str(&format!(
                    "const {value_type} &{qualified}::{getter}() const {{\n    _xsdc_assert({field}.has_value());\n    return {field}.value();\n}}\n\n"
                ));
                self.parser_impl.push_str(&format!(
                    "bool {qualified}::has{suffix}() const {{\n    return {field}.has_value();\n}}\n\n"
                ));
            }
        }
    }

    fn emit_value_accessors(
        &mut self,
        qualified: &str,
        i1: &str,
        value: &ValueType,
        declaration: &mut String,
    ) {
        let value_type = value.full_type();
        declaration.push_str(&format!("{i1}const {value_type} &getValue() const;\n"));
        declaration.push_str(&format!("{i1}bool hasValue() const;\n"));
        declaration.push_str(&format!("{i1}void setValue({value_type} value);\n"));
        self.parser_impl.push_str(&format!(
            "const {value_type} &{qualified}::getValue() const {{\n    _xsdc_assert(value_.has_value());\n    return value_.value();\n}}\n\n"
        ));
        self.parser_impl.push_str(&format!(
            "bool {qualified}::hasValue() const {{\n    return value_.has_value();\n}}\n\n"
        ));
        self.parser_impl.push_str(&format!(
            "void {qualified}::setValue({value_type} value) {{\n    value_ = std::move(value);\n}}\n\n"
        ));
    }

    // ---- read -------------------------------------------------------

    /// Parse one raw string into `target`; list values are tokenized on
    /// whitespace first.
    fn emit_value_parse(
        out: &mut String,
        value: &ValueType,
        raw: &str,
        target: &str,
        collection: bool,
        indent: &str,
    ) {
        if value.is_list {
            out.push_str(&format!("{indent}std::vector<{}> _list;\n", value.cpp_type));
            out.push_str(&format!("{indent}std::istringstream _stream({raw});\n"));
            out.push_str(&format!(
                "{indent}for (std::string _token; _stream >> _token;) {{\n"
            ));
            out.push_str(&format!(
                "{indent}    _list.push_back({});\n",
                value.parse_expr("_token")
            ));
            out.push_str(&format!("{indent}}}\n"));
            if collection {
                out.push_str(&format!("{indent}{target}.push_back(std::move(_list));\n"));
            } else {
                out.push_str(&format!("{indent}{target} = std::move(_list);\n"));
            }
        } else {
            let parsed = if value.parse_template == "{}" {
                format!("std::move({raw})")
            } else {
                value.parse_expr(raw)
            };
            if collection {
                out.push_str(&format!("{indent}{target}.push_back({parsed});\n"));
            } else {
                out.push_str(&format!("{indent}{target} = {parsed};\n"));
            }
        }
    }

    /// The local a required simple value is collected into, with its
    /// default: enums start at the sentinel, everything else is
    /// value-initialized.
    fn required_local(value: &ValueType, variable: &str) -> String {
        if value.kind == ValueKind::Enum && !value.is_list {
            format!(
                "{} {} = {}::{};\n",
                value.full_type(),
                variable,
                value.cpp_type,
                naming::UNKNOWN_MEMBER
            )
        } else {
            format!("{} {}{{}};\n", value.full_type(), variable)
        }
    }

    fn emit_read(
        &mut self,
        qualified: &str,
        leaf: &str,
        elements: &[ElementPlan],
        attributes: &[AttributePlan],
        value: Option<&ValueType>,
    ) {
        let mut body = String::new();
        body.push_str(&format!(
            "{qualified} {qualified}::read({}_root) {{\n",
            self.node_parameter()
        ));
        if !attributes.is_empty() || value.is_some() {
            body.push_str("    std::string _raw;\n");
        }

        for plan in attributes {
            body.push_str(&format!(
                "    _raw = getXmlAttribute(_root, \"{}\");\n",
                plan.xml_name
            ));
            if plan.required {
                body.push_str("    ");
                body.push_str(&Self::required_local(&plan.value, &plan.variable));
                body.push_str("    if (_raw != \"\") {\n");
                Self::emit_value_parse(
                    &mut body,
                    &plan.value,
                    "_raw",
                    &plan.variable,
                    false,
                    "        ",
                );
                body.push_str("    }\n");
            } else {
                body.push_str(&format!(
                    "    std::optional<{}> {};\n",
                    plan.value.full_type(),
                    plan.variable
                ));
                body.push_str("    if (_raw != \"\") {\n");
                if plan.value.is_list {
                    Self::emit_value_parse(
                        &mut body,
                        &plan.value,
                        "_raw",
                        &plan.variable,
                        false,
                        "        ",
                    );
                } else {
                    let parsed = if plan.value.parse_template == "{}" {
                        "_raw".to_string()
                    } else {
                        plan.value.parse_expr("_raw")
                    };
                    body.push_str(&format!("        {} = {};\n", plan.variable, parsed));
                }
                body.push_str("    }\n");
            }
        }

        for plan in elements {
            if plan.is_collection() {
                body.push_str(&format!(
                    "    std::vector<{}> {};\n",
                    plan.value_type(),
                    plan.variable
                ));
            } else if plan.required {
                body.push_str("    ");
                match plan.value() {
                    Some(value) => {
                        body.push_str(&Self::required_local(value, &plan.variable))
                    }
                    None => body.push_str(&format!(
                        "{} {}{{}};\n",
                        plan.value_type(),
                        plan.variable
                    )),
                }
            } else {
                body.push_str(&format!(
                    "    std::optional<{}> {};\n",
                    plan.value_type(),
                    plan.variable
                ));
            }
        }

        if value.is_none() && !elements.is_empty() {
            if self.options.tinyxml {
                body.push_str(
                    "    for (const tinyxml2::XMLElement *_child = _root->FirstChildElement(); _child != nullptr;\n         _child = _child->NextSiblingElement()) {\n",
                );
            } else {
                body.push_str(
                    "    for (xmlNode *_child = _root->xmlChildrenNode; _child != nullptr; _child = _child->next) {\n",
                );
            }
            for (index, plan) in elements.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "} else if" };
                body.push_str(&format!(
                    "        {keyword} ({}) {{\n",
                    self.tag_matches("_child", &plan.xml_name)
                ));
                match &plan.lowered {
                    LoweredType::Complex(class_name) => {
                        body.push_str(&format!(
                            "            {class_name} _value = {class_name}::read(_child);\n"
                        ));
                        body.push_str(&format!(
                            "            {}.push_back(std::move(_value));\n",
                            plan.variable
                        ));
                    }
                    LoweredType::Value(value) => {
                        body.push_str(
                            "            std::string _value = getXmlContent(_child);\n",
                        );
                        Self::emit_value_parse(
                            &mut body,
                            value,
                            "_value",
                            &plan.variable,
                            plan.is_collection(),
                            "            ",
                        );
                    }
                }
            }
            body.push_str("        }\n    }\n");
        }

        let mut arguments = Vec::new();
        for plan in elements {
            arguments.push(Self::forwarded(&plan.variable, plan.movable()));
        }
        for plan in attributes {
            arguments.push(Self::forwarded(&plan.variable, plan.value.is_list));
        }
        if arguments.is_empty() {
            body.push_str(&format!("    {leaf} _instance;\n"));
        } else {
            body.push_str(&format!("    {leaf} _instance({});\n", arguments.join(", ")));
        }

        if let Some(value) = value {
            body.push_str("    _raw = getXmlContent(_root);\n");
            body.push_str("    if (_raw != \"\") {\n");
            if value.is_list {
                body.push_str(&format!(
                    "        std::vector<{}> _list;\n",
                    value.cpp_type
                ));
                body.push_str("        std::istringstream _stream(_raw);\n");
                body.push_str("        for (std::string _token; _stream >> _token;) {\n");
                body.push_str(&format!(
                    "            _list.push_back({});\n",
                    value.parse_expr("_token")
                ));
                body.push_str("        }\n");
                body.push_str("        _instance.setValue(std::move(_list));\n");
            } else {
                let parsed = if value.parse_template == "{}" {
                    "std::move(_raw)".to_string()
                } else {
                    value.parse_expr("_raw")
                };
                body.push_str(&format!("        _instance.setValue({parsed});\n"));
            }
            body.push_str("    }\n");
        }

        body.push_str("    return _instance;\n}\n\n");
        self.parser_impl.push_str(&body);
    }

    // ---- write ------------------------------------------------------

    /// Stream a space-joined list value into the current output.
    fn emit_list_write(out: &mut String, value: &ValueType, source: &str, indent: &str) {
        out.push_str(&format!("{indent}bool _first = true;\n"));
        out.push_str(&format!("{indent}for (const auto &_item : {source}) {{\n"));
        out.push_str(&format!("{indent}    if (!_first) {{\n"));
        out.push_str(&format!("{indent}        _out << \" \";\n"));
        out.push_str(&format!("{indent}    }}\n"));
        out.push_str(&format!("{indent}    _first = false;\n"));
        out.push_str(&format!(
            "{indent}    _out << {};\n",
            value.write_expr("_item")
        ));
        out.push_str(&format!("{indent}}}\n"));
    }

    /// The writer emits the full flattened member list; inherited
    /// members are reachable through the base class accessors.
    fn emit_write(
        &mut self,
        qualified: &str,
        elements: &[ElementPlan],
        attributes: &[AttributePlan],
        value: Option<&ValueType>,
    ) {
        let mut body = String::new();
        body.push_str(&format!(
            "void {qualified}::write(std::ostream &_out, const std::string &_name) const {{\n"
        ));
        body.push_str("    _out << printIndent() << \"<\" << _name;\n");

        for plan in attributes {
            let suffix = naming::accessor_suffix(&plan.variable);
            let getter = self.getter_name(Some(plan.value.kind), &suffix);
            body.push_str(&format!("    if (has{suffix}()) {{\n"));
            if plan.value.is_list {
                body.push_str(&format!("        _out << \" {}=\\\"\";\n", plan.xml_name));
                Self::emit_list_write(&mut body, &plan.value, &format!("{getter}()"), "        ");
                body.push_str("        _out << \"\\\"\";\n");
            } else {
                body.push_str(&format!(
                    "        _out << \" {}=\\\"\" << {} << \"\\\"\";\n",
                    plan.xml_name,
                    plan.value.write_expr(&format!("{getter}()"))
                ));
            }
            body.push_str("    }\n");
        }

        if let Some(value) = value {
            body.push_str("    _out << \">\";\n");
            body.push_str("    if (hasValue()) {\n");
            if value.is_list {
                Self::emit_list_write(&mut body, value, "getValue()", "        ");
            } else {
                body.push_str(&format!(
                    "        _out << {};\n",
                    value.write_expr("getValue()")
                ));
            }
            body.push_str("    }\n");
            body.push_str("    _out << \"</\" << _name << \">\" << std::endl;\n");
        } else {
            body.push_str("    _out << \">\" << std::endl;\n");
            body.push_str("    ++_indentDepth;\n");
            for plan in elements {
                let suffix = naming::accessor_suffix(&plan.variable);
                let getter = self.getter_name(plan.value().map(|v| v.kind), &suffix);
                let xml = &plan.xml_name;
                match (&plan.lowered, plan.is_collection()) {
                    (LoweredType::Complex(_), _) => {
                        body.push_str(&format!(
                            "    for (const auto &_value : {getter}()) {{\n        _value.write(_out, \"{xml}\");\n    }}\n"
                        ));
                    }
                    (LoweredType::Value(value), true) => {
                        body.push_str(&format!("    for (const auto &_value : {getter}()) {{\n"));
                        if value.is_list {
                            body.push_str(&format!(
                                "        _out << printIndent() << \"<{xml}>\";\n"
                            ));
                            Self::emit_list_write(&mut body, value, "_value", "        ");
                            body.push_str(&format!("        _out << \"</{xml}>\" << std::endl;\n"));
                        } else {
                            body.push_str(&format!(
                                "        _out << printIndent() << \"<{xml}>\" << {} << \"</{xml}>\" << std::endl;\n",
                                value.write_expr("_value")
                            ));
                        }
                        body.push_str("    }\n");
                    }
                    (LoweredType::Value(value), false) => {
                        body.push_str(&format!("    if (has{suffix}()) {{\n"));
                        if value.is_list {
                            body.push_str(&format!(
                                "        _out << printIndent() << \"<{xml}>\";\n"
                            ));
                            Self::emit_list_write(
                                &mut body,
                                value,
                                &format!("{getter}()"),
                                "        ",
                            );
                            body.push_str(&format!("        _out << \"</{xml}>\" << std::endl;\n"));
                        } else {
                            body.push_str(&format!(
                                "        _out << printIndent() << \"<{xml}>\" << {} << \"</{xml}>\" << std::endl;\n",
                                value.write_expr(&format!("{getter}()"))
                            ));
                        }
                        body.push_str("    }\n");
                    }
                }
            }
            body.push_str("    --_indentDepth;\n");
            body.push_str("    _out << printIndent() << \"</\" << _name << \">\" << std::endl;\n");
        }

        body.push_str("}\n\n");
        self.parser_impl.push_str(&body);
    }

    // ---- entrypoints ------------------------------------------------

    fn emit_entrypoints(&mut self, roots: &[RootPlan]) {
        for root in roots {
            let cpp_type = root.cpp_type();
            let suffix = &root.suffix;

            self.parser_header.push_str(&format!(
                "std::optional<{cpp_type}> read{suffix}(const char *_configFile);\n"
            ));
            self.parser_header.push_str(&format!(
                "std::optional<{cpp_type}> parse{suffix}(const char *_xml);\n"
            ));
            if self.options.writer {
                self.parser_header.push_str(&format!(
                    "void write{suffix}(std::ostream &_out, const {cpp_type} &_value);\n"
                ));
            }

            self.emit_read_entrypoint(root, &cpp_type, false);
            self.emit_read_entrypoint(root, &cpp_type, true);
            if self.options.writer {
                self.emit_write_entrypoint(root, &cpp_type);
            }
        }
        if !roots.is_empty() {
            self.parser_header.push('\n');
        }
    }

    /// `read` opens a document from a file, `parse` from an in-memory
    /// buffer; everything after the root lookup is shared.
    fn emit_read_entrypoint(&mut self, root: &RootPlan, cpp_type: &str, from_buffer: bool) {
        let suffix = &root.suffix;
        let name = if from_buffer { "parse" } else { "read" };
        let parameter = if from_buffer { "_xml" } else { "_configFile" };
        let mut body = String::new();
        body.push_str(&format!(
            "std::optional<{cpp_type}> {name}{suffix}(const char *{parameter}) {{\n"
        ));
        if self.options.tinyxml {
            body.push_str("    tinyxml2::XMLDocument _doc;\n");
            if from_buffer {
                body.push_str(
                    "    if (_doc.Parse(_xml) != tinyxml2::XML_SUCCESS) {\n        return std::nullopt;\n    }\n",
                );
            } else {
                body.push_str(
                    "    if (_doc.LoadFile(_configFile) != tinyxml2::XML_SUCCESS) {\n        return std::nullopt;\n    }\n",
                );
            }
            body.push_str("    const tinyxml2::XMLElement *_root = _doc.RootElement();\n");
        } else {
            if from_buffer {
                body.push_str(
                    "    XmlDocPtr _doc(xmlParseDoc(reinterpret_cast<const xmlChar *>(_xml)));\n",
                );
            } else {
                body.push_str("    XmlDocPtr _doc(xmlParseFile(_configFile));\n");
            }
            body.push_str("    if (_doc == nullptr) {\n        return std::nullopt;\n    }\n");
            body.push_str(
                "    if (xmlXIncludeProcess(_doc.get()) < 0) {\n        return std::nullopt;\n    }\n",
            );
            body.push_str("    xmlNode *_root = xmlDocGetRootElement(_doc.get());\n");
        }
        body.push_str("    if (_root == nullptr) {\n        return std::nullopt;\n    }\n");
        body.push_str(&format!(
            "    if (!({})) {{\n        return std::nullopt;\n    }}\n",
            self.tag_matches("_root", &root.xml_name)
        ));

        match &root.lowered {
            LoweredType::Complex(class_name) => {
                body.push_str(&format!("    {class_name} _value = {class_name}::read(_root);\n"));
                body.push_str("    return _value;\n");
            }
            LoweredType::Value(value) => {
                body.push_str("    std::string _raw = getXmlContent(_root);\n");
                if value.is_list {
                    body.push_str(&format!("    std::vector<{}> _value;\n", value.cpp_type));
                    body.push_str("    std::istringstream _stream(_raw);\n");
                    body.push_str("    for (std::string _token; _stream >> _token;) {\n");
                    body.push_str(&format!(
                        "        _value.push_back({});\n",
                        value.parse_expr("_token")
                    ));
                    body.push_str("    }\n");
                    body.push_str("    return _value;\n");
                } else {
                    let parsed = if value.parse_template == "{}" {
                        "std::move(_raw)".to_string()
                    } else {
                        value.parse_expr("_raw")
                    };
                    body.push_str(&format!("    {} _value = {parsed};\n", value.cpp_type));
                    body.push_str("    return _value;\n");
                }
            }
        }
        body.push_str("}\n\n");
        self.parser_impl.push_str(&body);
    }

    fn emit_write_entrypoint(&mut self, root: &RootPlan, cpp_type: &str) {
        let suffix = &root.suffix;
        let xml = &root.xml_name;
        let mut body = String::new();
        body.push_str(&format!(
            "void write{suffix}(std::ostream &_out, const {cpp_type} &_value) {{\n"
        ));
        body.push_str(
            "    _out << \"<?xml version=\\\"1.0\\\" encoding=\\\"utf-8\\\"?>\" << std::endl;\n",
        );
        match &root.lowered {
            LoweredType::Complex(_) => {
                body.push_str(&format!("    _value.write(_out, \"{xml}\");\n"));
            }
            LoweredType::Value(value) => {
                if value.is_list {
                    body.push_str(&format!("    _out << \"<{xml}>\";\n"));
                    Self::emit_list_write(&mut body, value, "_value", "    ");
                    body.push_str(&format!("    _out << \"</{xml}>\" << std::endl;\n"));
                } else {
                    body.push_str(&format!(
                        "    _out << \"<{xml}>\" << {} << \"</{xml}>\" << std::endl;\n",
                        value.write_expr("_value")
                    ));
                }
            }
        }
        body.push_str("}\n\n");
        self.parser_impl.push_str(&body);
    }
}
