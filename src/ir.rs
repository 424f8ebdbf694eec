// Documentation tree produced by the resolver. Serializes to the JSON shape
// renderers consume (camelCase, `kind` discriminator).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocTag {
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    String(LiteralSlot),
    Number(LiteralSlot),
    Boolean(LiteralSlot),
    BigInt(LiteralSlot),
    Symbol,
    Null,
    Undefined,
    Void,
    Any,
    Unknown,
    Never,
    Object {
        properties: Vec<PropertyNode>,
    },
    Array {
        element: Box<TypeNode>,
    },
    Tuple {
        elements: Vec<TupleElementNode>,
    },
    Union {
        members: Vec<TypeNode>,
    },
    Intersection {
        properties: Vec<IntersectionEntry>,
    },
    Function {
        signatures: Vec<FunctionSignature>,
    },
    Component {
        signatures: Vec<ComponentSignature>,
    },
    Class(ClassNode),
    Enum {
        members: IndexMap<String, Value>,
    },
    Generic {
        #[serde(rename = "typeName")]
        type_name: String,
        arguments: Vec<TypeNode>,
    },
    Reference,
}

/// `value` is present for literal types only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteralSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyNode {
    #[serde(flatten)]
    pub node: TypeNode,
    pub is_optional: bool,
    pub is_readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterNode {
    #[serde(flatten)]
    pub node: TypeNode,
    pub is_optional: bool,
    #[serde(default)]
    pub is_rest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleElementNode {
    #[serde(flatten)]
    pub node: TypeNode,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_rest: bool,
}

/// Flattened property of an anonymous constituent, or a nested constituent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntersectionEntry {
    Property(PropertyNode),
    Type(TypeNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureModifier {
    Async,
    Generator,
    AsyncGenerator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    pub parameters: Vec<ParameterNode>,
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<SignatureModifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSignature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<ParameterNode>,
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<SignatureModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberScope {
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub properties: Vec<ClassPropertyNode>,
    pub methods: Vec<ClassMethodNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessors: Option<Vec<ClassAccessorNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructors: Option<Vec<FunctionSignature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Box<TypeNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<TypeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPropertyNode {
    #[serde(flatten)]
    pub property: PropertyNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<MemberScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMethodNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<MemberScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    pub signatures: Vec<FunctionSignature>,
    #[serde(rename = "type")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "accessor", rename_all = "camelCase")]
pub enum AccessorKind {
    Get {
        #[serde(rename = "returnType")]
        return_type: String,
    },
    Set {
        parameter: Box<ParameterNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAccessorNode {
    pub name: String,
    #[serde(flatten)]
    pub accessor: AccessorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<MemberScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(rename = "type")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

impl TypeNode {
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        TypeNode {
            kind,
            name: None,
            text: text.into(),
            file_path: None,
            position: None,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, NodeKind::Reference)
    }

    /// Properties of an `Object` node; `None` for every other kind.
    pub fn properties(&self) -> Option<&[PropertyNode]> {
        match &self.kind {
            NodeKind::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Properties of an object-shaped node. Intersections contribute their
    /// flattened properties and the properties of nested object nodes, in
    /// entry order.
    pub fn into_properties(self) -> Vec<PropertyNode> {
        match self.kind {
            NodeKind::Object { properties } => properties,
            NodeKind::Intersection { properties } => properties
                .into_iter()
                .flat_map(|entry| match entry {
                    IntersectionEntry::Property(prop) => vec![prop],
                    IntersectionEntry::Type(node) => node.into_properties(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::String(_) => "String",
            NodeKind::Number(_) => "Number",
            NodeKind::Boolean(_) => "Boolean",
            NodeKind::BigInt(_) => "BigInt",
            NodeKind::Symbol => "Symbol",
            NodeKind::Null => "Null",
            NodeKind::Undefined => "Undefined",
            NodeKind::Void => "Void",
            NodeKind::Any => "Any",
            NodeKind::Unknown => "Unknown",
            NodeKind::Never => "Never",
            NodeKind::Object { .. } => "Object",
            NodeKind::Array { .. } => "Array",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::Union { .. } => "Union",
            NodeKind::Intersection { .. } => "Intersection",
            NodeKind::Function { .. } => "Function",
            NodeKind::Component { .. } => "Component",
            NodeKind::Class(_) => "Class",
            NodeKind::Enum { .. } => "Enum",
            NodeKind::Generic { .. } => "Generic",
            NodeKind::Reference => "Reference",
        }
    }
}

impl PropertyNode {
    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }
}

impl ParameterNode {
    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }
}
