// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logic for parsing and interacting with schemas in Avro format.
//!
//! Schemas form arbitrary graphs (a record may reference itself), so all
//! nodes live in a [`SchemaTree`] arena and reference each other through
//! [`NodeId`]s. Named types are registered in the compiler's symbol table
//! at the id they will keep forever; a [`NodeVariant::Symbolic`] node
//! carries the id it resolved to.

mod name;
mod parser;

pub use crate::schema::name::{Name, Namespace, NamespaceRef};
pub use crate::schema::parser::{
    compile_json_schema, compile_json_schema_from_file, compile_json_schema_from_memory,
    compile_json_schema_from_reader, compile_json_schema_from_str,
};
use crate::{AvroResult, error::Details, types::Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use strum::{Display, EnumDiscriminants};

/// Represents documentation for complex Avro schemas.
pub type Documentation = Option<String>;

/// Index of a [`Node`] within its [`SchemaTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A schema node: the per-type payload plus the attributes any node may
/// carry.
#[derive(Clone, Debug)]
pub struct Node {
    variant: NodeVariant,
    doc: Documentation,
    logical_type: Option<LogicalType>,
}

/// The per-type payload of a [`Node`].
#[derive(Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(NodeType), derive(Display, Hash, Ord, PartialOrd))]
pub enum NodeVariant {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    Bytes,
    /// A `string` Avro schema.
    String,
    /// A `record` Avro schema.
    Record(RecordNode),
    /// An `enum` Avro schema.
    Enum(EnumNode),
    /// An `array` Avro schema. All items share one schema.
    Array(ArrayNode),
    /// A `map` Avro schema. Keys are always strings.
    Map(MapNode),
    /// A `union` Avro schema.
    Union(UnionNode),
    /// A `fixed` Avro schema.
    Fixed(FixedNode),
    /// A reference to a named schema, resolved through the compiler's
    /// symbol table.
    Symbolic(SymbolicNode),
}

/// A single field of a record schema.
#[derive(Clone, Debug)]
pub struct RecordField {
    /// Name of the field.
    pub name: String,
    /// Documentation of the field.
    pub doc: Documentation,
    /// Schema of the field.
    pub schema: NodeId,
    /// Default value of the field, already coerced against the field's
    /// schema. `None` means the field declares no default.
    pub default: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct RecordNode {
    pub name: Name,
    pub fields: Vec<RecordField>,
    /// Maps field names to their position in `fields`.
    pub lookup: BTreeMap<String, usize>,
}

#[derive(Clone, Debug)]
pub struct EnumNode {
    pub name: Name,
    pub symbols: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ArrayNode {
    pub items: NodeId,
}

#[derive(Clone, Debug)]
pub struct MapNode {
    pub values: NodeId,
}

#[derive(Clone, Debug)]
pub struct UnionNode {
    pub branches: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct FixedNode {
    pub name: Name,
    pub size: usize,
}

#[derive(Clone, Debug)]
pub struct SymbolicNode {
    pub name: Name,
    pub target: NodeId,
}

impl Node {
    pub(crate) fn new(variant: NodeVariant) -> Self {
        Self {
            variant,
            doc: None,
            logical_type: None,
        }
    }

    pub(crate) fn set_doc(&mut self, doc: String) {
        self.doc = Some(doc);
    }

    pub(crate) fn set_logical_type(&mut self, logical_type: LogicalType) {
        self.logical_type = Some(logical_type);
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from(&self.variant)
    }

    pub fn variant(&self) -> &NodeVariant {
        &self.variant
    }

    /// Returns the name of the node if it is a named type or a reference
    /// to one.
    pub fn name(&self) -> Option<&Name> {
        match &self.variant {
            NodeVariant::Record(RecordNode { name, .. })
            | NodeVariant::Enum(EnumNode { name, .. })
            | NodeVariant::Fixed(FixedNode { name, .. })
            | NodeVariant::Symbolic(SymbolicNode { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn logical_type(&self) -> Option<&LogicalType> {
        self.logical_type.as_ref()
    }

    /// The number of sub-schemas this node carries: record fields, union
    /// branches, the single item/value schema of arrays and maps.
    pub fn leaves(&self) -> usize {
        match &self.variant {
            NodeVariant::Record(record) => record.fields.len(),
            NodeVariant::Union(union) => union.branches.len(),
            NodeVariant::Array(_) | NodeVariant::Map(_) => 1,
            _ => 0,
        }
    }

    pub fn leaf_at(&self, index: usize) -> Option<NodeId> {
        match &self.variant {
            NodeVariant::Record(record) => record.fields.get(index).map(|f| f.schema),
            NodeVariant::Union(union) => union.branches.get(index).copied(),
            NodeVariant::Array(array) if index == 0 => Some(array.items),
            NodeVariant::Map(map) if index == 0 => Some(map.values),
            _ => None,
        }
    }

    /// Field names of a record, symbol names of an enum.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        match &self.variant {
            NodeVariant::Record(record) => record.fields.get(index).map(|f| f.name.as_str()),
            NodeVariant::Enum(enum_) => enum_.symbols.get(index).map(String::as_str),
            _ => None,
        }
    }

    /// The declared size of a fixed schema.
    pub fn size(&self) -> Option<usize> {
        match &self.variant {
            NodeVariant::Fixed(fixed) => Some(fixed.size),
            _ => None,
        }
    }

    /// Exchange the entire contents of two nodes.
    ///
    /// Record compilation registers an empty placeholder before its fields
    /// are compiled, so that self-referencing fields resolve; the finished
    /// record is then swapped into the placeholder's slot, where every
    /// reference captured earlier observes it.
    pub fn swap(&mut self, other: &mut Node) {
        std::mem::swap(self, other);
    }
}

impl RecordNode {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }
}

/// A logical type annotation on a schema node.
///
/// An absent annotation (`None` at the node level) is the common case;
/// malformed or unknown annotations silently degrade to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogicalType {
    Decimal { precision: usize, scale: usize },
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Duration,
    Uuid,
}

/// The arena holding every node of a compiled schema.
#[derive(Clone, Debug, Default)]
pub struct SchemaTree {
    nodes: Vec<Node>,
}

impl SchemaTree {
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Access a node. Ids are only handed out by this tree, so lookups
    /// cannot fail.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow symbolic references until a concrete node is reached.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let NodeVariant::Symbolic(SymbolicNode { target, .. }) = self.node(id).variant() {
            id = *target;
        }
        id
    }
}

/// A schema tree that has passed final structural validation.
#[derive(Clone, Debug)]
pub struct ValidSchema {
    tree: SchemaTree,
    root: NodeId,
}

impl ValidSchema {
    /// Validate the structural invariants of `tree` and wrap it: fullname
    /// uniqueness, record field-name uniqueness, enum symbol uniqueness,
    /// positive fixed sizes, union branch rules, resolved references.
    pub fn new(tree: SchemaTree, root: NodeId) -> AvroResult<Self> {
        validate(&tree, root)?;
        Ok(Self { tree, root })
    }

    /// Create a `ValidSchema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Self> {
        compile_json_schema_from_str(input)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.tree.node(id)
    }

    pub fn root_node(&self) -> &Node {
        self.tree.node(self.root)
    }
}

/// An empty schema: a lone `null` root. This mainly exists so the
/// non-panicking compile entry point has something to overwrite.
impl Default for ValidSchema {
    fn default() -> Self {
        let mut tree = SchemaTree::default();
        let root = tree.push(Node::new(NodeVariant::Null));
        Self { tree, root }
    }
}

fn validate(tree: &SchemaTree, root: NodeId) -> AvroResult<()> {
    let mut names: HashMap<String, NodeId> = HashMap::new();
    let mut visited = vec![false; tree.len()];
    let mut stack = vec![root];

    let mut register = |fullname: String, id: NodeId| match names.insert(fullname.clone(), id) {
        Some(previous) if previous != id => Err(Details::NameCollision(fullname)),
        _ => Ok(()),
    };

    while let Some(id) = stack.pop() {
        if visited[id.0] {
            continue;
        }
        visited[id.0] = true;

        let node = tree.node(id);
        match node.variant() {
            NodeVariant::Record(record) => {
                register(record.name.fullname(), id)?;
                let mut field_names = HashSet::with_capacity(record.fields.len());
                for field in &record.fields {
                    if !field_names.insert(field.name.as_str()) {
                        return Err(Details::FieldNameDuplicate(field.name.clone()).into());
                    }
                    stack.push(field.schema);
                }
            }
            NodeVariant::Enum(enum_) => {
                register(enum_.name.fullname(), id)?;
                if enum_.symbols.is_empty() {
                    return Err(Details::GetEnumSymbolsEmpty.into());
                }
                let mut symbols = HashSet::with_capacity(enum_.symbols.len());
                for symbol in &enum_.symbols {
                    if !symbols.insert(symbol.as_str()) {
                        return Err(Details::EnumSymbolDuplicate(symbol.clone()).into());
                    }
                }
            }
            NodeVariant::Fixed(fixed) => {
                register(fixed.name.fullname(), id)?;
                if fixed.size == 0 {
                    return Err(Details::GetFixedSizeFieldPositive(serde_json::Value::from(
                        fixed.size,
                    ))
                    .into());
                }
            }
            NodeVariant::Array(array) => stack.push(array.items),
            NodeVariant::Map(map) => stack.push(map.values),
            NodeVariant::Union(union) => {
                if union.branches.is_empty() {
                    return Err(Details::EmptyUnion.into());
                }
                let mut unnamed_kinds = HashSet::new();
                let mut branch_names = HashSet::new();
                for &branch in &union.branches {
                    let resolved = tree.node(tree.resolve(branch));
                    match resolved.variant() {
                        NodeVariant::Union(_) => return Err(Details::GetNestedUnion.into()),
                        // Multiple named branches are fine as long as their
                        // fullnames differ (the Avro rule).
                        NodeVariant::Record(RecordNode { name, .. })
                        | NodeVariant::Enum(EnumNode { name, .. })
                        | NodeVariant::Fixed(FixedNode { name, .. }) => {
                            if !branch_names.insert(name.fullname()) {
                                return Err(Details::GetUnionDuplicate.into());
                            }
                        }
                        variant => {
                            if !unnamed_kinds.insert(NodeType::from(variant)) {
                                return Err(Details::GetUnionDuplicate.into());
                            }
                        }
                    }
                    stack.push(branch);
                }
            }
            NodeVariant::Symbolic(symbolic) => {
                let target = tree.node(symbolic.target);
                match target.name() {
                    Some(name) if *name == symbolic.name => stack.push(symbolic.target),
                    _ => {
                        return Err(Details::SchemaResolution(symbolic.name.fullname()).into());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn named(name: &str) -> Name {
        Name::new(name).unwrap()
    }

    #[test]
    fn test_swap_preserves_slot_identity() -> TestResult {
        let mut tree = SchemaTree::default();
        let placeholder = tree.push(Node::new(NodeVariant::Record(RecordNode {
            name: named("Outer"),
            fields: vec![],
            lookup: BTreeMap::new(),
        })));
        let long = tree.push(Node::new(NodeVariant::Long));

        let mut finished = Node::new(NodeVariant::Record(RecordNode {
            name: named("Outer"),
            fields: vec![RecordField {
                name: "x".to_string(),
                doc: None,
                schema: long,
                default: None,
            }],
            lookup: BTreeMap::from([("x".to_string(), 0)]),
        }));
        tree.node_mut(placeholder).swap(&mut finished);

        // The placeholder id now observes the finished record.
        assert_eq!(tree.node(placeholder).leaves(), 1);
        assert_eq!(tree.node(placeholder).name_at(0), Some("x"));
        Ok(())
    }

    #[test]
    fn test_resolve_follows_symbolic() {
        let mut tree = SchemaTree::default();
        let fixed = tree.push(Node::new(NodeVariant::Fixed(FixedNode {
            name: named("md5"),
            size: 16,
        })));
        let symbolic = tree.push(Node::new(NodeVariant::Symbolic(SymbolicNode {
            name: named("md5"),
            target: fixed,
        })));
        assert_eq!(tree.resolve(symbolic), fixed);
        assert_eq!(tree.resolve(fixed), fixed);
    }

    #[test]
    fn test_validate_rejects_duplicate_union_kinds() {
        let mut tree = SchemaTree::default();
        let a = tree.push(Node::new(NodeVariant::Long));
        let b = tree.push(Node::new(NodeVariant::Long));
        let union = tree.push(Node::new(NodeVariant::Union(UnionNode {
            branches: vec![a, b],
        })));
        assert!(ValidSchema::new(tree, union).is_err());
    }

    #[test]
    fn test_validate_accepts_distinct_named_union_branches() -> TestResult {
        let mut tree = SchemaTree::default();
        let a = tree.push(Node::new(NodeVariant::Fixed(FixedNode {
            name: named("a"),
            size: 4,
        })));
        let b = tree.push(Node::new(NodeVariant::Fixed(FixedNode {
            name: named("b"),
            size: 4,
        })));
        let union = tree.push(Node::new(NodeVariant::Union(UnionNode {
            branches: vec![a, b],
        })));
        ValidSchema::new(tree, union)?;
        Ok(())
    }

    #[test]
    fn test_validate_rejects_empty_union() {
        let mut tree = SchemaTree::default();
        let union = tree.push(Node::new(NodeVariant::Union(UnionNode { branches: vec![] })));
        assert!(ValidSchema::new(tree, union).is_err());
    }

    #[test]
    fn test_default_schema_is_null() {
        let schema = ValidSchema::default();
        assert_eq!(schema.root_node().node_type(), NodeType::Null);
    }
}
