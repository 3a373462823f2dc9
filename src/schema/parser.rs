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

use crate::AvroResult;
use crate::error::{Details, Error};
use crate::schema::{
    ArrayNode, EnumNode, FixedNode, LogicalType, MapNode, Name, NamespaceRef, Node, NodeId,
    NodeType, NodeVariant, RecordField, RecordNode, SchemaTree, SymbolicNode, UnionNode,
    ValidSchema,
};
use crate::types::Value;
use crate::util::MapHelper;
use crate::validator::{validate_enum_symbol_name, validate_record_field_name};
use log::{debug, error, warn};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compile a JSON Avro schema read from `reader`.
pub fn compile_json_schema_from_reader(
    reader: &mut (impl Read + ?Sized),
) -> AvroResult<ValidSchema> {
    let value = serde_json::from_reader(reader).map_err(Details::ParseSchemaJson)?;
    Compiler::compile(&value)
}

/// Compile a JSON Avro schema from a file.
pub fn compile_json_schema_from_file(path: impl AsRef<Path>) -> AvroResult<ValidSchema> {
    let mut file = File::open(path).map_err(Details::ReadSchemaFromFile)?;
    compile_json_schema_from_reader(&mut file)
}

/// Compile a JSON Avro schema from a byte buffer.
pub fn compile_json_schema_from_memory(input: &[u8]) -> AvroResult<ValidSchema> {
    let value = serde_json::from_slice(input).map_err(Details::ParseSchemaJson)?;
    Compiler::compile(&value)
}

/// Compile a JSON Avro schema from a string.
pub fn compile_json_schema_from_str(input: &str) -> AvroResult<ValidSchema> {
    let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
    Compiler::compile(&value)
}

/// Non-panicking, non-`Result` compile: on success `schema` is replaced
/// and `true` returned; on failure `error` receives the message and
/// `schema` is left untouched.
pub fn compile_json_schema(
    reader: &mut (impl Read + ?Sized),
    schema: &mut ValidSchema,
    error: &mut String,
) -> bool {
    match compile_json_schema_from_reader(reader) {
        Ok(compiled) => {
            *schema = compiled;
            error.clear();
            true
        }
        Err(e) => {
            *error = e.to_string();
            false
        }
    }
}

/// The schema compiler: owns the arena being built and the symbol table
/// that maps fullnames of already-registered named types to their slots.
///
/// The symbol table lives only as long as one compilation; afterwards the
/// references between nodes carry the tree.
pub(crate) struct Compiler {
    tree: SchemaTree,
    symtab: HashMap<Name, NodeId>,
}

impl Compiler {
    pub(crate) fn compile(value: &JsonValue) -> AvroResult<ValidSchema> {
        let mut compiler = Self {
            tree: SchemaTree::default(),
            symtab: HashMap::new(),
        };
        let root = compiler.make_node(value, None)?;
        ValidSchema::new(compiler.tree, root)
    }

    fn make_node(
        &mut self,
        value: &JsonValue,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        match value {
            JsonValue::String(t) => self.make_named(t, enclosing_namespace),
            JsonValue::Object(complex) => self.make_complex(complex, enclosing_namespace),
            JsonValue::Array(items) => self.make_union(items, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// A string is either a primitive token or a reference to a named type
    /// registered earlier.
    fn make_named(&mut self, name: &str, enclosing_namespace: NamespaceRef) -> AvroResult<NodeId> {
        if let Some(variant) = make_primitive(name) {
            return Ok(self.tree.push(Node::new(variant)));
        }
        let name = Name::new_with_enclosing_namespace(name, enclosing_namespace)?;
        match self.symtab.get(&name) {
            Some(&target) => Ok(self
                .tree
                .push(Node::new(NodeVariant::Symbolic(SymbolicNode {
                    name,
                    target,
                })))),
            None => Err(Details::ParsePrimitive(name.fullname()).into()),
        }
    }

    fn make_complex(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let type_field = match complex.get("type") {
            Some(JsonValue::String(t)) => t.as_str(),
            Some(value) => return Err(Details::GetComplexTypeStringField(value.clone()).into()),
            None => return Err(Details::GetComplexTypeField.into()),
        };

        let id = match type_field {
            // "error" is the record variant used by Avro protocols.
            "record" | "error" => self.make_record(complex, enclosing_namespace)?,
            "enum" => self.make_enum(complex, enclosing_namespace)?,
            "fixed" => self.make_fixed(complex, enclosing_namespace)?,
            "array" => self.make_array(complex, enclosing_namespace)?,
            "map" => self.make_map(complex, enclosing_namespace)?,
            other => match make_primitive(other) {
                Some(variant) => self.tree.push(Node::new(variant)),
                None => {
                    return Err(
                        Details::GetComplexType(JsonValue::Object(complex.clone())).into(),
                    );
                }
            },
        };

        if let Some(logical_type) = make_logical_type(complex) {
            self.tree.node_mut(id).set_logical_type(logical_type);
        }
        Ok(id)
    }

    fn make_record(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let name = Name::parse(complex, enclosing_namespace)?;
        debug!("Going to parse record schema: {name:?}");

        // The empty placeholder is registered before any field is
        // compiled, so fields referring to the record itself (or to each
        // other through it) resolve to this slot.
        let placeholder = self.tree.push(Node::new(NodeVariant::Record(RecordNode {
            name: name.clone(),
            fields: Vec::new(),
            lookup: BTreeMap::new(),
        })));
        self.register(name.clone(), placeholder)?;

        let fields_json = match complex.get("fields") {
            Some(JsonValue::Array(fields)) => fields,
            _ => return Err(Details::GetRecordFieldsJson.into()),
        };

        // Nested definitions and references resolve against the record's
        // own namespace.
        let mut fields = Vec::with_capacity(fields_json.len());
        let mut lookup = BTreeMap::new();
        for field in fields_json {
            let field = self.make_field(field, name.namespace())?;
            if lookup.insert(field.name.clone(), fields.len()).is_some() {
                return Err(Details::FieldNameDuplicate(field.name).into());
            }
            fields.push(field);
        }

        let mut node = Node::new(NodeVariant::Record(RecordNode {
            name,
            fields,
            lookup,
        }));
        if let Some(doc) = get_doc_field(complex) {
            node.set_doc(doc);
        }
        // Finish the record in the slot the placeholder reserved.
        self.tree.node_mut(placeholder).swap(&mut node);
        Ok(placeholder)
    }

    fn make_field(
        &mut self,
        value: &JsonValue,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<RecordField> {
        let JsonValue::Object(field) = value else {
            return Err(Details::GetRecordFieldJson(value.clone()).into());
        };
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;
        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or(Details::GetRecordFieldTypeField)?;
        let schema = self.make_node(ty, enclosing_namespace)?;

        let default = match field.get("default") {
            Some(default) => Some(self.default_datum(schema, default)?),
            None => None,
        };

        Ok(RecordField {
            name,
            doc: get_doc_field(field),
            schema,
            default,
        })
    }

    fn make_enum(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let name = Name::parse(complex, enclosing_namespace)?;

        let symbols_json = match complex.get("symbols") {
            Some(JsonValue::Array(symbols)) => symbols,
            _ => return Err(Details::GetEnumSymbolsField.into()),
        };
        let mut symbols: Vec<String> = Vec::with_capacity(symbols_json.len());
        let mut existing_symbols: HashSet<&str> = HashSet::with_capacity(symbols_json.len());
        for symbol in symbols_json {
            let Some(symbol) = symbol.as_str() else {
                return Err(Details::GetEnumSymbols(symbol.clone()).into());
            };
            validate_enum_symbol_name(symbol)?;
            if !existing_symbols.insert(symbol) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }
            symbols.push(symbol.to_string());
        }

        let mut node = Node::new(NodeVariant::Enum(EnumNode {
            name: name.clone(),
            symbols,
        }));
        if let Some(doc) = get_doc_field(complex) {
            node.set_doc(doc);
        }
        let id = self.tree.push(node);
        self.register(name, id)?;
        Ok(id)
    }

    fn make_fixed(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let name = Name::parse(complex, enclosing_namespace)?;

        let size = complex.get("size").ok_or(Details::GetFixedSizeField)?;
        let size = match size.as_i64() {
            Some(size) if size > 0 => size as usize,
            _ => return Err(Details::GetFixedSizeFieldPositive(size.clone()).into()),
        };

        let mut node = Node::new(NodeVariant::Fixed(FixedNode {
            name: name.clone(),
            size,
        }));
        if let Some(doc) = get_doc_field(complex) {
            node.set_doc(doc);
        }
        let id = self.tree.push(node);
        self.register(name, id)?;
        Ok(id)
    }

    fn make_array(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let items = complex.get("items").ok_or(Details::GetArrayItemsField)?;
        let items = self.make_node(items, enclosing_namespace)?;
        let mut node = Node::new(NodeVariant::Array(ArrayNode { items }));
        if let Some(doc) = get_doc_field(complex) {
            node.set_doc(doc);
        }
        Ok(self.tree.push(node))
    }

    fn make_map(
        &mut self,
        complex: &Map<String, JsonValue>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        let values = complex.get("values").ok_or(Details::GetMapValuesField)?;
        let values = self.make_node(values, enclosing_namespace)?;
        let mut node = Node::new(NodeVariant::Map(MapNode { values }));
        if let Some(doc) = get_doc_field(complex) {
            node.set_doc(doc);
        }
        Ok(self.tree.push(node))
    }

    fn make_union(
        &mut self,
        items: &[JsonValue],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<NodeId> {
        if items.is_empty() {
            error!("Union schemas should have at least two members!");
        } else if items.len() == 1 {
            warn!("Union schema with just one member! Consider dropping the union!");
        }
        let branches = items
            .iter()
            .map(|item| self.make_node(item, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .tree
            .push(Node::new(NodeVariant::Union(UnionNode { branches }))))
    }

    fn register(&mut self, name: Name, id: NodeId) -> AvroResult<()> {
        let fullname = name.fullname();
        if self.symtab.insert(name, id).is_some() {
            return Err(Details::NameCollision(fullname).into());
        }
        Ok(())
    }

    /// Coerce a JSON default value to the generic datum for `id`'s schema.
    ///
    /// Symbolic nodes are dereferenced first and the dispatch re-run on
    /// the target.
    fn default_datum(&self, id: NodeId, json: &JsonValue) -> AvroResult<Value> {
        let id = self.tree.resolve(id);
        let node = self.tree.node(id);
        match node.variant() {
            NodeVariant::Null => match json {
                JsonValue::Null => Ok(Value::Null),
                _ => Err(default_type_mismatch(NodeType::Null, json)),
            },
            NodeVariant::Boolean => json
                .as_bool()
                .map(Value::from)
                .ok_or_else(|| default_type_mismatch(NodeType::Boolean, json)),
            // The int range is not re-validated here; the long narrows.
            NodeVariant::Int => json
                .as_i64()
                .map(|i| Value::Int(i as i32))
                .ok_or_else(|| default_type_mismatch(NodeType::Int, json)),
            NodeVariant::Long => json
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| default_type_mismatch(NodeType::Long, json)),
            NodeVariant::Float => json
                .as_f64()
                .map(|f| Value::Float(f as f32))
                .ok_or_else(|| default_type_mismatch(NodeType::Float, json)),
            NodeVariant::Double => json
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| default_type_mismatch(NodeType::Double, json)),
            NodeVariant::String => json
                .as_str()
                .map(Value::from)
                .ok_or_else(|| default_type_mismatch(NodeType::String, json)),
            NodeVariant::Bytes => json
                .as_str()
                .map(|s| Value::Bytes(json_string_to_bytes(s)))
                .ok_or_else(|| default_type_mismatch(NodeType::Bytes, json)),
            // No length check against the declared size here.
            NodeVariant::Fixed(_) => json
                .as_str()
                .map(|s| {
                    let bytes = json_string_to_bytes(s);
                    Value::Fixed(bytes.len(), bytes)
                })
                .ok_or_else(|| default_type_mismatch(NodeType::Fixed, json)),
            NodeVariant::Enum(enum_) => {
                let symbol = json
                    .as_str()
                    .ok_or_else(|| default_type_mismatch(NodeType::Enum, json))?;
                match enum_.symbols.iter().position(|s| s == symbol) {
                    Some(index) => Ok(Value::Enum(index as u32, symbol.to_string())),
                    None => Err(Details::GetEnumSymbol(symbol.to_string()).into()),
                }
            }
            NodeVariant::Record(record) => {
                let JsonValue::Object(object) = json else {
                    return Err(default_type_mismatch(NodeType::Record, json));
                };
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let value = object
                        .get(&field.name)
                        .ok_or_else(|| Details::GetDefaultRecordField(field.name.clone()))?;
                    fields.push((field.name.clone(), self.default_datum(field.schema, value)?));
                }
                Ok(Value::Record(fields))
            }
            NodeVariant::Array(array) => {
                let JsonValue::Array(elements) = json else {
                    return Err(default_type_mismatch(NodeType::Array, json));
                };
                elements
                    .iter()
                    .map(|element| self.default_datum(array.items, element))
                    .collect::<Result<_, _>>()
                    .map(Value::Array)
            }
            NodeVariant::Map(map) => {
                let JsonValue::Object(object) = json else {
                    return Err(default_type_mismatch(NodeType::Map, json));
                };
                object
                    .iter()
                    .map(|(key, value)| {
                        Ok((key.clone(), self.default_datum(map.values, value)?))
                    })
                    .collect::<AvroResult<_>>()
                    .map(Value::Map)
            }
            NodeVariant::Union(union) => {
                // Per the Avro rule a union default is a plain value of the
                // first branch, not the tagged representation.
                let branch = union.branches.first().copied().ok_or(Details::EmptyUnion)?;
                Ok(Value::Union(0, Box::new(self.default_datum(branch, json)?)))
            }
            NodeVariant::Symbolic(_) => unreachable!("resolve() returned a symbolic node"),
        }
    }
}

fn make_primitive(name: &str) -> Option<NodeVariant> {
    match name {
        "null" => Some(NodeVariant::Null),
        "boolean" => Some(NodeVariant::Boolean),
        "int" => Some(NodeVariant::Int),
        "long" => Some(NodeVariant::Long),
        "float" => Some(NodeVariant::Float),
        "double" => Some(NodeVariant::Double),
        "string" => Some(NodeVariant::String),
        "bytes" => Some(NodeVariant::Bytes),
        _ => None,
    }
}

/// The inverse of the quote escaping the schema serializer applies to
/// `doc` attributes.
fn get_doc_field(complex: &Map<String, JsonValue>) -> Option<String> {
    complex.string("doc").map(|doc| doc.replace("\\\"", "\""))
}

fn default_type_mismatch(expected: NodeType, value: &JsonValue) -> Error {
    Details::GetDefaultType {
        expected,
        value: value.clone(),
    }
    .into()
}

/// JSON strings carrying `bytes`/`fixed` defaults map each code point to
/// one byte; higher code points are truncated.
fn json_string_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| c as u8).collect()
}

fn make_logical_type(complex: &Map<String, JsonValue>) -> Option<LogicalType> {
    let logical_type = complex.get("logicalType")?.as_str()?;
    match logical_type {
        "decimal" => match parse_decimal(complex) {
            Ok(logical_type) => Some(logical_type),
            Err(err) => {
                // A malformed logical type must be ignored as a whole per
                // the specification.
                warn!("Ignoring invalid decimal logical type: {err}");
                None
            }
        },
        "date" => Some(LogicalType::Date),
        "time-millis" => Some(LogicalType::TimeMillis),
        "time-micros" => Some(LogicalType::TimeMicros),
        "timestamp-millis" => Some(LogicalType::TimestampMillis),
        "timestamp-micros" => Some(LogicalType::TimestampMicros),
        "duration" => Some(LogicalType::Duration),
        "uuid" => Some(LogicalType::Uuid),
        _ => None,
    }
}

fn parse_decimal(complex: &Map<String, JsonValue>) -> AvroResult<LogicalType> {
    let precision = get_decimal_integer(complex, "precision")?;
    let scale = get_decimal_integer(complex, "scale")?;

    if precision < 1 {
        return Err(Details::DecimalPrecisionMustBePositive { precision }.into());
    }
    if precision < scale {
        return Err(Details::DecimalPrecisionLessThanScale { precision, scale }.into());
    }
    Ok(LogicalType::Decimal { precision, scale })
}

fn get_decimal_integer(
    complex: &Map<String, JsonValue>,
    key: &'static str,
) -> AvroResult<usize> {
    match complex.get(key) {
        Some(JsonValue::Number(value)) => value
            .as_u64()
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| {
                Details::GetDecimalMetadataValueFromJson {
                    key,
                    value: JsonValue::Number(value.clone()),
                }
                .into()
            }),
        None if key == "scale" => Ok(0),
        None => Err(Details::GetDecimalMetadataFromJson(key).into()),
        Some(value) => Err(Details::GetDecimalMetadataValueFromJson {
            key,
            value: value.clone(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_compile_primitive_tokens() -> TestResult {
        for (token, expected) in [
            ("null", NodeType::Null),
            ("boolean", NodeType::Boolean),
            ("int", NodeType::Int),
            ("long", NodeType::Long),
            ("float", NodeType::Float),
            ("double", NodeType::Double),
            ("string", NodeType::String),
            ("bytes", NodeType::Bytes),
        ] {
            let schema = compile_json_schema_from_str(&format!("\"{token}\""))?;
            assert_eq!(schema.root_node().node_type(), expected);
        }
        Ok(())
    }

    #[test]
    fn test_compile_record_with_default() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{"name":"x","type":"int","default":0}]}"#,
        )?;
        let root = schema.root_node();
        assert_eq!(root.node_type(), NodeType::Record);
        assert_eq!(root.name().map(Name::fullname), Some("N".to_string()));
        assert_eq!(root.leaves(), 1);
        assert_eq!(root.name_at(0), Some("x"));

        let NodeVariant::Record(record) = root.variant() else {
            panic!("Expected a record node");
        };
        assert_eq!(record.field_index("x"), Some(0));
        let field = &record.fields[0];
        assert_eq!(
            schema.node(field.schema).node_type(),
            NodeType::Int
        );
        assert_eq!(field.default, Some(Value::Int(0)));
        Ok(())
    }

    #[test]
    fn test_compile_recursive_record() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"List","fields":[{"name":"next","type":["null","List"]}]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        let NodeVariant::Union(union) = schema.node(record.fields[0].schema).variant() else {
            panic!("Expected a union node");
        };
        // The second branch resolves to the enclosing record itself.
        assert_eq!(schema.tree().resolve(union.branches[1]), schema.root());
        Ok(())
    }

    #[test]
    fn test_union_default_selects_first_branch() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{"name":"u","type":["long","string"],"default":42}]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        assert_eq!(
            record.fields[0].default,
            Some(Value::Union(0, Box::new(Value::Long(42))))
        );
        Ok(())
    }

    #[test]
    fn test_union_default_must_match_first_branch() {
        let result = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{"name":"u","type":["long","string"],"default":"foo"}]}"#,
        );
        match result.map_err(Error::into_details) {
            Err(Details::GetDefaultType { expected, .. }) => {
                assert_eq!(expected, NodeType::Long)
            }
            other => panic!("Expected Details::GetDefaultType, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_decimal_degrades_to_none() -> TestResult {
        // Missing precision: the whole logicalType attribute is dropped.
        let schema = compile_json_schema_from_str(
            r#"{"type":"bytes","logicalType":"decimal"}"#,
        )?;
        assert_eq!(schema.root_node().logical_type(), None);
        assert_eq!(schema.root_node().node_type(), NodeType::Bytes);

        // Scale exceeding precision is malformed too.
        let schema = compile_json_schema_from_str(
            r#"{"type":"bytes","logicalType":"decimal","precision":4,"scale":5}"#,
        )?;
        assert_eq!(schema.root_node().logical_type(), None);
        Ok(())
    }

    #[test]
    fn test_decimal_logical_type() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"bytes","logicalType":"decimal","precision":4,"scale":2}"#,
        )?;
        assert_eq!(
            schema.root_node().logical_type(),
            Some(&LogicalType::Decimal {
                precision: 4,
                scale: 2
            })
        );
        Ok(())
    }

    #[test]
    fn test_unknown_logical_type_degrades_to_none() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"string","logicalType":"something-else"}"#,
        )?;
        assert_eq!(schema.root_node().logical_type(), None);
        Ok(())
    }

    #[test]
    fn test_timestamp_logical_type() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"long","logicalType":"timestamp-micros"}"#,
        )?;
        assert_eq!(
            schema.root_node().logical_type(),
            Some(&LogicalType::TimestampMicros)
        );
        Ok(())
    }

    #[test]
    fn test_unknown_reference_fails() {
        let result = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{"name":"x","type":"Missing"}]}"#,
        );
        match result.map_err(Error::into_details) {
            Err(Details::ParsePrimitive(name)) => assert_eq!(name, "Missing"),
            other => panic!("Expected Details::ParsePrimitive, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_fullname_rejected() {
        let result = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[
                {"name":"a","type":{"type":"fixed","name":"F","size":4}},
                {"name":"b","type":{"type":"fixed","name":"F","size":8}}
            ]}"#,
        );
        match result.map_err(Error::into_details) {
            Err(Details::NameCollision(name)) => assert_eq!(name, "F"),
            other => panic!("Expected Details::NameCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_doc_is_unescaped() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","doc":"a \\\"quoted\\\" doc","fields":[]}"#,
        )?;
        assert_eq!(schema.root_node().doc(), Some(r#"a "quoted" doc"#));
        Ok(())
    }

    #[test]
    fn test_bytes_default() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{"name":"b","type":"bytes","default":"ÿ ab"}]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        assert_eq!(
            record.fields[0].default,
            Some(Value::Bytes(vec![0xff, b' ', b'a', b'b']))
        );
        Ok(())
    }

    #[test]
    fn test_enum_default_symbol() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{
                "name":"c",
                "type":{"type":"enum","name":"suit","symbols":["diamonds","spades","clubs"]},
                "default":"spades"
            }]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        assert_eq!(
            record.fields[0].default,
            Some(Value::Enum(1, "spades".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_enum_default_unknown_symbol_fails() {
        let result = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{
                "name":"c",
                "type":{"type":"enum","name":"suit","symbols":["diamonds"]},
                "default":"hearts"
            }]}"#,
        );
        match result.map_err(Error::into_details) {
            Err(Details::GetEnumSymbol(symbol)) => assert_eq!(symbol, "hearts"),
            other => panic!("Expected Details::GetEnumSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_record_default_missing_field_fails() {
        let result = compile_json_schema_from_str(
            r#"{"type":"record","name":"Outer","fields":[{
                "name":"inner",
                "type":{"type":"record","name":"Inner","fields":[
                    {"name":"a","type":"long"},
                    {"name":"b","type":"string"}
                ]},
                "default":{"a":1}
            }]}"#,
        );
        match result.map_err(Error::into_details) {
            Err(Details::GetDefaultRecordField(field)) => assert_eq!(field, "b"),
            other => panic!("Expected Details::GetDefaultRecordField, got {other:?}"),
        }
    }

    #[test]
    fn test_map_default_preserves_insertion_order() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"N","fields":[{
                "name":"m",
                "type":{"type":"map","values":"int"},
                "default":{"z":1,"a":2}
            }]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        assert_eq!(
            record.fields[0].default,
            Some(Value::Map(vec![
                ("z".to_string(), Value::Int(1)),
                ("a".to_string(), Value::Int(2)),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_fixed_size_must_be_positive() {
        let result =
            compile_json_schema_from_str(r#"{"type":"fixed","name":"F","size":0}"#);
        match result.map_err(Error::into_details) {
            Err(Details::GetFixedSizeFieldPositive(_)) => {}
            other => panic!("Expected Details::GetFixedSizeFieldPositive, got {other:?}"),
        }
    }

    #[test]
    fn test_error_type_is_a_record() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"error","name":"Oops","fields":[{"name":"detail","type":"string"}]}"#,
        )?;
        assert_eq!(schema.root_node().node_type(), NodeType::Record);
        Ok(())
    }

    #[test]
    fn test_namespace_resolution() -> TestResult {
        let schema = compile_json_schema_from_str(
            r#"{"type":"record","name":"org.example.N","fields":[
                {"name":"f","type":{"type":"fixed","name":"F","size":2}},
                {"name":"g","type":"F"},
                {"name":"h","type":"org.example.F"}
            ]}"#,
        )?;
        let NodeVariant::Record(record) = schema.root_node().variant() else {
            panic!("Expected a record node");
        };
        // The nested fixed inherits the record's namespace; both the bare
        // and the qualified reference resolve to it.
        let declared = record.fields[0].schema;
        assert_eq!(
            schema.tree().resolve(record.fields[1].schema),
            declared
        );
        assert_eq!(
            schema.tree().resolve(record.fields[2].schema),
            declared
        );
        assert_eq!(
            schema.node(declared).name().map(Name::fullname),
            Some("org.example.F".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_non_throwing_compile() {
        let mut schema = ValidSchema::default();
        let mut error = String::new();

        let good = r#"{"type":"record","name":"N","fields":[{"name":"x","type":"int"}]}"#;
        assert!(compile_json_schema(&mut good.as_bytes(), &mut schema, &mut error));
        assert!(error.is_empty());
        assert_eq!(schema.root_node().node_type(), NodeType::Record);

        let bad = r#"{"type":"record","name":"N"}"#;
        assert!(!compile_json_schema(&mut bad.as_bytes(), &mut schema, &mut error));
        assert!(!error.is_empty());
        // The previously compiled schema is left in place.
        assert_eq!(schema.root_node().node_type(), NodeType::Record);
    }
}
