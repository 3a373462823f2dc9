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

use crate::schema::NodeType;
use std::{error::Error as _, fmt};

/// Errors encountered while decoding Avro data or compiling schemas.
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`] which contains
/// more precise error information.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

#[derive(thiserror::Error)]
pub enum Details {
    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Decoded long does not fit an Avro int: {1}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Invalid Avro varint: overflows a 64-bit integer")]
    IntegerOverflow,

    #[error("Cannot have a negative length: {0}")]
    NegativeLength(i64),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Failed to read a varint byte: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Failed to read boolean bytes: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read fixed number of bytes '{1}': {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Failed to skip {1} bytes: {0}")]
    SkipBytes(#[source] std::io::Error, usize),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Failed to write buffer bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Failed to open schema file")]
    ReadSchemaFromFile(#[source] std::io::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown type: {0}")]
    ParsePrimitive(String),

    #[error("Unknown type definition: {0}")]
    GetComplexType(serde_json::Value),

    #[error("No `type` in complex type")]
    GetComplexTypeField,

    #[error("`type` in complex type must be a string: {0}")]
    GetComplexTypeStringField(serde_json::Value),

    #[error("No `name` field")]
    GetNameField,

    #[error("No `name` in record field")]
    GetNameFieldFromRecord,

    #[error("No `type` in record field")]
    GetRecordFieldTypeField,

    #[error("Record field must be a JSON object: {0}")]
    GetRecordFieldJson(serde_json::Value),

    #[error("No `fields` in record")]
    GetRecordFieldsJson,

    #[error("No `symbols` field in enum")]
    GetEnumSymbolsField,

    #[error("Enum symbol is not a string: {0}")]
    GetEnumSymbols(serde_json::Value),

    #[error("Duplicate enum symbol {0}")]
    EnumSymbolDuplicate(String),

    #[error("Enum has no symbols")]
    GetEnumSymbolsEmpty,

    #[error("Enum symbol not found: {0}")]
    GetEnumSymbol(String),

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("Fixed schema has no `size`")]
    GetFixedSizeField,

    #[error("Fixed schema `size` value must be a positive integer: {0}")]
    GetFixedSizeFieldPositive(serde_json::Value),

    #[error("Json field \"{key}\" is not a {expected}: {value}")]
    GetJsonFieldType {
        key: &'static str,
        expected: &'static str,
        value: serde_json::Value,
    },

    #[error("Two schemas with the same fullname were given: {0}")]
    NameCollision(String),

    #[error("Duplicate field name {0}")]
    FieldNameDuplicate(String),

    #[error("Invalid schema name {0}. It must match the regex '{1}'")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}. It must match the regex '{1}'")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Invalid field name {0}")]
    FieldName(String),

    #[error("Unions may not directly contain a union")]
    GetNestedUnion,

    #[error("Unions cannot contain duplicate types")]
    GetUnionDuplicate,

    #[error("Union type should not be empty")]
    EmptyUnion,

    #[error("Key {0} not found in decimal metadata JSON")]
    GetDecimalMetadataFromJson(&'static str),

    #[error("invalid JSON for {key:?}: {value:?}")]
    GetDecimalMetadataValueFromJson {
        key: &'static str,
        value: serde_json::Value,
    },

    #[error("The decimal precision ({precision}) must be a positive number")]
    DecimalPrecisionMustBePositive { precision: usize },

    #[error("The decimal precision ({precision}) must be bigger or equal to the scale ({scale})")]
    DecimalPrecisionLessThanScale { precision: usize, scale: usize },

    #[error("Unexpected type for default value: expected {expected}, but found {value}")]
    GetDefaultType {
        expected: NodeType,
        value: serde_json::Value,
    },

    #[error("No value found in default for {0}")]
    GetDefaultRecordField(String),

    #[error("Unresolved schema reference: {0}")]
    SchemaResolution(String),
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}
