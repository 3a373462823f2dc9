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

use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use crate::{
    AvroResult, Error,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// The name of a `record`, `enum` or `fixed` schema.
///
/// A `Name` is a local name plus an optional namespace; the pair forms the
/// `fullname` that identifies the schema globally. Two names are equal when
/// their fullnames are equal.
///
/// More information about schema names can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct Name {
    name: String,
    namespace: Namespace,
}

/// Represents the namespace of a named schema.
pub type Namespace = Option<String>;
/// A borrowed namespace.
pub type NamespaceRef<'a> = Option<&'a str>;

impl Name {
    /// Create a new `Name`, parsing the optional namespace out of a dotted
    /// fullname.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a new `Name` using the namespace from `enclosing_namespace`
    /// unless `name` is already a dotted fullname.
    pub fn new_with_enclosing_namespace(
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let index_of_name = validate_schema_name(name)?;

        if index_of_name == 0 {
            let namespace = match enclosing_namespace {
                Some(namespace) if !namespace.is_empty() => {
                    validate_namespace(namespace)?;
                    Some(namespace.to_string())
                }
                _ => None,
            };
            Ok(Self {
                name: name.to_string(),
                namespace,
            })
        } else if index_of_name == 1 && name.starts_with('.') {
            // A leading dot means the null namespace.
            Ok(Self {
                name: name[1..].to_string(),
                namespace: None,
            })
        } else {
            Ok(Self {
                name: name[index_of_name..].to_string(),
                namespace: Some(name[..index_of_name - 1].to_string()),
            })
        }
    }

    /// Parse a `Name` out of a complex type's JSON object: a dotted `name`
    /// wins over a `namespace` attribute, which wins over the enclosing
    /// namespace.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_field = complex.name().ok_or(Details::GetNameField)?;
        let namespace = match complex.get("namespace") {
            Some(Value::String(namespace)) => Some(namespace.as_str()),
            Some(value) => {
                return Err(Details::GetJsonFieldType {
                    key: "namespace",
                    expected: "string",
                    value: value.clone(),
                }
                .into());
            }
            None => enclosing_namespace,
        };
        Self::new_with_enclosing_namespace(&name_field, namespace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.namespace.as_deref()
    }

    /// Return the `fullname` of this `Name`.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Name");
        debug.field("name", &self.name);
        if let Some(namespace) = &self.namespace {
            debug.field("namespace", namespace);
            debug.finish()
        } else {
            debug.finish_non_exhaustive()
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fullname())
    }
}
