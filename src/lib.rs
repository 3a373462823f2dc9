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

//! The core of **[Apache Avro](https://avro.apache.org/)** data handling:
//! a binary decoder for Avro's compact wire format and a compiler that
//! turns JSON schema declarations into a validated in-memory schema tree.
//!
//! # Decoding
//!
//! [`BinaryDecoder`] is a pull decoder. It knows nothing about schemas;
//! the caller drives it in schema order:
//!
//! ```
//! use avro_lite::binary_decoder;
//!
//! let data: &[u8] = &[0x06, 0x66, 0x6f, 0x6f, 0x96, 0x01];
//! let mut decoder = binary_decoder(data);
//! assert_eq!(decoder.decode_string()?, "foo");
//! assert_eq!(decoder.decode_int()?, 75);
//! # Ok::<(), avro_lite::Error>(())
//! ```
//!
//! # Schema compilation
//!
//! [`compile_json_schema_from_str`] (and its file/memory/reader siblings)
//! produce a [`ValidSchema`]: an arena of schema nodes that has passed
//! structural validation. Named types may reference themselves and each
//! other; references resolve to node ids within the arena.
//!
//! ```
//! use avro_lite::{compile_json_schema_from_str, schema::NodeType};
//!
//! let schema = compile_json_schema_from_str(
//!     r#"{"type":"record","name":"List","fields":[
//!         {"name":"value","type":"long","default":0},
//!         {"name":"next","type":["null","List"]}
//!     ]}"#,
//! )?;
//! assert_eq!(schema.root_node().node_type(), NodeType::Record);
//! # Ok::<(), avro_lite::Error>(())
//! ```

mod decode;
mod stream;
mod validator;

pub mod error;
pub mod schema;
pub mod types;
pub mod util;

pub use decode::{BinaryDecoder, binary_decoder};
pub use error::Error;
pub use schema::{
    ValidSchema, compile_json_schema, compile_json_schema_from_file,
    compile_json_schema_from_memory, compile_json_schema_from_reader,
    compile_json_schema_from_str,
};
pub use stream::StreamReader;
pub use types::Value;

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
