//! Output formats.
//!
//! TOML documents must have a table at the root, so any other value is
//! wrapped under the key `value`. JSON can represent every value directly.

use std::fmt::Display;

use json::JsonValue;

use crate::error::{Error, Reason};
use crate::object::Object;
use crate::types::{Key, Map};


/// Key under which non-map values are placed in TOML output.
pub const WRAPPER_KEY: &str = "value";


#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Serialize an object in this format.
    pub fn serialize(self, value: &Object) -> Result<String, Error> {
        match self {
            Self::Toml => to_toml(value),
            Self::Json => to_json(value),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toml => f.write_str("toml"),
            Self::Json => f.write_str("json"),
        }
    }
}


/// Serialize an object to a TOML document.
///
/// Fails with a type error if the object is or contains null.
pub fn to_toml(value: &Object) -> Result<String, Error> {
    value.check_serializable(Format::Toml, false)?;

    let result = match value {
        Object::Map(_) => toml::to_string(value),
        _ => {
            let mut root = Map::new();
            root.insert(Key::new(WRAPPER_KEY), value.clone());
            toml::to_string(&Object::Map(root))
        }
    };

    result.map_err(|err| Error::new(Reason::External(err.to_string())))
}


/// Serialize an object to pretty-printed JSON with an indent of four spaces.
pub fn to_json(value: &Object) -> Result<String, Error> {
    value.check_serializable(Format::Json, true)?;
    let json = JsonValue::try_from(value)?;
    Ok(json::stringify_pretty(json, 4))
}


/// Read a TOML document back into an object.
pub fn from_toml(text: &str) -> Result<Object, Error> {
    toml::from_str::<Object>(text).map_err(|err| Error::new(Reason::External(err.to_string())))
}
