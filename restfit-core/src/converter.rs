//! Body conversion.
//!
//! A [`Converter`] turns request bodies into wire text and response text back
//! into values. It works on [`serde_json::Value`] as the intermediate data
//! model so it can be stored as a trait object and swapped at runtime; the
//! typed helpers live on [`ConverterExt`].
//!
//! # Example
//!
//! ```ignore
//! use restfit_core::{Converter, ConverterExt, JsonConverter};
//!
//! let converter = JsonConverter::default();
//! let text = converter.encode(&vec![1, 2, 3])?;
//! let back: Vec<u32> = converter.decode(&text)?;
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConvertError;

/// Converter contract for request and response bodies.
pub trait Converter: Send + Sync + 'static {
    /// Serialize a body value to wire text.
    fn to_body(&self, value: &Value) -> Result<String, ConvertError>;

    /// Parse wire text into a body value.
    fn from_body(&self, body: &str) -> Result<Value, ConvertError>;

    /// Content type sent with bodies produced by [`to_body`](Self::to_body).
    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// Typed helpers over any [`Converter`].
pub trait ConverterExt: Converter {
    /// Serialize a typed value through this converter.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, ConvertError> {
        let value = serde_json::to_value(value)?;
        self.to_body(&value)
    }

    /// Deserialize wire text into a typed value through this converter.
    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T, ConvertError> {
        let value = self.from_body(body)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl<C: Converter + ?Sized> ConverterExt for C {}

/// The default converter: compact JSON via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonConverter {
    pretty: bool,
}

impl JsonConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON bodies.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Converter for JsonConverter {
    fn to_body(&self, value: &Value) -> Result<String, ConvertError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn from_body(&self, body: &str) -> Result<Value, ConvertError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PostBody {
        name: String,
        score: f64,
        tags: Vec<String>,
        extra: BTreeMap<String, Option<i64>>,
    }

    #[test]
    fn test_json_round_trip() {
        let converter = JsonConverter::new();
        let body = PostBody {
            name: "restfit".into(),
            score: 12.5,
            tags: vec!["a".into(), "b c".into()],
            extra: [("x".to_string(), Some(1)), ("y".to_string(), None)]
                .into_iter()
                .collect(),
        };

        let text = converter.encode(&body).unwrap();
        let back: PostBody = converter.decode(&text).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn test_pretty_output_is_same_value() {
        let compact = JsonConverter::new().encode(&vec![1, 2]).unwrap();
        let pretty = JsonConverter::new().pretty().encode(&vec![1, 2]).unwrap();
        assert_eq!(compact, "[1,2]");
        assert!(pretty.contains('\n'));
        let back: Vec<i32> = JsonConverter::new().decode(&pretty).unwrap();
        assert_eq!(back, vec![1, 2]);
    }

    #[test]
    fn test_decode_errors() {
        let converter = JsonConverter::new();
        assert!(converter.decode::<PostBody>("[asd..s]").is_err());
        // Valid JSON of the wrong shape also fails.
        assert!(converter.decode::<PostBody>("[]").is_err());
    }

    #[test]
    fn test_dyn_converter() {
        let converter: Box<dyn Converter> = Box::new(JsonConverter::new());
        let n: u8 = converter.decode("7").unwrap();
        assert_eq!(n, 7);
        assert_eq!(converter.content_type(), "application/json");
    }
}
