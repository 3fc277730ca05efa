//! Call arguments.
//!
//! [`CallArgs`] holds one [`Arg`] per role-bearing parameter of an endpoint,
//! in declaration order. Callback parameters are not part of the list; the
//! callback is passed to [`Service::enqueue`](crate::Service::enqueue)
//! separately.
//!
//! # Example
//!
//! ```ignore
//! use restfit_client::{Arg, CallArgs};
//!
//! let args = CallArgs::new().arg("abc").arg(123);
//! let args = CallArgs::new().body(&payload).arg("unity");
//! let args: CallArgs = vec![Arg::from(123.456f32), Arg::from("abc")].into();
//! ```

use std::fmt;
use std::path::PathBuf;

use restfit_core::MultipartBody;
use serde::Serialize;
use serde_json::Value;

/// A serializable body captured for the converter.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyArg {
    value: Result<Value, String>,
    type_name: &'static str,
}

impl BodyArg {
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Self {
        Self {
            value: serde_json::to_value(value).map_err(|e| e.to_string()),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The captured value, or the reason it could not be captured.
    pub fn value(&self) -> Result<&Value, &str> {
        self.value.as_ref().map_err(String::as_str)
    }

    /// Rust type name of the original value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// One call argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A scalar, already formatted with `Display`.
    Value(String),
    /// An absent optional value; skipped for Query, Field and Header roles.
    Null,
    /// Extra query pairs for a QueryMap parameter.
    Map(Vec<(String, String)>),
    /// A body for the converter.
    Body(BodyArg),
    /// A prepared multipart part.
    Part(MultipartBody),
    /// A file to upload as the multipart part.
    File(PathBuf),
}

impl Arg {
    /// A scalar argument formatted with `Display`.
    pub fn value(value: impl fmt::Display) -> Self {
        Arg::Value(value.to_string())
    }

    pub fn body<T: Serialize + ?Sized>(value: &T) -> Self {
        Arg::Body(BodyArg::new(value))
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Arg::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Arg::File(path.into())
    }

    /// Variant name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Value(_) => "value",
            Arg::Null => "null",
            Arg::Map(_) => "map",
            Arg::Body(_) => "body",
            Arg::Part(_) => "part",
            Arg::File(_) => "file",
        }
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(
    &str, String, &String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

impl From<MultipartBody> for Arg {
    fn from(part: MultipartBody) -> Self {
        Arg::Part(part)
    }
}

impl From<PathBuf> for Arg {
    fn from(path: PathBuf) -> Self {
        Arg::File(path)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

/// Ordered arguments for one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    args: Vec<Arg>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a body argument.
    pub fn body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.arg(Arg::body(value))
    }

    /// Append a query map argument.
    pub fn map<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.arg(Arg::map(entries))
    }

    /// Append an absent optional argument.
    pub fn null(self) -> Self {
        self.arg(Arg::Null)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn as_slice(&self) -> &[Arg] {
        &self.args
    }
}

impl From<Vec<Arg>> for CallArgs {
    fn from(args: Vec<Arg>) -> Self {
        Self { args }
    }
}

impl From<()> for CallArgs {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl FromIterator<Arg> for CallArgs {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_use_display() {
        assert_eq!(Arg::from(123.456f32), Arg::Value("123.456".into()));
        assert_eq!(Arg::from(123), Arg::Value("123".into()));
        assert_eq!(Arg::from(true), Arg::Value("true".into()));
        assert_eq!(Arg::from("abc"), Arg::Value("abc".into()));
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Arg::from(None::<u32>), Arg::Null);
        assert_eq!(Arg::from(Some(7u32)), Arg::Value("7".into()));
    }

    #[test]
    fn test_body_capture() {
        #[derive(Serialize)]
        struct Payload {
            id: u32,
        }
        let Arg::Body(body) = Arg::body(&Payload { id: 3 }) else {
            panic!("expected body");
        };
        assert_eq!(body.value().unwrap(), &serde_json::json!({"id": 3}));
        assert!(body.type_name().ends_with("Payload"));
    }

    #[test]
    fn test_builder_order() {
        let args = CallArgs::new()
            .arg("abc")
            .null()
            .map([("k", "v")])
            .arg(PathBuf::from("/tmp/x"));
        let kinds: Vec<_> = args.as_slice().iter().map(Arg::kind).collect();
        assert_eq!(kinds, vec!["value", "null", "map", "file"]);
        assert_eq!(CallArgs::from(()).len(), 0);
    }
}
