//! Declarative service and endpoint definitions.
//!
//! A [`ServiceDefinition`] plays the role of an annotated interface: it names
//! a service, carries type-level header declarations, and lists its
//! endpoints. Each [`EndpointDefinition`] records the annotations attached to
//! one method and its parameters, in declaration order. Nothing here is
//! validated; the client's parser turns definitions into
//! [`EndpointDescriptor`](crate::EndpointDescriptor)s and reports problems as
//! [`DefinitionError`](crate::DefinitionError)s.
//!
//! # Example
//!
//! ```ignore
//! use restfit_core::{EndpointDefinition, ParamType, ServiceDefinition};
//!
//! let service = ServiceDefinition::new("HttpBin")
//!     .header("Accept: application/json")
//!     .endpoint(
//!         EndpointDefinition::get("get", "/get")
//!             .query("query1", ParamType::Text)
//!             .query("query2", ParamType::Integer)
//!             .returns_stream(),
//!     );
//! ```

use crate::descriptor::Verb;

/// A service: a named group of endpoints sharing type-level headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: String,
    /// Type-level `"Name: Value"` header declarations.
    pub headers: Vec<String>,
    pub endpoints: Vec<EndpointDefinition>,
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    /// Add a type-level header declaration.
    pub fn header(mut self, declaration: impl Into<String>) -> Self {
        self.headers.push(declaration.into());
        self
    }

    /// Add an endpoint.
    pub fn endpoint(mut self, endpoint: EndpointDefinition) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

/// An annotation attached to an endpoint method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodAnnotation {
    /// HTTP verb and path template, e.g. `GET /users/{id}`.
    Http(Verb, String),
    /// Method-level `"Name: Value"` header declarations.
    Headers(Vec<String>),
    /// The request body is `multipart/form-data`.
    Multipart,
}

/// The declared type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Integer,
    Float,
    Bool,
    /// String-keyed map, used with `QueryMap`.
    Map,
    /// Any serializable object, used with `Body`.
    Object,
    /// A reference to a file on disk.
    File,
    /// A prepared [`MultipartBody`](crate::MultipartBody).
    Multipart,
    /// The success/error callback pair of a callback-mode endpoint.
    Callback,
}

/// An annotation attached to a parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamAnnotation {
    Path(String),
    Query(String),
    QueryMap,
    Field(String),
    Header(String),
    Body,
    Part,
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ParamType,
    pub annotation: Option<ParamAnnotation>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: ParamType, annotation: Option<ParamAnnotation>) -> Self {
        Self {
            name: name.into(),
            ty,
            annotation,
        }
    }
}

/// The declared return shape of an endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnShape {
    /// Returns nothing; results arrive through a callback parameter.
    #[default]
    Unit,
    /// Returns a cancellable stream of the result.
    Stream,
}

/// One declared endpoint method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointDefinition {
    pub name: String,
    pub annotations: Vec<MethodAnnotation>,
    pub params: Vec<ParamDecl>,
    pub returns: ReturnShape,
}

impl EndpointDefinition {
    /// An endpoint with no annotations yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An endpoint annotated with `verb` and `path`.
    pub fn http(name: impl Into<String>, verb: Verb, path: impl Into<String>) -> Self {
        Self::new(name).annotate(MethodAnnotation::Http(verb, path.into()))
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Get, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Post, path)
    }

    pub fn put(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Put, path)
    }

    pub fn patch(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Patch, path)
    }

    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Delete, path)
    }

    pub fn head(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::http(name, Verb::Head, path)
    }

    /// Attach a method annotation.
    pub fn annotate(mut self, annotation: MethodAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Attach method-level header declarations.
    pub fn headers<I, S>(self, declarations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers = declarations.into_iter().map(Into::into).collect();
        self.annotate(MethodAnnotation::Headers(headers))
    }

    /// Mark the endpoint as `multipart/form-data`.
    pub fn multipart(self) -> Self {
        self.annotate(MethodAnnotation::Multipart)
    }

    /// Declare a parameter.
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    pub fn path(self, name: impl Into<String>, ty: ParamType) -> Self {
        let name = name.into();
        self.param(ParamDecl::new(
            name.clone(),
            ty,
            Some(ParamAnnotation::Path(name)),
        ))
    }

    pub fn query(self, name: impl Into<String>, ty: ParamType) -> Self {
        let name = name.into();
        self.param(ParamDecl::new(
            name.clone(),
            ty,
            Some(ParamAnnotation::Query(name)),
        ))
    }

    pub fn query_map(self, name: impl Into<String>) -> Self {
        self.param(ParamDecl::new(
            name,
            ParamType::Map,
            Some(ParamAnnotation::QueryMap),
        ))
    }

    pub fn field(self, name: impl Into<String>, ty: ParamType) -> Self {
        let name = name.into();
        self.param(ParamDecl::new(
            name.clone(),
            ty,
            Some(ParamAnnotation::Field(name)),
        ))
    }

    pub fn header(self, name: impl Into<String>, ty: ParamType) -> Self {
        let name = name.into();
        self.param(ParamDecl::new(
            name.clone(),
            ty,
            Some(ParamAnnotation::Header(name)),
        ))
    }

    pub fn body(self, name: impl Into<String>) -> Self {
        self.param(ParamDecl::new(
            name,
            ParamType::Object,
            Some(ParamAnnotation::Body),
        ))
    }

    pub fn part(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.param(ParamDecl::new(name, ty, Some(ParamAnnotation::Part)))
    }

    /// Declare the trailing callback parameter of a callback-mode endpoint.
    pub fn callback(self) -> Self {
        self.param(ParamDecl::new("callback", ParamType::Callback, None))
    }

    /// Results are delivered through a cancellable stream.
    pub fn returns_stream(mut self) -> Self {
        self.returns = ReturnShape::Stream;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_records_declaration_order() {
        let endpoint = EndpointDefinition::post("post_body", "/post")
            .headers(["time:2018-3-21"])
            .body("body")
            .header("client", ParamType::Text)
            .returns_stream();

        assert_eq!(
            endpoint.annotations,
            vec![
                MethodAnnotation::Http(Verb::Post, "/post".into()),
                MethodAnnotation::Headers(vec!["time:2018-3-21".into()]),
            ]
        );
        let names: Vec<_> = endpoint.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["body", "client"]);
        assert_eq!(endpoint.params[1].annotation, Some(ParamAnnotation::Header("client".into())));
        assert_eq!(endpoint.returns, ReturnShape::Stream);
    }

    #[test]
    fn test_callback_is_unannotated() {
        let endpoint = EndpointDefinition::get("get", "/get").callback();
        assert_eq!(endpoint.returns, ReturnShape::Unit);
        assert_eq!(endpoint.params[0].ty, ParamType::Callback);
        assert!(endpoint.params[0].annotation.is_none());
    }

    #[test]
    fn test_service_builder() {
        let service = ServiceDefinition::new("HttpBin")
            .header("Accept: application/json")
            .endpoint(EndpointDefinition::delete("delete", "/delete").returns_stream());
        assert_eq!(service.headers.len(), 1);
        assert_eq!(service.endpoints[0].name, "delete");
    }
}
