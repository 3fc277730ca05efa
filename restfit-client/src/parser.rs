//! Endpoint declaration parser.
//!
//! Turns an [`EndpointDefinition`] into an [`EndpointDescriptor`], checking
//! every structural rule up front so that a malformed declaration fails when
//! the service is created rather than when it is first called.

use std::collections::HashSet;

use restfit_core::{
    DefinitionError, EndpointDefinition, EndpointDescriptor, Headers, MethodAnnotation,
    ParamAnnotation, ParamRole, ParamType, ResponseMode, ReturnShape, ServiceDefinition, Verb,
    placeholders, split_header,
};

use crate::config::PlaceholderPolicy;

/// Parse every endpoint of a service.
///
/// Endpoint names must be non-blank and unique within the service.
pub fn parse_service(
    service: &ServiceDefinition,
    policy: PlaceholderPolicy,
) -> Result<Vec<EndpointDescriptor>, DefinitionError> {
    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(service.endpoints.len());
    for endpoint in &service.endpoints {
        if endpoint.name.trim().is_empty() || !seen.insert(endpoint.name.as_str()) {
            return Err(DefinitionError::InvalidEndpointName {
                service: service.name.clone(),
                endpoint: endpoint.name.clone(),
            });
        }
        descriptors.push(parse(&service.headers, endpoint, policy)?);
    }
    Ok(descriptors)
}

/// Parse one endpoint.
///
/// `service_headers` are the type-level header declarations; method-level
/// declarations are applied after them and win on collision.
pub fn parse(
    service_headers: &[String],
    endpoint: &EndpointDefinition,
    policy: PlaceholderPolicy,
) -> Result<EndpointDescriptor, DefinitionError> {
    let name = endpoint.name.as_str();
    let (verb, path) = parse_verb(endpoint)?;
    let is_multipart = endpoint
        .annotations
        .iter()
        .any(|a| matches!(a, MethodAnnotation::Multipart));
    let static_headers = merge_headers(name, service_headers, endpoint)?;

    let mut params = Vec::with_capacity(endpoint.params.len());
    let mut callbacks = 0;
    for decl in &endpoint.params {
        if decl.ty == ParamType::Callback {
            callbacks += 1;
            continue;
        }
        let Some(annotation) = &decl.annotation else {
            return Err(DefinitionError::UnannotatedParameter {
                endpoint: name.to_string(),
                parameter: decl.name.clone(),
            });
        };
        let role = match annotation {
            ParamAnnotation::Path(n) => ParamRole::Path(n.clone()),
            ParamAnnotation::Query(n) => ParamRole::Query(n.clone()),
            ParamAnnotation::QueryMap => ParamRole::QueryMap,
            ParamAnnotation::Field(n) => ParamRole::Field(n.clone()),
            ParamAnnotation::Header(n) => ParamRole::Header(n.clone()),
            ParamAnnotation::Body => ParamRole::Body,
            ParamAnnotation::Part => {
                if !is_multipart {
                    return Err(DefinitionError::PartWithoutMultipart {
                        endpoint: name.to_string(),
                    });
                }
                if !matches!(decl.ty, ParamType::File | ParamType::Multipart) {
                    return Err(DefinitionError::InvalidPartType {
                        endpoint: name.to_string(),
                        parameter: decl.name.clone(),
                    });
                }
                ParamRole::Part
            }
        };
        params.push(role);
    }

    let count = |pred: fn(&ParamRole) -> bool| params.iter().filter(|r| pred(r)).count();
    let bodies = count(|r| matches!(r, ParamRole::Body));
    let parts = count(|r| matches!(r, ParamRole::Part));
    let fields = count(|r| matches!(r, ParamRole::Field(_)));
    let query_maps = count(|r| matches!(r, ParamRole::QueryMap));

    if bodies > 1 {
        return Err(DefinitionError::MultipleBodies {
            endpoint: name.to_string(),
        });
    }
    if is_multipart {
        if parts != 1 {
            return Err(DefinitionError::PartCount {
                endpoint: name.to_string(),
                count: parts,
            });
        }
        if bodies > 0 {
            return Err(DefinitionError::MultipartWithBody {
                endpoint: name.to_string(),
            });
        }
    }
    if !verb.allows_body() {
        let role = if bodies > 0 {
            Some("Body")
        } else if parts > 0 {
            Some("Part")
        } else if fields > 0 {
            Some("Field")
        } else {
            None
        };
        if let Some(role) = role {
            return Err(DefinitionError::BodyNotAllowed {
                endpoint: name.to_string(),
                verb,
                role,
            });
        }
    }
    if query_maps > 1 {
        return Err(DefinitionError::MultipleQueryMaps {
            endpoint: name.to_string(),
        });
    }
    if query_maps == 1 && verb != Verb::Get {
        return Err(DefinitionError::QueryMapRequiresGet {
            endpoint: name.to_string(),
            verb,
        });
    }

    check_path(name, &path, &params, policy)?;

    let mode = match endpoint.returns {
        ReturnShape::Stream => {
            if callbacks > 0 {
                return Err(DefinitionError::CallbackOnStream {
                    endpoint: name.to_string(),
                });
            }
            ResponseMode::Stream
        }
        ReturnShape::Unit => {
            if callbacks != 1 {
                return Err(DefinitionError::CallbackCount {
                    endpoint: name.to_string(),
                    count: callbacks,
                });
            }
            if !endpoint
                .params
                .last()
                .is_some_and(|decl| decl.ty == ParamType::Callback)
            {
                return Err(DefinitionError::CallbackNotLast {
                    endpoint: name.to_string(),
                });
            }
            ResponseMode::Callback
        }
    };

    tracing::trace!(endpoint = name, %verb, path = %path, "parsed endpoint");

    Ok(EndpointDescriptor::new(
        name,
        verb,
        path,
        is_multipart,
        params,
        static_headers,
        mode,
    ))
}

fn parse_verb(endpoint: &EndpointDefinition) -> Result<(Verb, String), DefinitionError> {
    let mut found: Option<(Verb, &str)> = None;
    for annotation in &endpoint.annotations {
        if let MethodAnnotation::Http(verb, path) = annotation {
            if let Some((first, _)) = found {
                return Err(DefinitionError::ConflictingVerbs {
                    endpoint: endpoint.name.clone(),
                    first,
                    second: *verb,
                });
            }
            found = Some((*verb, path.as_str()));
        }
    }
    found
        .map(|(verb, path)| (verb, path.to_string()))
        .ok_or_else(|| DefinitionError::MissingVerb {
            endpoint: endpoint.name.clone(),
        })
}

fn merge_headers(
    name: &str,
    service_headers: &[String],
    endpoint: &EndpointDefinition,
) -> Result<Headers, DefinitionError> {
    let method_headers = endpoint
        .annotations
        .iter()
        .filter_map(|a| match a {
            MethodAnnotation::Headers(list) => Some(list),
            _ => None,
        })
        .flatten();

    let mut headers = Headers::new();
    for declaration in service_headers.iter().chain(method_headers) {
        let (key, value) =
            split_header(declaration).ok_or_else(|| DefinitionError::MalformedHeader {
                endpoint: name.to_string(),
                header: declaration.clone(),
            })?;
        headers.insert(key, value);
    }
    Ok(headers)
}

fn check_path(
    name: &str,
    path: &str,
    params: &[ParamRole],
    policy: PlaceholderPolicy,
) -> Result<(), DefinitionError> {
    let declared: HashSet<&str> = placeholders(path).collect();
    let bound: HashSet<&str> = params
        .iter()
        .filter_map(|r| match r {
            ParamRole::Path(n) => Some(n.as_str()),
            _ => None,
        })
        .collect();

    for param in &bound {
        if !declared.contains(param) {
            return Err(DefinitionError::UnknownPathParameter {
                endpoint: name.to_string(),
                name: param.to_string(),
                path: path.to_string(),
            });
        }
    }
    if policy == PlaceholderPolicy::Reject {
        if let Some(missing) = placeholders(path).find(|p| !bound.contains(p)) {
            return Err(DefinitionError::UnboundPlaceholder {
                endpoint: name.to_string(),
                name: missing.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(endpoint: &EndpointDefinition) -> Result<EndpointDescriptor, DefinitionError> {
        parse(&[], endpoint, PlaceholderPolicy::Reject)
    }

    #[test]
    fn test_parse_get_with_queries() {
        let endpoint = EndpointDefinition::get("get", "/get")
            .query("query1", ParamType::Text)
            .query("query2", ParamType::Integer)
            .returns_stream();
        let desc = strict(&endpoint).unwrap();

        assert_eq!(desc.verb(), Verb::Get);
        assert_eq!(desc.path_template(), "/get");
        assert_eq!(
            desc.params(),
            &[
                ParamRole::Query("query1".into()),
                ParamRole::Query("query2".into())
            ]
        );
        assert_eq!(desc.mode(), ResponseMode::Stream);
        assert!(!desc.is_multipart());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let endpoint = EndpointDefinition::post("post_body", "/post")
            .headers(["time:2018-3-21"])
            .body("body")
            .header("client", ParamType::Text)
            .returns_stream();
        let service_headers = vec!["Accept: application/json".to_string()];

        let a = parse(&service_headers, &endpoint, PlaceholderPolicy::Reject).unwrap();
        let b = parse(&service_headers, &endpoint, PlaceholderPolicy::Reject).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_and_conflicting_verbs() {
        let endpoint = EndpointDefinition::new("nothing").returns_stream();
        assert!(matches!(
            strict(&endpoint),
            Err(DefinitionError::MissingVerb { .. })
        ));

        let endpoint = EndpointDefinition::get("both", "/a")
            .annotate(MethodAnnotation::Http(Verb::Post, "/b".into()))
            .returns_stream();
        assert_eq!(
            strict(&endpoint),
            Err(DefinitionError::ConflictingVerbs {
                endpoint: "both".into(),
                first: Verb::Get,
                second: Verb::Post,
            })
        );
    }

    #[test]
    fn test_header_merge_method_wins() {
        let service_headers = vec![
            "Accept: text/plain".to_string(),
            "X-Client: restfit".to_string(),
        ];
        let endpoint = EndpointDefinition::get("get", "/get")
            .headers(["accept: application/json", "Location: http://a.test:8080/x"])
            .returns_stream();
        let desc = parse(&service_headers, &endpoint, PlaceholderPolicy::Reject).unwrap();

        let headers: Vec<_> = desc.static_headers().iter().collect();
        assert_eq!(
            headers,
            vec![
                ("Accept", "application/json"),
                ("X-Client", "restfit"),
                ("Location", "http://a.test:8080/x"),
            ]
        );
    }

    #[test]
    fn test_malformed_header() {
        let endpoint = EndpointDefinition::get("get", "/get")
            .headers(["no colon here"])
            .returns_stream();
        assert!(matches!(
            strict(&endpoint),
            Err(DefinitionError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_unannotated_parameter_is_rejected() {
        let endpoint = EndpointDefinition::get("get", "/get")
            .param(restfit_core::ParamDecl::new("loose", ParamType::Text, None))
            .returns_stream();
        assert_eq!(
            strict(&endpoint),
            Err(DefinitionError::UnannotatedParameter {
                endpoint: "get".into(),
                parameter: "loose".into(),
            })
        );
    }

    #[test]
    fn test_multipart_part_count() {
        let none = EndpointDefinition::post("upload", "/post")
            .multipart()
            .field("name", ParamType::Text)
            .returns_stream();
        assert_eq!(
            strict(&none),
            Err(DefinitionError::PartCount {
                endpoint: "upload".into(),
                count: 0,
            })
        );

        let two = EndpointDefinition::post("upload", "/post")
            .multipart()
            .part("a", ParamType::File)
            .part("b", ParamType::Multipart)
            .returns_stream();
        assert_eq!(
            strict(&two),
            Err(DefinitionError::PartCount {
                endpoint: "upload".into(),
                count: 2,
            })
        );

        let one = EndpointDefinition::post("upload", "/post")
            .multipart()
            .part("file", ParamType::File)
            .field("name", ParamType::Text)
            .returns_stream();
        assert!(strict(&one).unwrap().is_multipart());
    }

    #[test]
    fn test_multipart_with_body() {
        let endpoint = EndpointDefinition::post("upload", "/post")
            .multipart()
            .part("file", ParamType::File)
            .body("body")
            .returns_stream();
        assert_eq!(
            strict(&endpoint),
            Err(DefinitionError::MultipartWithBody {
                endpoint: "upload".into(),
            })
        );
    }

    #[test]
    fn test_part_rules() {
        let no_multipart = EndpointDefinition::post("upload", "/post")
            .part("file", ParamType::File)
            .returns_stream();
        assert!(matches!(
            strict(&no_multipart),
            Err(DefinitionError::PartWithoutMultipart { .. })
        ));

        let wrong_type = EndpointDefinition::post("upload", "/post")
            .multipart()
            .part("file", ParamType::Text)
            .returns_stream();
        assert!(matches!(
            strict(&wrong_type),
            Err(DefinitionError::InvalidPartType { .. })
        ));
    }

    #[test]
    fn test_body_rules() {
        let two = EndpointDefinition::post("post", "/post")
            .body("a")
            .body("b")
            .returns_stream();
        assert!(matches!(
            strict(&two),
            Err(DefinitionError::MultipleBodies { .. })
        ));

        let get_with_field = EndpointDefinition::get("get", "/get")
            .field("a", ParamType::Text)
            .returns_stream();
        assert_eq!(
            strict(&get_with_field),
            Err(DefinitionError::BodyNotAllowed {
                endpoint: "get".into(),
                verb: Verb::Get,
                role: "Field",
            })
        );
    }

    #[test]
    fn test_query_map_rules() {
        let post = EndpointDefinition::post("post", "/post")
            .query_map("extra")
            .returns_stream();
        assert!(matches!(
            strict(&post),
            Err(DefinitionError::QueryMapRequiresGet { .. })
        ));

        let two = EndpointDefinition::get("get", "/get")
            .query_map("a")
            .query_map("b")
            .returns_stream();
        assert!(matches!(
            strict(&two),
            Err(DefinitionError::MultipleQueryMaps { .. })
        ));
    }

    #[test]
    fn test_path_placeholders() {
        let bound = EndpointDefinition::get("delay", "/delay/{seconds}")
            .path("seconds", ParamType::Integer)
            .returns_stream();
        assert!(strict(&bound).is_ok());

        let unbound = EndpointDefinition::get("delay", "/delay/{seconds}").returns_stream();
        assert_eq!(
            strict(&unbound),
            Err(DefinitionError::UnboundPlaceholder {
                endpoint: "delay".into(),
                name: "seconds".into(),
            })
        );
        assert!(parse(&[], &unbound, PlaceholderPolicy::Keep).is_ok());

        let unknown = EndpointDefinition::get("delay", "/delay")
            .path("seconds", ParamType::Integer)
            .returns_stream();
        assert!(matches!(
            strict(&unknown),
            Err(DefinitionError::UnknownPathParameter { .. })
        ));
    }

    #[test]
    fn test_response_mode_rules() {
        let callback = EndpointDefinition::get("get", "/get")
            .query("q", ParamType::Text)
            .callback();
        let desc = strict(&callback).unwrap();
        assert_eq!(desc.mode(), ResponseMode::Callback);
        // Callback parameters carry no role.
        assert_eq!(desc.params().len(), 1);

        let missing = EndpointDefinition::get("get", "/get");
        assert_eq!(
            strict(&missing),
            Err(DefinitionError::CallbackCount {
                endpoint: "get".into(),
                count: 0,
            })
        );

        let stream_with_callback = EndpointDefinition::get("get", "/get")
            .callback()
            .returns_stream();
        assert!(matches!(
            strict(&stream_with_callback),
            Err(DefinitionError::CallbackOnStream { .. })
        ));
    }

    #[test]
    fn test_callback_must_be_last() {
        let leading = EndpointDefinition::get("get", "/get")
            .callback()
            .query("q", ParamType::Text);
        assert_eq!(
            strict(&leading),
            Err(DefinitionError::CallbackNotLast {
                endpoint: "get".into(),
            })
        );

        let trailing = EndpointDefinition::get("get", "/get")
            .query("q", ParamType::Text)
            .callback();
        assert!(strict(&trailing).is_ok());
    }

    #[test]
    fn test_parse_service_names() {
        let service = ServiceDefinition::new("HttpBin")
            .endpoint(EndpointDefinition::get("get", "/get").returns_stream())
            .endpoint(EndpointDefinition::get("get", "/other").returns_stream());
        assert_eq!(
            parse_service(&service, PlaceholderPolicy::Reject),
            Err(DefinitionError::InvalidEndpointName {
                service: "HttpBin".into(),
                endpoint: "get".into(),
            })
        );

        let blank = ServiceDefinition::new("HttpBin")
            .endpoint(EndpointDefinition::get(" ", "/get").returns_stream());
        assert!(parse_service(&blank, PlaceholderPolicy::Reject).is_err());
    }
}
