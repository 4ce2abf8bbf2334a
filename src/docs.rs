//! OpenAPI documentation derived from the method registry.
//!
//! Every JSON-RPC method is presented as its own POST endpoint at
//! `/<base>/json-rpc/<qualifiedName>`, tagged with its service, so documentation
//! tooling can list methods as if they were individual REST operations. Input and
//! output schemas are the `schemars` schemas of the method types; their nested
//! definitions are collected under `components/schemas`.

use crate::config::JsonRpcConfig;
use crate::registry::{MethodDescriptor, MethodRegistry};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

const TAG_PREFIX: &str = "[JSON-RPC]";
const DISPATCH_SUMMARY: &str = "The endpoint that handles all JSON-RPC requests";
const DEFINITIONS_REF: &str = "#/$defs/";
const COMPONENTS_REF: &str = "#/components/schemas/";

/// Synthetic documentation endpoint of one method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEndpoint {
    pub path: String,
    /// Owning service; used as the documentation tag
    pub group: String,
    pub name: String,
    pub qualified_name: String,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
}

impl MethodEndpoint {
    fn from_descriptor(descriptor: &MethodDescriptor, config: &JsonRpcConfig) -> Self {
        let group = if descriptor.service_name.is_empty() {
            descriptor.qualified_name.clone()
        } else {
            descriptor.service_name.clone()
        };

        Self {
            path: config.method_path(&descriptor.qualified_name),
            group,
            name: descriptor.method_name.clone(),
            qualified_name: descriptor.qualified_name.clone(),
            input_schema: descriptor.input.as_ref().map(|input| input.schema.clone()),
            output_schema: descriptor.output.as_ref().map(|output| output.schema.clone()),
        }
    }

    pub fn tag(&self) -> String {
        format!("{} {}", TAG_PREFIX, self.group)
    }

    pub fn operation_id(&self) -> String {
        format!("{}UsingPOST", self.name)
    }
}

/// One documentation endpoint per registered method, in name order
pub fn endpoints(registry: &MethodRegistry, config: &JsonRpcConfig) -> Vec<MethodEndpoint> {
    registry
        .descriptors()
        .map(|descriptor| MethodEndpoint::from_descriptor(descriptor, config))
        .collect()
}

/// OpenAPI document
#[derive(Debug, Clone, Serialize)]
pub struct ApiDocumentation {
    pub openapi: String,
    pub info: ApiInfo,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

/// Shared schema definitions referenced from operations
#[derive(Debug, Clone, Default, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Move the `$defs` of a generated schema here and point its refs at them
    fn hoist(&mut self, mut schema: Value) -> Value {
        if let Value::Object(object) = &mut schema {
            object.remove("$schema");
            if let Some(Value::Object(definitions)) = object.remove("$defs") {
                for (name, mut definition) in definitions {
                    rewrite_refs(&mut definition);
                    self.schemas.entry(name).or_insert(definition);
                }
            }
        }
        rewrite_refs(&mut schema);
        schema
    }
}

fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(object) => {
            for (key, child) in object.iter_mut() {
                if key != "$ref" {
                    rewrite_refs(child);
                    continue;
                }
                if let Value::String(reference) = child {
                    let rewritten = reference
                        .strip_prefix(DEFINITIONS_REF)
                        .map(|name| format!("{}{}", COMPONENTS_REF, name));
                    if let Some(rewritten) = rewritten {
                        *reference = rewritten;
                    }
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathItem {
    pub post: Operation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    pub tags: Vec<String>,
    pub summary: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    pub responses: BTreeMap<String, ApiResponse>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl ApiResponse {
    fn ok(schema: Option<Value>) -> BTreeMap<String, ApiResponse> {
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            ApiResponse {
                description: "OK".to_string(),
                content: schema.map(json_content),
            },
        );
        responses
    }
}

fn json_content(schema: Value) -> Value {
    json!({"application/json": {"schema": schema}})
}

impl ApiDocumentation {
    /// Build the document for every method in `registry`
    pub fn generate(registry: &MethodRegistry, config: &JsonRpcConfig) -> Self {
        tracing::debug!(method_count = registry.method_count(), "generating openapi spec");

        let mut paths = BTreeMap::new();
        let mut components = Components::default();
        paths.insert(config.endpoint_path(), dispatch_endpoint());

        for endpoint in endpoints(registry, config) {
            let input = endpoint
                .input_schema
                .clone()
                .map(|schema| components.hoist(schema));
            let output = endpoint
                .output_schema
                .clone()
                .map(|schema| components.hoist(schema));
            let operation = Operation {
                tags: vec![endpoint.tag()],
                summary: endpoint.name.clone(),
                operation_id: endpoint.operation_id(),
                request_body: input
                    .map(|schema| json!({"required": true, "content": json_content(schema)})),
                responses: ApiResponse::ok(output),
                deprecated: false,
            };
            paths.insert(endpoint.path, PathItem { post: operation });
        }

        Self {
            openapi: "3.0.3".to_string(),
            info: ApiInfo {
                title: config.docs.title.clone(),
                version: config.docs.version.clone(),
            },
            paths,
            components,
        }
    }

    /// Export as a pretty-printed JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn dispatch_endpoint() -> PathItem {
    let request_schema = json!({
        "type": "object",
        "required": ["jsonrpc", "method"],
        "properties": {
            "id": {},
            "method": {"type": "string"},
            "params": {},
            "jsonrpc": {"type": "string", "enum": ["2.0"]}
        }
    });
    let response_schema = json!({
        "type": "object",
        "properties": {
            "id": {},
            "result": {},
            "error": {
                "type": "object",
                "properties": {
                    "code": {"type": "integer", "format": "int32"},
                    "message": {"type": "string"},
                    "data": {}
                }
            },
            "jsonrpc": {"type": "string"}
        }
    });

    PathItem {
        post: Operation {
            tags: vec![TAG_PREFIX.to_string()],
            summary: DISPATCH_SUMMARY.to_string(),
            operation_id: "handleUsingPOST".to_string(),
            request_body: Some(json!({"required": true, "content": json_content(request_schema)})),
            responses: ApiResponse::ok(Some(response_schema)),
            deprecated: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_registry;

    #[test]
    fn test_endpoints() {
        let registry = test_registry();
        let config = JsonRpcConfig::new().with_path("/api");
        let endpoints = endpoints(&registry, &config);

        assert_eq!(endpoints.len(), registry.method_count());

        let process = endpoints
            .iter()
            .find(|endpoint| endpoint.qualified_name == "testService.process")
            .unwrap();
        assert_eq!(process.path, "/api/json-rpc/testService.process");
        assert_eq!(process.tag(), "[JSON-RPC] testService");
        assert_eq!(process.operation_id(), "processUsingPOST");
        assert!(process.input_schema.is_some());

        let method = endpoints
            .iter()
            .find(|endpoint| endpoint.qualified_name == "method.test")
            .unwrap();
        assert_eq!(method.group, "method");
        assert_eq!(method.name, "test");
    }

    #[test]
    fn test_document() {
        let document = ApiDocumentation::generate(&test_registry(), &JsonRpcConfig::default());
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["openapi"], json!("3.0.3"));
        assert_eq!(value["info"]["title"], json!("Api Documentation"));
        assert_eq!(
            value["paths"]["/"]["post"]["summary"],
            json!("The endpoint that handles all JSON-RPC requests")
        );

        let process = &value["paths"]["/json-rpc/testService.process"]["post"];
        assert_eq!(process["tags"], json!(["[JSON-RPC] testService"]));
        assert_eq!(process["summary"], json!("process"));
        assert_eq!(
            process["requestBody"]["content"]["application/json"]["schema"]["title"],
            json!("TestRequest")
        );
        assert_eq!(process["deprecated"], json!(false));
    }

    #[test]
    fn test_schemas_describe_the_method_types() {
        let document = ApiDocumentation::generate(&test_registry(), &JsonRpcConfig::default());
        let value = serde_json::to_value(&document).unwrap();
        let request_schema = |path: &str| {
            value["paths"][path]["post"]["requestBody"]["content"]["application/json"]["schema"]
                .clone()
        };
        let response_schema = |path: &str| {
            value["paths"][path]["post"]["responses"]["200"]["content"]["application/json"]
                ["schema"]
                .clone()
        };

        assert_eq!(response_schema("/json-rpc/testService.call")["type"], json!("string"));
        assert_eq!(response_schema("/json-rpc/testService.list")["type"], json!("array"));
        assert_eq!(request_schema("/json-rpc/testService.list")["type"], json!("integer"));

        let process = request_schema("/json-rpc/testService.process");
        assert_eq!(process["type"], json!("object"));
        assert_eq!(process["properties"]["name"]["type"], json!("string"));
        assert_eq!(process["required"], json!(["name"]));
        assert!(process.get("$schema").is_none());
        assert_eq!(
            response_schema("/json-rpc/testService.process")["properties"]["value"]["type"],
            json!("integer")
        );
    }

    #[test]
    fn test_nested_types_are_shared_components() {
        let document = ApiDocumentation::generate(&test_registry(), &JsonRpcConfig::default());
        let value = serde_json::to_value(&document).unwrap();

        let array_process = &value["paths"]["/json-rpc/testService.arrayProcess"]["post"]
            ["requestBody"]["content"]["application/json"]["schema"];
        assert!(array_process.get("$defs").is_none());
        assert_eq!(
            array_process["properties"]["values"]["items"]["$ref"],
            json!("#/components/schemas/TestRequest")
        );

        let shared = &value["components"]["schemas"]["TestRequest"];
        assert_eq!(shared["properties"]["name"]["type"], json!("string"));
        assert!(!value.to_string().contains("#/$defs/"));
    }

    #[test]
    fn test_no_input_and_no_result_methods() {
        let document = ApiDocumentation::generate(&test_registry(), &JsonRpcConfig::default());
        let value = serde_json::to_value(&document).unwrap();

        let call = &value["paths"]["/json-rpc/testService.call"]["post"];
        assert!(call.get("requestBody").is_none());

        let without_result = &value["paths"]["/json-rpc/testService.processAsync"]["post"];
        assert!(without_result["responses"]["200"].get("content").is_none());
    }
}
