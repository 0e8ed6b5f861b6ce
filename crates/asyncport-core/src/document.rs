//! Read-only AsyncAPI 2.x document model
//!
//! Documents are parsed once into `serde_json::Value` (YAML and JSON are both
//! accepted) and validated up front. Everything the importer needs is exposed
//! through typed accessors; local `$ref`s to `#/components/...` are resolved
//! while loading.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::settings::{LifecycleState, SettingsOverride};
use crate::version::{BumpStrategy, is_valid_semver};

/// Extension naming the target application domain
pub const EXT_DOMAIN_NAME: &str = "x-ep-application-domain-name";
/// Extension overriding the event name of a message
pub const EXT_EVENT_NAME: &str = "x-ep-event-name";
/// Extension overriding the schema name of a message payload
pub const EXT_SCHEMA_NAME: &str = "x-ep-schema-name";
/// Document-level settings overrides
pub const EXT_SHARED: &str = "x-ep-shared";
pub const EXT_TARGET_STATE: &str = "x-ep-target-state";
pub const EXT_VERSION_STRATEGY: &str = "x-ep-version-strategy";

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// A parsed and validated AsyncAPI document
#[derive(Debug, Clone)]
pub struct AsyncApiDocument {
    path: Option<PathBuf>,
    title: String,
    version: String,
    description: Option<String>,
    domain_name: Option<String>,
    overrides: SettingsOverride,
    channels: IndexMap<String, Channel>,
}

/// A channel with its operations and parameters
#[derive(Debug, Clone)]
pub struct Channel {
    pub topic: String,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub publish: Option<Operation>,
    pub subscribe: Option<Operation>,
}

/// A channel parameter, optionally restricted to an enumerated value list
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

/// Operation direction, as written in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Publish,
    Subscribe,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => write!(f, "publish"),
            Self::Subscribe => write!(f, "subscribe"),
        }
    }
}

/// A publish or subscribe operation carrying exactly one message
#[derive(Debug, Clone)]
pub struct Operation {
    pub direction: Direction,
    pub operation_id: Option<String>,
    pub description: Option<String>,
    pub message: Message,
}

/// A message with its resolved payload schema
#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub event_name: String,
    pub schema_name: String,
    pub content_type: String,
    pub description: Option<String>,
    pub payload: Value,
}

/// One level of a topic address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLevel {
    Literal(String),
    Variable(String),
}

impl AsyncApiDocument {
    /// Load a document from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::DocumentNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut doc = Self::parse(&content)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Parse a document from a string
    pub fn parse(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        Self::from_value(root)
    }

    /// Build the document model from an already parsed value
    pub fn from_value(root: Value) -> Result<Self> {
        let spec_version = str_field(&root, "asyncapi")
            .ok_or_else(|| CoreError::invalid_document("missing 'asyncapi' version field"))?;
        if !spec_version.starts_with("2.") {
            return Err(CoreError::not_supported(format!(
                "AsyncAPI version {spec_version} (only 2.x documents are supported)"
            )));
        }

        let info = root
            .get("info")
            .ok_or_else(|| CoreError::MissingField {
                field: "info".to_string(),
            })?;
        let title = str_field(info, "title").ok_or_else(|| CoreError::MissingField {
            field: "info.title".to_string(),
        })?;
        let version = str_field(info, "version").ok_or_else(|| CoreError::MissingField {
            field: "info.version".to_string(),
        })?;
        if !is_valid_semver(version) {
            return Err(CoreError::InvalidVersion {
                version: version.to_string(),
                reason: "info.version must be a semantic version".to_string(),
            });
        }

        let overrides = SettingsOverride {
            shared: info.get(EXT_SHARED).and_then(Value::as_bool),
            target_state: str_field(info, EXT_TARGET_STATE)
                .map(str::parse::<LifecycleState>)
                .transpose()?,
            version_strategy: str_field(info, EXT_VERSION_STRATEGY)
                .map(str::parse::<BumpStrategy>)
                .transpose()?,
        };

        let default_content_type = str_field(&root, "defaultContentType")
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut channels = IndexMap::new();
        if let Some(raw_channels) = root.get("channels").and_then(Value::as_object) {
            for (topic, raw) in raw_channels {
                let channel = parse_channel(&root, topic, raw, &default_content_type)?;
                channels.insert(topic.clone(), channel);
            }
        }

        Ok(Self {
            path: None,
            title: title.to_string(),
            version: version.to_string(),
            description: str_field(info, "description").map(String::from),
            domain_name: str_field(info, EXT_DOMAIN_NAME).map(String::from),
            overrides,
            channels,
        })
    }

    /// File the document was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Application domain declared by the document
    pub fn domain_name(&self) -> Option<&str> {
        self.domain_name.as_deref()
    }

    /// Settings declared in `info` extensions
    pub fn settings_override(&self) -> &SettingsOverride {
        &self.overrides
    }

    /// Channels in document order
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel(&self, topic: &str) -> Option<&Channel> {
        self.channels.get(topic)
    }
}

impl Channel {
    /// Operations present on this channel (publish first)
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.publish.iter().chain(self.subscribe.iter())
    }

    /// Split the topic into address levels
    pub fn address_levels(&self) -> Vec<AddressLevel> {
        topic_address_levels(&self.topic)
    }
}

/// Split a channel topic into literal and variable address levels
pub fn topic_address_levels(topic: &str) -> Vec<AddressLevel> {
    topic
        .split('/')
        .filter(|level| !level.is_empty())
        .map(|level| {
            match level
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(variable) => AddressLevel::Variable(variable.to_string()),
                None => AddressLevel::Literal(level.to_string()),
            }
        })
        .collect()
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Resolve a local `$ref`, returning the target and its component key
fn resolve<'a>(root: &'a Value, value: &'a Value) -> Result<(&'a Value, Option<String>)> {
    let Some(reference) = str_field(value, "$ref") else {
        return Ok((value, None));
    };
    let pointer = reference.strip_prefix('#').ok_or_else(|| {
        CoreError::not_supported(format!("external reference '{reference}'"))
    })?;
    let target = root.pointer(pointer).ok_or_else(|| {
        CoreError::invalid_document(format!("unresolved reference '{reference}'"))
    })?;
    let key = pointer.rsplit('/').next().map(String::from);
    Ok((target, key))
}

/// Inline every local `$ref` below `value`
///
/// `stack` holds the references currently being expanded; meeting one of them
/// again means the schema refers to itself.
fn dereference(root: &Value, value: &Value, stack: &mut Vec<String>) -> Result<Value> {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if stack.iter().any(|seen| seen == reference) {
                    return Err(CoreError::not_supported(format!(
                        "recursive schema reference '{reference}'"
                    )));
                }
                let (target, _) = resolve(root, value)?;
                stack.push(reference.to_string());
                let expanded = dereference(root, target, stack);
                stack.pop();
                return expanded;
            }
            map.iter()
                .map(|(key, child)| Ok((key.clone(), dereference(root, child, stack)?)))
                .collect::<Result<serde_json::Map<_, _>>>()
                .map(Value::Object)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| dereference(root, item, stack))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn parse_channel(
    root: &Value,
    topic: &str,
    raw: &Value,
    default_content_type: &str,
) -> Result<Channel> {
    let mut parameters = Vec::new();
    if let Some(raw_params) = raw.get("parameters").and_then(Value::as_object) {
        for (name, param) in raw_params {
            let (param, _) = resolve(root, param)?;
            let enum_values = match param.get("schema") {
                Some(schema) => {
                    let (schema, _) = resolve(root, schema)?;
                    schema.get("enum").and_then(Value::as_array).map(|values| {
                        values
                            .iter()
                            .map(|v| match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect()
                    })
                }
                None => None,
            };
            parameters.push(Parameter {
                name: name.clone(),
                description: str_field(param, "description").map(String::from),
                enum_values,
            });
        }
    }

    let publish = raw
        .get("publish")
        .map(|op| parse_operation(root, topic, Direction::Publish, op, default_content_type))
        .transpose()?;
    let subscribe = raw
        .get("subscribe")
        .map(|op| parse_operation(root, topic, Direction::Subscribe, op, default_content_type))
        .transpose()?;

    Ok(Channel {
        topic: topic.to_string(),
        description: str_field(raw, "description").map(String::from),
        parameters,
        publish,
        subscribe,
    })
}

fn parse_operation(
    root: &Value,
    topic: &str,
    direction: Direction,
    raw: &Value,
    default_content_type: &str,
) -> Result<Operation> {
    let raw_message = raw.get("message").ok_or_else(|| {
        CoreError::invalid_document(format!("{direction} operation of '{topic}' has no message"))
    })?;
    let (message, component_key) = resolve(root, raw_message)?;
    if message.get("oneOf").is_some() {
        return Err(CoreError::not_supported(format!(
            "multiple messages (oneOf) in {direction} operation of '{topic}'"
        )));
    }

    let operation_id = str_field(raw, "operationId").map(String::from);
    let name = str_field(message, "name")
        .map(String::from)
        .or(component_key)
        .or_else(|| str_field(message, EXT_EVENT_NAME).map(String::from))
        .ok_or_else(|| {
            CoreError::invalid_document(format!(
                "message in {direction} operation of '{topic}' has no name"
            ))
        })?;

    let content_type = str_field(message, "contentType")
        .unwrap_or(default_content_type)
        .to_string();
    if !content_type.contains("json") {
        return Err(CoreError::not_supported(format!(
            "content type '{content_type}' of message '{name}' (only JSON payloads are supported)"
        )));
    }

    let raw_payload = message.get("payload").ok_or_else(|| {
        CoreError::invalid_document(format!("message '{name}' has no payload"))
    })?;
    let (_, schema_key) = resolve(root, raw_payload)?;
    let payload = dereference(root, raw_payload, &mut Vec::new())?;

    let schema_name = str_field(message, EXT_SCHEMA_NAME)
        .map(String::from)
        .or(schema_key)
        .unwrap_or_else(|| name.clone());
    let event_name = str_field(message, EXT_EVENT_NAME)
        .map(String::from)
        .unwrap_or_else(|| name.clone());

    Ok(Operation {
        direction,
        operation_id,
        description: str_field(raw, "description").map(String::from),
        message: Message {
            name,
            event_name,
            schema_name,
            content_type,
            description: str_field(message, "description").map(String::from),
            payload,
        },
    })
}
