//! Command lifecycle event types
//!
//! These mirror the payloads a MongoDB driver hands to its command
//! monitoring hooks: one started event and exactly one succeeded or
//! failed event per operation, correlated by `request_id`. The request
//! id is only unique among operations in flight on a connection and is
//! reused after completion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Commands whose first document element names the target collection.
///
/// For anything else (hello, ping, getMore, saslStart, ...) no collection
/// can be resolved from the command document.
const COLLECTION_COMMANDS: &[&str] = &[
    "aggregate",
    "count",
    "create",
    "createIndexes",
    "delete",
    "distinct",
    "drop",
    "dropIndexes",
    "find",
    "findAndModify",
    "insert",
    "listIndexes",
    "mapReduce",
    "update",
];

/// Remote endpoint of the connection a command was issued on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAddress {
    /// Resolved IP endpoint
    Ip(SocketAddr),
    /// Unresolved DNS endpoint
    Dns { host: String, port: u16 },
}

impl ServerAddress {
    pub fn port(&self) -> u16 {
        match self {
            ServerAddress::Ip(addr) => addr.port(),
            ServerAddress::Dns { port, .. } => *port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerAddress::Ip(addr) => write!(f, "{addr}"),
            ServerAddress::Dns { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Error parsing a `host:port` server address
#[derive(Debug, Error)]
#[error("invalid server address '{0}': expected ip:port or host:port")]
pub struct AddressParseError(pub String);

impl FromStr for ServerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(ServerAddress::Ip(addr));
        }
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddressParseError(s.to_string()))?;
        if host.is_empty() {
            return Err(AddressParseError(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| AddressParseError(s.to_string()))?;
        Ok(ServerAddress::Dns {
            host: host.to_string(),
            port,
        })
    }
}

/// Emitted when the driver sends a command to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandStartedEvent {
    /// Driver-assigned id, unique among in-flight operations
    pub request_id: i32,

    /// Wire-level command name (insert, update, find, hello, ...)
    pub command_name: String,

    /// Database the command targets, if any
    pub db: Option<String>,

    /// The command document as sent to the server
    pub command: serde_json::Value,

    /// Remote endpoint of the connection, when known
    pub connection: Option<ServerAddress>,
}

impl CommandStartedEvent {
    /// Collection the command targets, resolved from the command document.
    ///
    /// Returns `None` for commands that do not address a collection or
    /// when the document does not carry a string under the command name.
    pub fn collection(&self) -> Option<&str> {
        if !COLLECTION_COMMANDS.contains(&self.command_name.as_str()) {
            return None;
        }
        self.command.get(&self.command_name)?.as_str()
    }

    /// Span operation name: `{collection}.{command}` when the collection
    /// is resolvable, `mongodb.{command}` otherwise.
    pub fn operation_name(&self) -> String {
        match self.collection() {
            Some(coll) => format!("{coll}.{}", self.command_name),
            None => format!("mongodb.{}", self.command_name),
        }
    }
}

/// Emitted when a command completes successfully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSucceededEvent {
    /// Id of the matching started event
    pub request_id: i32,

    /// Wire-level command name
    pub command_name: String,

    /// Server round-trip time as measured by the driver
    pub duration: Duration,
}

/// Emitted when a command completes with a server or transport error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandFailedEvent {
    /// Id of the matching started event
    pub request_id: i32,

    /// Wire-level command name
    pub command_name: String,

    /// What went wrong
    pub failure: CommandFailure,

    /// Time until the failure was observed
    pub duration: Duration,
}

/// Description of an observed command failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandFailure {
    /// Human-readable failure message
    pub message: String,

    /// Type of the underlying driver error
    pub error_type: String,

    /// Captured stack trace, when the driver provides one
    pub stack: Option<String>,
}

/// The lifecycle stages a subscriber can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Succeeded,
    Failed,
}

/// All command lifecycle events, as a closed union
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum CommandEvent {
    #[serde(rename = "command.started")]
    Started(CommandStartedEvent),

    #[serde(rename = "command.succeeded")]
    Succeeded(CommandSucceededEvent),

    #[serde(rename = "command.failed")]
    Failed(CommandFailedEvent),
}

impl CommandEvent {
    /// Which lifecycle stage this event belongs to
    pub fn kind(&self) -> EventKind {
        match self {
            CommandEvent::Started(_) => EventKind::Started,
            CommandEvent::Succeeded(_) => EventKind::Succeeded,
            CommandEvent::Failed(_) => EventKind::Failed,
        }
    }

    /// Correlation id shared by a started event and its completion
    pub fn request_id(&self) -> i32 {
        match self {
            CommandEvent::Started(e) => e.request_id,
            CommandEvent::Succeeded(e) => e.request_id,
            CommandEvent::Failed(e) => e.request_id,
        }
    }

    /// Wire-level command name
    pub fn command_name(&self) -> &str {
        match self {
            CommandEvent::Started(e) => &e.command_name,
            CommandEvent::Succeeded(e) => &e.command_name,
            CommandEvent::Failed(e) => &e.command_name,
        }
    }
}

impl From<CommandStartedEvent> for CommandEvent {
    fn from(event: CommandStartedEvent) -> Self {
        CommandEvent::Started(event)
    }
}

impl From<CommandSucceededEvent> for CommandEvent {
    fn from(event: CommandSucceededEvent) -> Self {
        CommandEvent::Succeeded(event)
    }
}

impl From<CommandFailedEvent> for CommandEvent {
    fn from(event: CommandFailedEvent) -> Self {
        CommandEvent::Failed(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn started(command_name: &str, command: serde_json::Value) -> CommandStartedEvent {
        CommandStartedEvent {
            request_id: 1,
            command_name: command_name.to_string(),
            db: Some("test".to_string()),
            command,
            connection: None,
        }
    }

    #[test]
    fn collection_resolved_from_command_document() {
        let event = started("insert", json!({"insert": "my_collection", "documents": []}));
        assert_eq!(event.collection(), Some("my_collection"));
        assert_eq!(event.operation_name(), "my_collection.insert");
    }

    #[test]
    fn admin_commands_have_no_collection() {
        let event = started("hello", json!({"hello": 1}));
        assert_eq!(event.collection(), None);
        assert_eq!(event.operation_name(), "mongodb.hello");
    }

    #[test]
    fn non_string_collection_value_is_ignored() {
        let event = started("find", json!({"find": 42}));
        assert_eq!(event.collection(), None);
        assert_eq!(event.operation_name(), "mongodb.find");
    }

    #[test]
    fn address_parses_ip_and_dns_forms() {
        let ip: ServerAddress = "127.0.0.1:27017".parse().unwrap();
        assert!(matches!(ip, ServerAddress::Ip(_)));
        assert_eq!(ip.port(), 27017);

        let dns: ServerAddress = "mongo.internal:27017".parse().unwrap();
        assert_eq!(
            dns,
            ServerAddress::Dns {
                host: "mongo.internal".to_string(),
                port: 27017
            }
        );
        assert_eq!(dns.to_string(), "mongo.internal:27017");
    }

    #[test]
    fn address_rejects_garbage() {
        assert!("localhost".parse::<ServerAddress>().is_err());
        assert!(":27017".parse::<ServerAddress>().is_err());
        assert!("host:notaport".parse::<ServerAddress>().is_err());
    }

    #[test]
    fn event_union_accessors() {
        let event: CommandEvent = started("find", json!({"find": "users"})).into();
        assert_eq!(event.kind(), EventKind::Started);
        assert_eq!(event.request_id(), 1);
        assert_eq!(event.command_name(), "find");
    }
}
