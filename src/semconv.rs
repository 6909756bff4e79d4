//! Span attribute keys
//!
//! Database client-call conventions, after
//! <https://opentelemetry.io/docs/specs/semconv/database/>.

/// Identifies the database system on a client span
pub const DB_SYSTEM: &str = "db.system";
/// Value of [`DB_SYSTEM`] for all spans this crate produces
pub const DB_SYSTEM_MONGODB: &str = "mongodb";

/// Database (namespace) the command targets
pub const DB_NAME: &str = "db.name";
/// Collection the command targets, when resolvable
pub const DB_MONGODB_COLLECTION: &str = "db.mongodb.collection";
/// Wire-level command name
pub const DB_OPERATION: &str = "db.operation";
/// `mongodb://host:port` form of the connected endpoint
pub const DB_CONNECTION_STRING: &str = "db.connection_string";

/// Remote endpoint IP address
pub const NET_PEER_IP: &str = "net.peer.ip";
/// Remote endpoint DNS name
pub const NET_PEER_NAME: &str = "net.peer.name";
/// Remote endpoint port
pub const NET_PEER_PORT: &str = "net.peer.port";

/// Marks a span as having observed a command failure
pub const ERROR: &str = "error";
/// Type of the driver error behind a failed command
pub const ERROR_TYPE: &str = "error.type";
/// Failure message
pub const ERROR_MSG: &str = "error.msg";
/// Stack trace captured with the failure, when available
pub const ERROR_STACK: &str = "error.stack";
