use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Replica set requires at least one database endpoint")]
    EmptyReplicaSet,
    #[error("Failed to read ABI file {path}: {source}")]
    AbiFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid ABI for contract {contract}: {reason}")]
    InvalidAbi { contract: String, reason: String },
    #[error("Invalid config: {field} should not be empty")]
    EmptyField { field: String },
    #[error("Duplicate contract address in config: {address}")]
    DuplicateContract { address: String },
    #[error("No handler named {name} is registered")]
    UnknownHandler { name: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Event {event} expects {expected} indexed topics, log has {got}")]
    TopicCountMismatch {
        event: String,
        expected: usize,
        got: usize,
    },
    #[error("Failed to decode topic {index} of event {event}: {reason}")]
    InvalidTopic {
        event: String,
        index: usize,
        reason: String,
    },
    #[error("Failed to unpack data of event {event}: {reason}")]
    InvalidData { event: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record not found in table {table}")]
    NotFound { table: String },
    #[error("Endpoint {endpoint} failed: {reason}")]
    Endpoint { endpoint: String, reason: String },
}
