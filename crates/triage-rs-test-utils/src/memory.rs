use async_trait::async_trait;
use serde_json::Value;
use triage_rs_memory::{MemoryError, MemoryStore};

/// Memory store whose every operation fails with an I/O error.
#[derive(Debug, Clone, Default)]
pub struct FailingMemory;

fn unavailable() -> MemoryError {
    MemoryError::Io(std::io::Error::other("memory unavailable"))
}

#[async_trait]
impl MemoryStore for FailingMemory {
    async fn get(&self, _key: &str) -> Result<Option<Value>, MemoryError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), MemoryError> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &str) -> Result<bool, MemoryError> {
        Err(unavailable())
    }

    async fn keys(&self, _prefix: Option<&str>) -> Result<Vec<String>, MemoryError> {
        Err(unavailable())
    }
}
