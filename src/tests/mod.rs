mod session_tests;
mod stats_tests;

use crate::core::services::DivvyService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub fn create_test_service() -> DivvyService<InMemoryLogging, InMemoryStorage> {
    create_test_service_with(InMemoryStorage::new())
}

pub fn create_test_service_with(storage: InMemoryStorage) -> DivvyService<InMemoryLogging, InMemoryStorage> {
    DivvyService::new(storage, InMemoryLogging::new(), "test-secret".to_string())
}
