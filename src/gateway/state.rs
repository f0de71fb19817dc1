use std::sync::Arc;

use crate::llm::LanguageModel;
use crate::service::ClassificationService;
use crate::vectordb::LawStore;

/// Router state: the shared serving layer.
pub struct GatewayState<S, M> {
    pub service: Arc<ClassificationService<S, M>>,
}

impl<S, M> GatewayState<S, M>
where
    S: LawStore + 'static,
    M: LanguageModel + 'static,
{
    pub fn new(service: Arc<ClassificationService<S, M>>) -> Self {
        Self { service }
    }
}

// Derived `Clone` would require `S: Clone` and `M: Clone`.
impl<S, M> Clone for GatewayState<S, M> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
