use futures::future::BoxFuture;

use crate::error::ClassifierError;

/// One system + user exchange with a text-generation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Ask the service to constrain its reply to a JSON object.
    pub json_response: bool,
}

/// A hosted text-generation model.
pub trait TextGenerator: Send + Sync {
    /// Model identifier recorded on verdicts.
    fn model(&self) -> &str;

    /// Send one request and return the reply text.
    ///
    /// Transport and service failures must surface as
    /// [`ClassifierError::ModelUnavailable`].
    fn generate<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, ClassifierError>>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn generate<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, ClassifierError>> {
        (**self).generate(request)
    }
}
