tokio::task_local! {
    /// The request currently being handled on this task.
    pub static REQUEST_CONTEXT: RequestContext;
}

/// What the file layer needs to know about the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Prefix the application is mounted under, e.g. `/tenant/app`. May be empty.
    pub path_base: String,
    /// Request path below the path base.
    pub path: String,
}

impl RequestContext {
    pub fn new(path_base: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path_base: path_base.into(),
            path: path.into(),
        }
    }
}

/// Gives access to the request being handled by the caller, if any.
pub trait RequestContextAccessor: Send + Sync {
    fn current(&self) -> Option<RequestContext>;
}

/// Reads the request from [`REQUEST_CONTEXT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalRequestContext;

impl RequestContextAccessor for TaskLocalRequestContext {
    fn current(&self) -> Option<RequestContext> {
        REQUEST_CONTEXT.try_with(RequestContext::clone).ok()
    }
}
