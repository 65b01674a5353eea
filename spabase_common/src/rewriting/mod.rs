pub mod html;
pub mod js;
pub mod rewriter;

pub use html::html_rewriter::HtmlRewriter;
pub use js::service_worker_rewriter::ServiceWorkerRewriter;
pub use rewriter::Rewriter;
