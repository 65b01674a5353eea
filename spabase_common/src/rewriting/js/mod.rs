pub mod service_worker_rewriter;
