// Test modules

pub mod common;

mod context_service_test;
mod models_test;
mod pipeline_service_test;
