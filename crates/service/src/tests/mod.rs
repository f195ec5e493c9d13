mod dispatcher_tests;
mod engine_tests;
