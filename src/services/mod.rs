pub mod dispatcher;
pub mod push_gateway;
