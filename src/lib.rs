pub mod app_state;
pub mod configuration;
pub mod domain;
pub mod notification_channel;
pub mod request_id;
pub mod routes;
pub mod startup;
pub mod subscription_service;
pub mod subscription_store;
pub mod telemetry;
pub mod transit_client;
pub mod utils;
