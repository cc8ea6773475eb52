pub mod catalog;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod identity;
pub mod normalization;
pub mod paths;
pub mod render;
pub mod routes;
pub mod session;
pub mod validation;
