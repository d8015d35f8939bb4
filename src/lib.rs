pub mod config;
pub mod countries;
pub mod error;
pub mod extract;
pub mod render;
pub mod shipment;

pub use error::ExtractError;
pub use shipment::{Dictionary, ParserOptions, Shipment, TaskSection, parse_shipment, parse_shipment_text};
