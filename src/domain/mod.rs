pub mod annotation;
pub mod directive;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod ports;
pub mod product;
pub mod sheet;
pub mod snapshot;
pub mod value_objects;
