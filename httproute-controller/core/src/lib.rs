#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
mod defaults;
pub mod grant;
mod intent;
mod resource_id;
pub mod route;


pub use self::{
    defaults::{Defaults, DefaultsError},
    intent::{Intent, InvalidIntent, ParentGateway},
    resource_id::ResourceId,
};

pub const CONTROLLER_NAME: &str = "httproute-controller";

/// Placed on a Service while derived resources may exist for it.
pub const FINALIZER: &str = "httproute.controller/httproute-finalizer";
