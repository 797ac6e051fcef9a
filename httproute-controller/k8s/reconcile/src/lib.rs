#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cleanup;
mod error;
mod events;
pub mod finalizer;
mod reconciler;
mod store;


pub use self::{
    error::{Error, Result},
    events::{Reason, Report},
    reconciler::{Reconciler, State},
    store::{Object, Store},
};
