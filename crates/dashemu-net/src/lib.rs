//! Network transport for the DASH client emulator.
//!
//! [`HttpClient`] performs plain and byte-range GET requests plus HEAD probes;
//! [`RetryNet`] wraps any [`Net`] with the bounded retry policy that turns
//! transient connection failures into delays and persistent ones into
//! [`NetError::RetryExhausted`].

#![forbid(unsafe_code)]

mod client;
mod error;
mod retry;
mod traits;
mod types;

#[cfg(feature = "mock")]
pub mod mock {
    pub use crate::traits::NetMock;
}

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    retry::RetryNet,
    traits::{Net, NetExt},
    types::{Download, Headers, NetOptions, RangeSpec, RetryPolicy},
};
