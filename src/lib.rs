#![cfg_attr(not(test), no_std)]

pub mod rtsx;
mod err;

pub use err::SdError;
