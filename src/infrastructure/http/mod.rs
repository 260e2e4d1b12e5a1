//! HTTP adapter for the media API.

pub mod client;
pub mod dto;

pub use client::{HttpMediaSource, decode_page};
