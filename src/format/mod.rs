//! # Format Module
//!
//! Response format negotiation. A client asks for a format through the
//! `format` request parameter; [`Format::resolve`] turns that token into one
//! of a closed set of formats, each bound to exactly one serialization
//! provider and one wire content type:
//!
//! | Format | Content-Type                    | Provider              |
//! |--------|---------------------------------|-----------------------|
//! | JSON   | `application/json`              | `serde_json`          |
//! | XML    | `application/xml;charset=UTF-8` | `quick-xml` (serde)   |
//! | BINARY | `application/octet-stream`      | byte pass-through     |
//! | PDF    | `application/pdf`               | byte pass-through     |
//!
//! Callers always reach the provider through the format
//! ([`Format::provider`]), so a format can never be paired with the wrong
//! encoder.

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    BinaryProvider, Format, FormatError, FormatProvider, JsonProvider, PdfProvider, XmlProvider,
};
