//! Bind native variables to Modbus addresses and move their values in and out of
//! Modbus register and coil buffers, on top of [tokio-modbus](https://github.com/slowtec/tokio-modbus).
//!
//! ## Bindings
//!
//! A [`binding::Binding`] borrows consecutive native variables and lays them out from
//! its `first` address, each entry taking `size` addressable units. For every request
//! window the library resolves which *whole* entries lie inside the window (see
//! [`range::intersect`]) and transfers them in either direction:
//!
//! - *assign* copies bound values into a buffer to answer a read request,
//! - *access* copies buffer contents into bound values after a write request.
//!
//! Entries that only partially overlap a window are never transferred, so multi-word
//! values are never torn.
//!
//! ## Traits
//!
//! - [`core::BindingSource`] produces a [`map::BindingMap`] over the fields of a type,
//! - [`core::RegisterMirror`] keeps those fields in sync with a remote device.
//!
//! ## Derive macro
//!
//! `#[derive(BindingSource)]` implements [`core::BindingSource`] from `modbus` field attributes:
//! - `table` - one of `"coil"`, `"discrete"`, `"input"` or `"holding"`,
//! - `addr` - start address, `u16` integer,
//! - `size` - optional number of addressable units per entry; defaults to the native width.
//!
//! Adjacent fields of the same table and type are merged into one binding and array
//! fields bind every element. The optional struct `modbus` attribute sets the register
//! layout with `words` (`"high_first"` or `"low_first"`) and `bytes` (`"be"` or `"le"`).
//!
//! See [demos/](https://github.com/vladimirvrabely/modbus-binding/tree/main/modbus-binding/demos) for simple usage.

pub mod access;
pub mod binding;
pub mod bits;
/// Utilities for encoding native values into and decoding from Modbus registers
pub mod codec;
/// Core traits to bind types and mirror remote registers
pub mod core;
pub mod error;
pub mod exception;
pub mod fixed;
pub mod frame;
pub mod function;
pub mod map;
pub mod order;
pub mod range;
pub mod slave;
pub mod store;
pub mod transfer;

/// Modbus server over a [`core::BindingSource`] (based on tokio-modbus [servers examples](https://github.com/slowtec/tokio-modbus/tree/main/examples))
#[cfg(feature = "server")]
pub mod server;

pub mod derive {
    /// Re-export.
    pub use modbus_binding_derive::{modbus_doc, BindingSource};
}

pub use binding::Binding;
pub use error::Error;
pub use exception::ExceptionCode;
pub use fixed::Fixed;
pub use map::BindingMap;
pub use order::{ByteOrder, Layout, WordOrder};
