//! Host background integration: composite property reconciliation and the
//! background-display port.

pub mod composite;
pub mod display;

pub use composite::{reconcile, reset_to_defaults, Anchor, BackgroundProperties, FillStyle};
pub use display::{
    BackgroundDisplay, MemoryPropertyStore, PropertiesBackgroundDisplay, PropertyStore,
    PropertyStoreError,
};
