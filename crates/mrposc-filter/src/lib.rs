//! Address filtering and routing for Magnetic Resonator Piano OSC messages
//!
//! Each inbound message is checked against a fixed table of control addresses
//! and routed to one of two outbound channels:
//!
//! - **accept**: the original message, arguments untouched and in order
//! - **reject**: the diagnostic `"invalid path: <address>"`
//!
//! Only the leading address is inspected. Argument count, type and range are
//! the downstream consumer's concern.
//!
//! # Examples
//!
//! ## Dispatching into channels
//!
//! ```rust
//! use mrposc_filter::{osc, AddressFilter, ChannelSink};
//!
//! let filter = AddressFilter::mrp();
//! let (sink, rx) = ChannelSink::unbounded();
//!
//! filter.dispatch(osc!("/midi", 144, 90, 60), &sink);
//! filter.dispatch(osc!("/ui/volume/foo"), &sink);
//!
//! assert_eq!(rx.accepted.try_recv().unwrap(), osc!("/midi", 144, 90, 60));
//! assert_eq!(rx.rejected.try_recv().unwrap(), "invalid path: /ui/volume/foo");
//! ```
//!
//! ## A reduced table
//!
//! ```rust
//! use mrposc_filter::{osc, AddressFilter, AddressTable};
//! use std::sync::Arc;
//!
//! let table = Arc::new(AddressTable::from_paths(["/midi"]).unwrap());
//! let filter = AddressFilter::new(table);
//!
//! assert!(filter.classify(osc!("/midi")).is_accepted());
//! assert!(filter.classify(osc!("/ui/volume", 0.8)).is_rejected());
//! ```
//!
//! ## Configuration from YAML
//!
//! ```yaml
//! include_defaults: true
//! exclude_legacy: true
//! addresses:
//!   - /mrp/quality/brightness
//!   - path: /ui/status/thermal
//!     summary: query coil temperature
//! exclude: [/ptrk/pitch]
//! ```

pub mod address;
pub mod config;
pub mod filter;
pub mod message;
pub mod sink;

// Re-export commonly used types
pub use address::{AddressSpec, AddressTable, MRP_ADDRESSES};
pub use config::{AddressEntry, TableConfig};
pub use filter::{AddressFilter, FilterResult, Outcome, Rejection};
pub use message::{OscArg, OscMessage};
pub use sink::{
    CallbackSink, ChannelReceivers, ChannelSink, CollectingSink, DispatchSink, Emission,
    MetricsSink, TracingSink,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mrp_address_accepted() {
        let filter = AddressFilter::mrp();
        let sink = CollectingSink::new();

        for spec in MRP_ADDRESSES {
            let msg = OscMessage::new(
                spec.path.to_string(),
                vec![OscArg::Int(1), OscArg::Float(0.5)],
            );
            filter.dispatch(msg.clone(), &sink);
            assert_eq!(sink.take(), vec![Emission::Forward(msg)]);
        }
    }

    #[test]
    fn test_dispatch_is_repeatable() {
        let filter = AddressFilter::mrp();
        let first = filter.classify(osc!("/ui/volume", 0.8));
        let second = filter.classify(osc!("/ui/volume", 0.8));
        assert_eq!(first, second);

        let first = filter.classify(osc!("/ui/volum", 0.8));
        let second = filter.classify(osc!("/ui/volum", 0.8));
        assert_eq!(first, second);
        assert_eq!(filter.table().len(), MRP_ADDRESSES.len());
    }
}
