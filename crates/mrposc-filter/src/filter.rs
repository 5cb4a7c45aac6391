//! The address filter
//!
//! Classifies each inbound message by its address and routes it to exactly one
//! of two outbound channels: the original message to *accept*, or a diagnostic
//! naming the unknown address to *reject*.

use crate::address::AddressTable;
use crate::message::OscMessage;
use crate::sink::DispatchSink;
use mrposc_core::error::{FilterError, INVALID_PATH_PREFIX};
use std::fmt;
use std::sync::Arc;

/// Result of a membership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Address is in the table
    Pass,
    /// Address is not in the table
    Block,
}

impl FilterResult {
    /// Check if the result is Pass
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterResult::Pass)
    }

    /// Check if the result is Block
    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, FilterResult::Block)
    }
}

/// A message whose address was not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The raw address; empty when the message had none
    pub address: String,
}

impl Rejection {
    /// Diagnostic text sent on the reject channel
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", INVALID_PATH_PREFIX, self.address)
    }
}

impl From<Rejection> for FilterError {
    fn from(rejection: Rejection) -> Self {
        FilterError::unrecognized(rejection.address)
    }
}

/// Classification of one message
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Forward the message unchanged
    Accepted(OscMessage),
    /// Report the unknown address; arguments are dropped
    Rejected(Rejection),
}

impl Outcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// Emit this outcome on the matching channel of `sink`
    pub fn emit<S>(self, sink: &S)
    where
        S: DispatchSink + ?Sized,
    {
        match self {
            Outcome::Accepted(msg) => sink.forward(msg),
            Outcome::Rejected(rejection) => sink.reject(rejection.diagnostic()),
        }
    }

    /// Convert into a `Result`, with the rejection as a [`FilterError`]
    pub fn into_result(self) -> Result<OscMessage, FilterError> {
        match self {
            Outcome::Accepted(msg) => Ok(msg),
            Outcome::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

/// Stateless address filter over an injected table
#[derive(Debug, Clone)]
pub struct AddressFilter {
    table: Arc<AddressTable>,
}

impl AddressFilter {
    pub fn new(table: Arc<AddressTable>) -> Self {
        Self { table }
    }

    /// Filter over the shared MRP table
    pub fn mrp() -> Self {
        Self::new(AddressTable::shared_mrp())
    }

    pub fn table(&self) -> &Arc<AddressTable> {
        &self.table
    }

    /// Decide where a message goes without emitting it
    #[inline]
    pub fn classify(&self, msg: OscMessage) -> Outcome {
        if self.table.evaluate(msg.address_str()).is_pass() {
            Outcome::Accepted(msg)
        } else {
            Outcome::Rejected(Rejection {
                address: msg.address.unwrap_or_default(),
            })
        }
    }

    /// Classify a message and emit it on exactly one channel of `sink`
    #[inline]
    pub fn dispatch<S>(&self, msg: OscMessage, sink: &S)
    where
        S: DispatchSink + ?Sized,
    {
        self.classify(msg).emit(sink);
    }
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self::mrp()
    }
}
