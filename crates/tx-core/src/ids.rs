//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Cross-references between agents
//! (a bid naming a taxi, a deal naming a customer) are always by id, never by
//! shared ownership.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a taxi.  Taxis live for the whole run, so ids are dense and
    /// double as indices into the host's vehicle table.
    pub struct TaxiId(u32);
}

typed_id! {
    /// Identity of a transport request.  Monotonic over the run; delivered
    /// customers are removed, so ids are sparse at any given tick.
    pub struct CustomerId(u64);
}

/// Any addressable participant in the message protocol.
///
/// Ordering puts every taxi before every customer, which fixes the broadcast
/// delivery order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentRef {
    Taxi(TaxiId),
    Customer(CustomerId),
}

impl AgentRef {
    /// The taxi id, if this reference names a taxi.
    #[inline]
    pub fn taxi(self) -> Option<TaxiId> {
        match self {
            AgentRef::Taxi(id) => Some(id),
            AgentRef::Customer(_) => None,
        }
    }

    /// The customer id, if this reference names a customer.
    #[inline]
    pub fn customer(self) -> Option<CustomerId> {
        match self {
            AgentRef::Customer(id) => Some(id),
            AgentRef::Taxi(_) => None,
        }
    }
}

impl From<TaxiId> for AgentRef {
    fn from(id: TaxiId) -> Self {
        AgentRef::Taxi(id)
    }
}

impl From<CustomerId> for AgentRef {
    fn from(id: CustomerId) -> Self {
        AgentRef::Customer(id)
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRef::Taxi(id)     => id.fmt(f),
            AgentRef::Customer(id) => id.fmt(f),
        }
    }
}
