//! Stand-ins for the external systems the protocol talks to.

pub mod token;
pub mod pair;
pub mod price_feed;
pub mod farms;
