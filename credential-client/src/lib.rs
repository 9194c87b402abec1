//! Client side of the short-lived credential scheme.
//!
//! * [`RotationAgent`] re-issues a service's own credential on a fixed interval and publishes
//!   it through a [`CurrentToken`] cell.
//! * [`ClientRefreshProtocol`] recovers from an expired credential by issuing a new one when a
//!   protected call comes back unauthenticated, then retrying a bounded number of times.
//! * [`HttpIssuer`] and [`HttpIntrospector`] talk to the token service.

mod current;
mod error;
mod introspection;
mod issuer;
pub mod models;
mod refresh;
mod rotation;
mod stats;

pub use current::CurrentToken;
pub use error::ClientError;
pub use introspection::{HttpIntrospector, Introspector};
pub use issuer::{HttpIssuer, Issuer};
pub use models::{IntrospectionResponse, IssueRequest, IssuedToken, fingerprint, parse_bearer};
pub use refresh::{
    ClientRefreshProtocol, GatewayCall, ProtectedCall, RefreshOptions, RefreshOutcome,
    RefreshReport,
};
pub use rotation::{RotationAgent, RotationAgentOptions};
pub use stats::RefreshMetrics;
