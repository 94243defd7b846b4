//! Wire layer for gqlive.
//!
//! Queries and mutations travel over GraphQL-over-HTTP request/response
//! bodies; subscriptions travel over a persistent graphql-transport-ws
//! channel. The [`executor::OperationExecutor`] unifies both behind one
//! callback contract and never lets a transport failure escape as an
//! error — every failure path ends in exactly one error-formatted
//! callback invocation.

pub mod error;
pub mod executor;
pub mod http;
pub mod request;
pub mod response;
pub mod transport;
pub mod ws;

pub use error::{ClientError, ClientResult};
pub use executor::OperationExecutor;
pub use http::OneShotTransport;
pub use request::GraphQLRequest;
pub use response::{GraphQLError, GraphQLResponse};
pub use transport::{streaming_url, StreamSettings, Transport};
pub use ws::{StreamEvent, StreamingTransport, SubscriptionStream};
