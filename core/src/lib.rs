//! Client core for the PokeCollect trading-card collection API.
//!
//! # Overview
//! Everything a front end needs below the view layer: token storage, a JSON
//! request executor, typed services for auth, catalog and collection
//! endpoints, an image cache, and an observable session state.
//!
//! # Design
//! - `ApiClient` builds an `HttpRequest`, hands it to a `Transport`, and
//!   classifies the `HttpResponse`, so the I/O boundary is explicit and
//!   tests can swap the network for a scripted transport.
//! - The bearer token lives behind `SecretStore`; the client reads it for
//!   every request and only the `SessionCoordinator` writes it.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod images;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::{CredentialError, KeyringSecretStore, MemorySecretStore, SecretStore};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use images::{ImageCache, ImageLoader, LoadedImage};
pub use services::{AuthService, CardSetsService, CardsService, CollectionService};
pub use session::{SessionCoordinator, SessionError, SessionState};
pub use transport::{ReqwestTransport, Transport, TransportError};
