//! service-core: Shared edge infrastructure for the storefront web tier.
pub mod error;
pub mod middleware;
pub mod observability;
pub mod signing;
pub mod tenancy;
pub mod utils;

pub use error::AppError;
pub use signing::{OutboundRequest, RequestSigner, SignedEnvelope, SigningError};
pub use tenancy::{TenancyConfig, TenantContext, TenantSlug};
pub use utils::clock::{Clock, FixedClock, SystemClock};
