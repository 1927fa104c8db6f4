pub mod chooser;
pub mod verifier;
pub mod worker;

pub use crate::domain::model::{EndpointAddress, MasterIdentity, VerificationResult};
pub use crate::domain::ports::{AddressStore, ConfigProvider, MasterTransport, Notifier};
pub use crate::utils::error::Result;
