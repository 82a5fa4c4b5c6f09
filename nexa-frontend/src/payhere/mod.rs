//! PayHere hosted-checkout hand-off for donations.

pub mod checksum;
pub mod form;
pub mod gateway;
pub mod request;
pub mod response;

pub use checksum::{rolling_checksum, SignatureScheme};
pub use form::{CheckoutField, CheckoutForm};
pub use gateway::{CheckoutOutcome, PayHereGateway};
pub use request::{Currency, Donation, Donor, OrderId, PaymentError, PaymentRequest};
pub use response::PaymentResponse;
