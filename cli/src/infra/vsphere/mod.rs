//! vCenter gateway over the vSphere Web Services (vim25) SOAP API.

pub mod session;
pub mod soap;
pub mod transport;
pub mod xml;

pub use session::{VsphereConnector, VsphereSession};
pub use transport::{HttpTransport, SoapFault, SoapTransport};
