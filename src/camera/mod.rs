// Camera domain: discovery, session control and image transfer.

pub mod canon;
pub mod error;
