pub mod msr;

pub use msr::{MsrBackend, MsrHandle, RegisterAccess, RegisterBackend};
