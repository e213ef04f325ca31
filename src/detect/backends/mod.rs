pub mod stub;

#[cfg(feature = "backend-rustface")]
pub mod rustface;

pub use stub::StubBackend;

#[cfg(feature = "backend-rustface")]
pub use self::rustface::RustfaceBackend;
