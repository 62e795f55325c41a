//! Lock-protected registers shared between execution units.
//!
//! See [`SharedRegister`].
mod shared;
pub use self::shared::{RegisterGuard, SharedRegister};

/// A register shared between execution units.
pub trait Register {
    type Value;

    /// Returns the value currently contained in the register.
    fn read(&self) -> Self::Value;

    /// Sets contents of the register to the specified value.
    fn write(&self, value: Self::Value);
}
