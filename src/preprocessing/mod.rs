//! Feature preprocessing

mod scaler;

pub use scaler::{row_with_bias, with_bias, StandardScaler};
