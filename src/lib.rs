pub mod channel;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod firmware;
pub mod payload;
pub mod probe;
pub mod stimulus;

pub mod prelude {
    pub use crate::{
        channel::*, client::*, config::*, error::*, payload::*, probe::*, stimulus::*,
    };
}
