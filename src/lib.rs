pub mod engine;
pub mod protocol;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{anyhow, Context, Error};
        pub type Result<T> = anyhow::Result<T, Error>;

        pub use std::collections::{BTreeSet, HashMap, HashSet};
    }
}

pub mod prelude {
    pub use super::engine::*;
    pub use super::protocol::*;
    pub use super::utils::prelude::*;
}
