//! Common imports used throughout madrona.

pub use std::collections::HashMap;
pub use std::sync::{Arc, Mutex, RwLock};

pub use crate::core::errors::{CoreError, Result};
pub use crate::util::geometry::Rect;
