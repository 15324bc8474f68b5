//! # Collide
//!
//! Two hash maps over prime-sized tables that differ only in how they resolve
//! collisions:
//!
//! - `OpenAddressingMap`: entries live in a flat array of slots; collisions are
//!   resolved by double hashing, removals leave tombstones
//! - `ChainedMap`: every slot is a bucket holding a most-recent-first list of entries
//!
//! Both implement the [`Map`] trait, grow to the next prime at or above twice their
//! capacity once the load factor threshold (75% by default) is exceeded, and never
//! shrink except through `clear`.
//!
//! ## Basic Usage
//!
//! ```rust
//! use collide::{ChainedMap, Map, OpenAddressingMap};
//!
//! let mut open = OpenAddressingMap::new();
//! open.insert("apple".to_string(), 1);
//! open.insert("banana".to_string(), 2);
//! assert_eq!(open.find("apple"), Some(&1));
//!
//! // Missing keys are inserted with a default value by `access`.
//! *open.access("cherry".to_string()) += 3;
//! assert_eq!(open.find("cherry"), Some(&3));
//!
//! open.remove("apple");
//! assert!(!open.key_exists("apple"));
//!
//! let mut chained: ChainedMap<u32, u32> = ChainedMap::with_capacity(10);
//! assert_eq!(chained.capacity(), 11);
//! for i in 0..9 {
//!     chained.insert(i, i * i);
//! }
//! assert_eq!(chained.capacity(), 23);
//! assert_eq!(chained.find(&3), Some(&9));
//! ```
//!
//! ## Duplicate Keys
//!
//! `insert` never replaces an existing entry. The two maps disagree on which
//! duplicate a lookup sees:
//!
//! ```rust
//! use collide::{ChainedMap, Map, OpenAddressingMap};
//!
//! let mut open = OpenAddressingMap::new();
//! let mut chained = ChainedMap::new();
//! open.insert("key", 1);
//! open.insert("key", 2);
//! chained.insert("key", 1);
//! chained.insert("key", 2);
//!
//! assert_eq!(open.find(&"key"), Some(&1));
//! assert_eq!(chained.find(&"key"), Some(&2));
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use collide::{LoadFactor, Map, MapConfig, OpenAddressingMap};
//!
//! let config = MapConfig::default()
//!     .with_initial_capacity(100)
//!     .with_load_factor(LoadFactor::new(50).expect("50% is in range"));
//! let map: OpenAddressingMap<u32, u32> = OpenAddressingMap::with_config(config);
//! assert_eq!(map.capacity(), 101);
//! assert!(LoadFactor::new(0).is_err());
//! ```

/// Module implementing the separate chaining hash map
mod chained;
/// Module holding construction parameters and the resize policy
mod config;
/// Hash functions and prime sizing used by both maps
pub mod hashing;
/// Module defining the map contract shared by both implementations
mod map;
/// Module implementing the open addressing hash map
mod open_addressing;

pub use chained::ChainedMap;
pub use config::{ConfigError, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR_PERCENT, LoadFactor, MapConfig};
pub use map::Map;
pub use open_addressing::OpenAddressingMap;
