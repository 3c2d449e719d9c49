//! built.io SDK - Rust Implementation
//!
//! A client SDK for the built.io backend-as-a-service. It wraps the REST API
//! for applications, classes, objects, application users, queries and uploads
//! behind typed models with field-level change tracking, so only modified
//! fields are sent when a model is saved.
//!
//! # Architecture
//!
//! 1. **Client Layer** (`client`) - Transport trait, reqwest transport, session
//! 2. **Model Layer** (`model`) - Change-tracked records and the resource types
//!    built on them (Application, Class, Object, User, Upload), plus ACLs
//! 3. **Query Layer** (`query`) - Filter/sort parameter builder and results
//!
//! # Example
//!
//! ```no_run
//! use builtio::client::Client;
//! use builtio::config::Config;
//! use builtio::model::{Model, Object, SaveOptions};
//!
//! # async fn run() -> builtio::Result<()> {
//! let client = Client::new(Config::with_api_key("blt5d4sample2633b"))?;
//!
//! let mut person = Object::new("person")?;
//! person.set("name", "James");
//! person.save(&client, &SaveOptions::default()).await?;
//!
//! person.increment("visits", 1)?;
//! person.save(&client, &SaveOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod util;

pub use error::{Error, Result};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default built.io API host
pub const API_URI: &str = "https://api.built.io";

/// Field in which an object's location is stored
pub const LOCATION_PATH: &str = "__loc";

/// Class uid of application users
pub const USER_CLASS_UID: &str = "built_io_application_user";

/// Class uid of application user roles
pub const ROLE_CLASS_UID: &str = "built_io_application_user_role";

/// Class uid of installation data
pub const INST_CLASS_UID: &str = "built_io_installation_data";
