// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod collection;
pub mod entities;
pub mod filter;
pub mod gateway;
pub mod input;
pub mod local;

pub use collection::{
    Collection, CreateError, Entity, MutateError, RemoveOutcome, StagedRemoval,
};
pub use filter::Filter;
pub use gateway::{Gateway, GatewayError, ListFilter, Row, TABLES};
pub use local::{LocalGateway, default_db_path, validate_db_path};

pub const APP_NAME: &str = "alma";
