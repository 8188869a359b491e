//! Core domain types for the rankwatch ranking tracker.
//!
//! This crate provides the types shared by every other crate:
//! - `RankState`: tier / division / points triple with a total order
//! - `PlayerId`, `RiotId`: immutable storage key and mutable display name
//! - `Region`, `Cluster`, `RegionClusterTable`: upstream endpoint routing
//! - `TrackedEntity`, `Subscription`: the persisted record and its subscribers
//! - `MatchSummary`: most recent activity used to enrich notifications
//! - `BoxFuture`: return type of the async collaborator traits

pub mod activity;
pub mod entity;
pub mod error;
pub mod identity;
pub mod rank;
pub mod region;

pub use activity::{MatchSummary, Participant, Role, Team};
pub use entity::{
    ChannelId, GuildId, SubscriberRef, SubscriberRemoval, Subscription, TrackedEntity,
};
pub use error::{CoreError, Result};
pub use identity::{parse_riot_id, PlayerId, RiotId};
pub use rank::{Division, RankState, Tier};
pub use region::{parse_region, Cluster, Region, RegionClusterTable};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
