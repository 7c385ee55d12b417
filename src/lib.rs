//! Mutation Brawler simulation core.
//!
//! A player fights waves of enemies in a 2.5D arena, collects mutation cards
//! that recompose their two attacks, and levels up.  This crate is the
//! frame-stepped simulation; rendering and raw input live in the binary.

pub mod attacks;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod inventory;
pub mod mutations;
pub mod progression;
pub mod spawn;
