//! Core library for dashstar
//!
//! This crate implements the **Functional Core** of the dashstar article
//! client, following the Functional Core - Imperative Shell architectural
//! pattern.
//!
//! # Architecture Overview
//!
//! - **`dashstar_core`** (this crate): Pure domain types and state machines with zero I/O
//! - **`dashstar`**: HTTP, terminal and session handling (the Imperative Shell)
//!
//! Nothing in this crate performs a network request or touches the terminal.
//! The listing controller does not fetch: it returns a
//! [`page::PageRequest`] describing the fetch and expects the shell to hand
//! back the outcome. That keeps the pagination rules and the stale-response
//! check testable with plain fixture data.
//!
//! # Module Organization
//!
//! - [`article`]: Article model and lenient decoding of backend responses
//! - [`page`]: The page-indexed fetch controller and pagination metadata
//! - [`view`]: Role gate, routes and the rendered list view
//!
//! # Example Usage
//!
//! ```rust
//! use dashstar_core::article::ArticlePage;
//! use dashstar_core::page::{PageFetchController, Settlement};
//! use serde_json::json;
//!
//! let mut controller = PageFetchController::default();
//! let request = controller.mount();
//!
//! let body = json!({
//!     "data": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}],
//!     "totalArticles": 2
//! });
//! let settlement = controller.on_fetch_settled(request, ArticlePage::from_value(&body));
//!
//! assert_eq!(settlement, Settlement::Applied);
//! assert_eq!(controller.items()[0].title, "B");
//! assert_eq!(controller.page_count(), 1);
//! ```

pub mod article;
pub mod page;
pub mod view;
