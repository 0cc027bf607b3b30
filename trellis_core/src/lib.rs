// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-tracked render scheduling for retained widget trees.
//!
//! `trellis_core` provides the data structures that sit between a widget
//! toolkit and a platform rendering backend: a widget tree with change
//! recording, an invalidation engine that coalesces changes into minimal
//! deferred work, and a clip propagation tree for widgets that need to know
//! their on-screen visible region. It is `no_std` compatible (with `alloc`)
//! and uses array-based struct-of-arrays storage with index handles for
//! cache-friendly traversal.
//!
//! # Architecture
//!
//! The crate is organized around an event loop that turns tree mutations into
//! incremental surface updates:
//!
//! ```text
//!   Application mutations
//!       │
//!       ▼
//!   WidgetTree ──► ChangeRecords ──► RenderScheduler::commit()
//!                                           │
//!                      arms TaskQueue ◄─────┤ (at most one task)
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   RenderScheduler::flush() ──► layout fixed point
//!                            ──► render walk ──► GraphicsDevice / WidgetHooks
//!                            ──► surface geometry sync
//! ```
//!
//! **[`widget`]** — Struct-of-arrays widget tree with generational handles.
//! Properties (bounds, visibility, z-index, size preferences) are set by the
//! caller; mutations queue [`ChangeRecord`](widget::ChangeRecord)s instead of
//! firing callbacks.
//!
//! **[`scheduler`]** — The [`RenderScheduler`](scheduler::RenderScheduler):
//! managed-widget lifecycle, dirty marks, the antichain pending-render queue,
//! deferred cleanup for removed children, and the three-stage flush.
//!
//! **[`layout`]** — The [`Layout`](layout::Layout) strategy trait containers
//! use to position their children.
//!
//! **[`backend`]** — The [`GraphicsDevice`](backend::GraphicsDevice),
//! [`WidgetHooks`](backend::WidgetHooks), and [`TaskQueue`](backend::TaskQueue)
//! traits that platform backends and the widget layer implement.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! flush instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
mod clip;
pub mod layout;
pub mod scheduler;
pub mod trace;
pub mod widget;
