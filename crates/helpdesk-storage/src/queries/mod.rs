// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each takes `&Database` and runs on its connection thread.

pub mod tickets;
