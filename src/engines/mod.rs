// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod browser;
pub mod classifier;
pub mod extractor;
pub mod fire_engine_tls;
pub mod playwright_engine;
pub mod reqwest_engine;
pub mod router;
pub mod stealth_engine;
pub mod traits;
