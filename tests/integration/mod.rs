// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;
pub mod http_api_test;
pub mod recommendation_flow_test;
pub mod worker_pool_test;
