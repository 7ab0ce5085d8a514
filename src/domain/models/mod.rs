// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 商品（product）：提取出的商品以及按分类聚合的结果
/// - 推荐条目（recommendation）：调用方提交的服装推荐及搜索词生成规则
pub mod product;
pub mod recommendation;
