// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 商品
///
/// 从商品列表页提取出的一条记录，`image_url` 始终为绝对地址
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// 商品名称
    pub name: String,
    /// 商品图片地址
    pub image_url: String,
}

impl Product {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
        }
    }
}

/// 查询命中的商品
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductMatch {
    /// 产生该商品的搜索词
    pub search_query: String,
    /// 商品
    pub product: Product,
}

/// 单个推荐条目的结果
///
/// `recommendation` 原样保留调用方提交的条目，`products` 汇总该条目所有颜色候选的命中
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResult {
    /// 原始推荐条目
    pub recommendation: Value,
    /// 所有 (搜索词, 商品) 对
    pub products: Vec<ProductMatch>,
}

impl ItemResult {
    pub fn new(recommendation: Value) -> Self {
        Self {
            recommendation,
            products: Vec::new(),
        }
    }

    /// 追加某个搜索词的全部商品
    pub fn extend(&mut self, search_query: &str, products: Vec<Product>) {
        self.products
            .extend(products.into_iter().map(|product| ProductMatch {
                search_query: search_query.to_string(),
                product,
            }));
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// 按分类聚合的结果，顺序与请求中的分类顺序一致
pub type CategoryResults = IndexMap<String, Vec<ItemResult>>;
