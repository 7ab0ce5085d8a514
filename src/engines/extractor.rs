// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::Product;
use crate::utils::text_processing::decode_text;
use crate::utils::url_utils::{normalize_image_url, ASSET_HOST};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

/// 商品卡片容器选择器，按顺序尝试
pub const CONTAINER_SELECTORS: &[&str] = &[
    "li.product-base",
    "div.product-base",
    "[data-testid=\"product-card\"]",
    "div.search-searchProductsContainer li",
];

/// 商品名称选择器，按顺序尝试
const NAME_SELECTORS: &[&str] = &[
    "h4.product-product",
    "h3.product-brand",
    ".product-productMetaInfo h4",
    "[title]",
];

/// 商品图片选择器，按顺序尝试
const IMAGE_SELECTORS: &[&str] = &["img.img-responsive", "picture img", "img"];

static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| compile(CONTAINER_SELECTORS));
static NAMES: Lazy<Vec<Selector>> = Lazy::new(|| compile(NAME_SELECTORS));
static IMAGES: Lazy<Vec<Selector>> = Lazy::new(|| compile(IMAGE_SELECTORS));
static SCRIPTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("Failed to compile script selector"));

static PRODUCT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""productName"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("Failed to compile productName regex")
});
static SEARCH_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""searchImage"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("Failed to compile searchImage regex")
});

/// 提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// 商品卡片 DOM 结构
    Containers,
    /// 页面中直接出现的 JSON 键值
    EmbeddedJson,
    /// 脚本中的 JSON 数据
    ScriptPayload,
}

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

/// 从可用页面中提取最多 `num_results` 个商品
///
/// 依次尝试卡片结构、内嵌 JSON 和脚本数据，第一个得到商品的方式即为结果
pub fn extract_products(body: &str, num_results: usize) -> Vec<Product> {
    extract_with_method(body, num_results)
        .map(|(_, products)| products)
        .unwrap_or_default()
}

/// 同 [`extract_products`]，同时返回命中的提取方式
pub fn extract_with_method(
    body: &str,
    num_results: usize,
) -> Option<(ExtractionMethod, Vec<Product>)> {
    if num_results == 0 {
        return None;
    }

    let attempts: [(ExtractionMethod, fn(&str, usize) -> Vec<Product>); 3] = [
        (ExtractionMethod::Containers, from_containers),
        (ExtractionMethod::EmbeddedJson, from_embedded_json),
        (ExtractionMethod::ScriptPayload, from_script_payload),
    ];

    for (method, extract) in attempts {
        let products = extract(body, num_results);
        if !products.is_empty() {
            debug!(?method, count = products.len(), "Extracted products");
            return Some((method, products));
        }
    }

    debug!("No products found in usable page");
    None
}

/// 基于商品卡片容器提取
pub fn from_containers(body: &str, num_results: usize) -> Vec<Product> {
    let document = Html::parse_document(body);

    for container_selector in CONTAINERS.iter() {
        let cards: Vec<ElementRef> = document.select(container_selector).collect();
        if cards.is_empty() {
            continue;
        }

        let products: Vec<Product> = cards
            .into_iter()
            .filter_map(product_from_card)
            .take(num_results)
            .collect();

        if !products.is_empty() {
            return products;
        }
    }

    Vec::new()
}

fn product_from_card(card: ElementRef) -> Option<Product> {
    let name = card_name(card)?;
    let image = card_image(card)?;
    Some(Product::new(name, normalize_image_url(&image, ASSET_HOST)))
}

fn card_name(card: ElementRef) -> Option<String> {
    NAMES.iter().find_map(|selector| {
        card.select(selector).find_map(|el| {
            let text = match el.value().attr("title").filter(|t| !t.trim().is_empty()) {
                Some(title) => title.to_string(),
                None => el.text().collect::<Vec<_>>().join(" "),
            };
            let name = decode_text(&collapse_whitespace(&text));
            (!name.is_empty()).then_some(name)
        })
    })
}

fn card_image(card: ElementRef) -> Option<String> {
    IMAGES
        .iter()
        .find_map(|selector| card.select(selector).find_map(image_source))
}

/// 图片地址，`src` 为懒加载占位图时退回 `data-src` / `srcset`
fn image_source(img: ElementRef) -> Option<String> {
    let attrs = img.value();

    let real_src = attrs
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty() && !src.starts_with("data:"));

    let lazy_src = || {
        attrs
            .attr("data-src")
            .map(str::trim)
            .filter(|src| !src.is_empty())
    };

    let srcset = || {
        attrs
            .attr("srcset")
            .or_else(|| attrs.attr("data-srcset"))
            .and_then(|set| set.split(',').next())
            .and_then(|candidate| candidate.split_whitespace().next())
    };

    real_src
        .or_else(lazy_src)
        .or_else(srcset)
        .map(decode_text)
        .filter(|src| !src.is_empty())
}

/// 基于页面文本中的 `"productName"` / `"searchImage"` 键值提取，按出现顺序配对
pub fn from_embedded_json(body: &str, num_results: usize) -> Vec<Product> {
    let names = PRODUCT_NAME_RE
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));
    let images = SEARCH_IMAGE_RE
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));

    names
        .zip(images)
        .filter_map(|(name, image)| {
            let name = decode_text(name);
            let image = decode_text(image);
            if name.is_empty() || image.is_empty() {
                return None;
            }
            Some(Product::new(name, normalize_image_url(&image, ASSET_HOST)))
        })
        .take(num_results)
        .collect()
}

/// 基于脚本中的 JSON 数据提取
///
/// 识别 `window.__myx = {...}` 赋值和 `application/json` 类型的脚本
pub fn from_script_payload(body: &str, num_results: usize) -> Vec<Product> {
    let document = Html::parse_document(body);
    let mut products = Vec::new();

    for script in document.select(&SCRIPTS) {
        let text = script.text().collect::<String>();
        let is_json = script
            .value()
            .attr("type")
            .is_some_and(|t| t.contains("json"));

        let payload = if is_json {
            parse_leading_json(text.trim())
        } else {
            assignment_payload(&text)
        };

        if let Some(value) = payload {
            collect_products(&value, num_results, &mut products);
        }
        if products.len() >= num_results {
            break;
        }
    }

    products.truncate(num_results);
    products
}

/// 取 `window.__xxx = {...};` 中等号右侧的 JSON
fn assignment_payload(script: &str) -> Option<Value> {
    let start = script.find("window.__")?;
    let rest = &script[start..];
    let eq = rest.find('=')?;
    parse_leading_json(rest[eq + 1..].trim_start())
}

/// 解析字符串开头的第一个 JSON 值，忽略其后的内容
fn parse_leading_json(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .and_then(Result::ok)
}

/// 递归查找 `products` / `itemListElement` 数组
fn collect_products(value: &Value, num_results: usize, out: &mut Vec<Product>) {
    if out.len() >= num_results {
        return;
    }

    match value {
        Value::Object(map) => {
            for key in ["products", "itemListElement"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    for item in items {
                        if out.len() >= num_results {
                            return;
                        }
                        if let Some(product) = product_from_json(item) {
                            out.push(product);
                        }
                    }
                }
            }
            for (key, child) in map {
                if key != "products" && key != "itemListElement" {
                    collect_products(child, num_results, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_products(item, num_results, out);
            }
        }
        _ => {}
    }
}

fn product_from_json(item: &Value) -> Option<Product> {
    let item = item.get("item").unwrap_or(item);

    let name = ["productName", "product", "name"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(decode_text)
        .filter(|n| !n.is_empty())?;

    let image = item
        .get("searchImage")
        .and_then(Value::as_str)
        .or_else(|| {
            item.get("images")
                .and_then(|images| images.get(0))
                .and_then(|first| first.get("src").or(Some(first)))
                .and_then(Value::as_str)
        })
        .or_else(|| match item.get("image") {
            Some(Value::Array(images)) => images.first().and_then(Value::as_str),
            Some(other) => other.as_str(),
            None => None,
        })
        .map(decode_text)
        .filter(|i| !i.is_empty())?;

    Some(Product::new(name, normalize_image_url(&image, ASSET_HOST)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
