// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 商品图片的静态资源主机
pub const ASSET_HOST: &str = "https://assets.myntassets.com/";

/// 判断地址是否自带协议头（http:、https:、data: 等）
pub fn has_scheme(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

/// 将图片地址规范化为绝对地址
///
/// 自带协议头的地址原样返回；其余视为静态资源路径，去掉开头的斜杠后拼接到 `asset_host`
pub fn normalize_image_url(raw: &str, asset_host: &str) -> String {
    let raw = raw.trim();
    if has_scheme(raw) {
        return raw.to_string();
    }
    format!(
        "{}/{}",
        asset_host.trim_end_matches('/'),
        raw.trim_start_matches('/')
    )
}

/// 构造搜索结果页地址
///
/// 路径段中的空格替换为 `-`，`rawQuery` 参数中的空格编码为 `%20`
pub fn build_search_url(base_url: &str, query: &str) -> String {
    let slug = query.trim().replace(' ', "-");
    format!(
        "{}/{}?rawQuery={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&slug),
        urlencoding::encode(query.trim())
    )
}
