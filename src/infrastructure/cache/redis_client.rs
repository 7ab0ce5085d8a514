// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// 启动探测的最长等待时间
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// 商品缓存使用的 Redis 客户端
///
/// 首次使用时建立一条多路复用连接，之后所有查询共享该连接
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    connection: Arc<OnceCell<MultiplexedConnection>>,
}

impl RedisClient {
    /// 解析连接地址，不建立连接
    ///
    /// # 参数
    ///
    /// * `redis_url` - 形如 `redis://[:password@]host:port/db` 的地址
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - 客户端
    /// * `Err(anyhow::Error)` - 地址无效
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let con = self
            .connection
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await?;
        Ok(con.clone())
    }

    /// 启动时探测服务器，超过 [`PING_TIMEOUT`] 视为不可达
    pub async fn ping(&self) -> Result<()> {
        let round_trip = async {
            let mut con = self.connection().await?;
            let reply: String = redis::cmd("PING").query_async(&mut con).await?;
            Ok::<_, anyhow::Error>(reply)
        };

        match tokio::time::timeout(PING_TIMEOUT, round_trip).await {
            Ok(reply) => reply.map(|_| ()),
            Err(_) => Err(anyhow!("redis ping timed out after {:?}", PING_TIMEOUT)),
        }
    }

    /// 读取某个搜索词的缓存内容，不存在时为 `None`
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.connection().await?;
        let cached: Option<String> = con.get(key).await?;
        Ok(cached)
    }

    /// 写入缓存内容并设置过期时间（`SETEX`）
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `value` - JSON 序列化后的商品列表
    /// * `ttl_seconds` - 过期时间（秒）
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut con = self.connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }
}
