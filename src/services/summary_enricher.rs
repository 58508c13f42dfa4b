//! 摘要补充服务 - 业务能力层
//!
//! 提交后为每道题并发获取正确答案的背景资料。
//! 本服务不接触会话，结果带上会话代数通过通道发回，由控制器负责合并。

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clients::SummaryProvider;
use crate::error::SummaryError;
use crate::models::Generation;

/// 单条摘要结果
#[derive(Debug)]
pub struct SummaryUpdate {
    /// 发起请求时的会话代数
    pub generation: Generation,
    pub index: usize,
    pub result: Result<String, SummaryError>,
}

/// 摘要补充服务
#[derive(Clone)]
pub struct SummaryEnricher {
    provider: Arc<dyn SummaryProvider>,
}

impl SummaryEnricher {
    pub fn new(provider: Arc<dyn SummaryProvider>) -> Self {
        Self { provider }
    }

    /// 在后台任务中执行一整批查询
    ///
    /// # 参数
    /// - `runtime`: 运行后台任务的运行时
    /// - `generation`: 所属会话代数
    /// - `titles`: 按题目顺序排列的查询关键字（正确答案）
    /// - `updates`: 结果发送通道
    pub fn dispatch(
        &self,
        runtime: &Handle,
        generation: Generation,
        titles: Vec<String>,
        updates: UnboundedSender<SummaryUpdate>,
    ) -> JoinHandle<usize> {
        let provider = Arc::clone(&self.provider);
        runtime.spawn(async move { Self::enrich(provider.as_ref(), generation, &titles, &updates).await })
    }

    /// 并发查询全部关键字，每条结果到达后立即发送
    ///
    /// # 返回
    /// 成功获取的摘要数量
    pub async fn enrich(
        provider: &dyn SummaryProvider,
        generation: Generation,
        titles: &[String],
        updates: &UnboundedSender<SummaryUpdate>,
    ) -> usize {
        debug!("[会话 {}] 开始获取 {} 条摘要", generation, titles.len());

        let mut lookups: FuturesUnordered<_> = titles
            .iter()
            .enumerate()
            .map(|(index, title)| async move { (index, provider.fetch_summary(title).await) })
            .collect();

        let mut fetched = 0;
        while let Some((index, result)) = lookups.next().await {
            if result.is_ok() {
                fetched += 1;
            }
            let update = SummaryUpdate {
                generation,
                index,
                result,
            };
            if updates.send(update).is_err() {
                debug!("[会话 {}] 接收端已关闭，停止发送摘要", generation);
                break;
            }
        }

        info!(
            "[会话 {}] 摘要获取完成: 成功 {}/{}",
            generation,
            fetched,
            titles.len()
        );
        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// 按关键字长度延迟返回，用于验证乱序到达
    struct DelayedProvider;

    #[async_trait]
    impl SummaryProvider for DelayedProvider {
        async fn fetch_summary(&self, title: &str) -> Result<String, SummaryError> {
            tokio::time::sleep(Duration::from_millis(10 * title.len() as u64)).await;
            if title == "missing" {
                return Err(SummaryError::NotFound {
                    title: title.to_string(),
                });
            }
            Ok(format!("About {}", title))
        }
    }

    fn titles(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_arrive_as_they_complete() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetched = SummaryEnricher::enrich(
            &DelayedProvider,
            Generation::new(3),
            &titles(&["Madrid", "Rome", "Oslo"]),
            &tx,
        )
        .await;
        assert_eq!(fetched, 3);

        let mut order = Vec::new();
        while let Ok(update) = rx.try_recv() {
            assert_eq!(update.generation, Generation::new(3));
            order.push(update.index);
        }
        // "Madrid" 最慢，最后到达
        assert_eq!(order.len(), 3);
        assert_eq!(order.last(), Some(&0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_is_reported_per_index() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetched = SummaryEnricher::enrich(
            &DelayedProvider,
            Generation::new(1),
            &titles(&["Paris", "missing", "Rome"]),
            &tx,
        )
        .await;
        assert_eq!(fetched, 2);

        let mut failed = Vec::new();
        while let Ok(update) = rx.try_recv() {
            if update.result.is_err() {
                failed.push(update.index);
            }
        }
        assert_eq!(failed, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_runs_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let enricher = SummaryEnricher::new(Arc::new(DelayedProvider));

        let handle = enricher.dispatch(
            &Handle::current(),
            Generation::new(2),
            titles(&["Oslo", "Bern"]),
            tx,
        );
        let first = rx.recv().await.expect("应收到摘要");
        assert_eq!(first.generation, Generation::new(2));

        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_closed_receiver_stops_sending() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let fetched =
            SummaryEnricher::enrich(&DelayedProvider, Generation::new(1), &titles(&["a"]), &tx).await;
        assert_eq!(fetched, 1);
    }
}
