//! 按用户串行化对话轮次
//!
//! 同一用户同时只有一轮对话在执行，不同用户互不阻塞。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
pub struct TurnGate {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待该用户上一轮结束；返回的 guard 释放前其它轮次阻塞
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            // 丢弃无人持有的槽位
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            slots
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let gate = TurnGate::new();
        let guard = gate.acquire("u1").await;

        let gate2 = gate.clone();
        let waiter = tokio::spawn(async move {
            let _g = gate2.acquire("u1").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // 其它用户不受影响
        let _other = gate.acquire("u2").await;

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
