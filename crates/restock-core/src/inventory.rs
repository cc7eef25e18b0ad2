//! 渠道庫存模型

use serde::{Deserialize, Serialize};

/// 單一渠道（本地倉 / 海外倉 / FBA）的庫存狀態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStock {
    /// 現有可用庫存
    pub on_hand: u32,

    /// 在途數量
    pub in_transit: u32,
}

impl ChannelStock {
    /// 創建新的渠道庫存
    pub fn new(on_hand: u32, in_transit: u32) -> Self {
        Self {
            on_hand,
            in_transit,
        }
    }

    /// 只有現有庫存，沒有在途
    pub fn on_hand(on_hand: u32) -> Self {
        Self::new(on_hand, 0)
    }

    /// 現有 + 在途
    pub fn pipeline(&self) -> u64 {
        u64::from(self.on_hand) + u64::from(self.in_transit)
    }

    /// 是否完全沒有庫存（含在途）
    pub fn is_empty(&self) -> bool {
        self.pipeline() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_does_not_overflow() {
        let stock = ChannelStock::new(u32::MAX, u32::MAX);
        assert_eq!(stock.pipeline(), 2 * u64::from(u32::MAX));
        assert!(!stock.is_empty());
    }

    #[test]
    fn test_empty_stock() {
        assert!(ChannelStock::default().is_empty());
        assert!(!ChannelStock::on_hand(1).is_empty());
    }
}
