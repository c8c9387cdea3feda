//! Wire types for `aigc_draft/generate` and `get_history_by_ids`.

use serde::Deserialize;

/// `POST /mweb/v1/aigc_draft/generate` response envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct GenerateResponse {
    pub aigc_data: AigcData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AigcData {
    pub history_record_id: Option<String>,
}

/// One entry in `item_list`: a completed artifact. The upstream emits
/// different URL fields depending on generation kind; both are
/// optional and extraction tries each in turn.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryItem {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct HistoryTask {
    #[serde(default)]
    pub finish_time: i64,
}

/// One history record, as returned for a single id in
/// `get_history_by_ids`'s response map.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryRecord {
    pub status: String,
    #[serde(default)]
    pub fail_code: i64,
    #[serde(default)]
    pub item_list: Vec<HistoryItem>,
    #[serde(default)]
    pub task: HistoryTask,
}

impl HistoryRecord {
    /// Extracts every asset URL present in `item_list`, in order.
    pub fn asset_urls(&self) -> Vec<String> {
        self.item_list
            .iter()
            .filter_map(|item| item.image_url.clone().or_else(|| item.video_url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_urls_prefers_image_then_falls_back_to_video() {
        let record = HistoryRecord {
            status: "success".into(),
            fail_code: 0,
            item_list: vec![
                HistoryItem {
                    image_url: Some("img1".into()),
                    video_url: None,
                },
                HistoryItem {
                    image_url: None,
                    video_url: Some("vid1".into()),
                },
            ],
            task: HistoryTask::default(),
        };
        assert_eq!(record.asset_urls(), vec!["img1".to_string(), "vid1".to_string()]);
    }

    #[test]
    fn empty_item_list_yields_no_urls() {
        let record = HistoryRecord {
            status: "processing".into(),
            fail_code: 0,
            item_list: vec![],
            task: HistoryTask::default(),
        };
        assert!(record.asset_urls().is_empty());
    }

    #[test]
    fn item_with_neither_url_is_skipped() {
        let record = HistoryRecord {
            status: "success".into(),
            fail_code: 0,
            item_list: vec![HistoryItem {
                image_url: None,
                video_url: None,
            }],
            task: HistoryTask::default(),
        };
        assert!(record.asset_urls().is_empty());
    }
}
