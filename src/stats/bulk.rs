use crate::config::BulkImportConfig;
use crate::context::StatsContext;
use crate::error::{InputError, StatsError};
use crate::stats::guard::DuplicateGuard;
use crate::stats::pipeline::{record_into, ReportTarget};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkImportSummary {
    pub scanned: usize,
    pub recorded: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl BulkImportSummary {
    pub fn describe(&self) -> String {
        let mut text = format!(
            "Scanned {} message(s): {} recorded, {} skipped, {} error(s).",
            self.scanned, self.recorded, self.skipped, self.errors.len()
        );
        for error in self.errors.iter().take(10) {
            text.push_str(&format!("\n- {}", error));
        }
        text
    }
}

/// Replays the report pipeline over a channel's history, walking backwards in
/// time one page at a time and oldest first within each page.
pub struct BulkImportDriver {
    pub max_messages: usize,
    pub page_size: u8,
}

impl Default for BulkImportDriver {
    fn default() -> Self {
        BulkImportDriver::from(&BulkImportConfig::default())
    }
}

impl From<&BulkImportConfig> for BulkImportDriver {
    fn from(config: &BulkImportConfig) -> Self {
        BulkImportDriver { max_messages: config.max_messages, page_size: config.page_size.max(1) }
    }
}

impl BulkImportDriver {
    pub async fn run(
        &self,
        ctx: &StatsContext,
        channel_id: u64,
        league: &str,
        collection_override: Option<&str>,
    ) -> BulkImportSummary {
        let guard = DuplicateGuard::new(ctx.channels.as_ref(), &ctx.marker_emoji);
        let mut summary = BulkImportSummary::default();
        let mut before = None;

        // resolved once, every message of the channel lands in the same place
        let target = match ReportTarget::prepare(ctx, league, collection_override).await {
            Ok(target) => target,
            Err(e) => {
                warn!("Cannot bulk import channel {}: {}", channel_id, e);
                summary.errors.push(format!("setup failed: {}", e));
                return summary;
            }
        };

        while summary.scanned < self.max_messages {
            let mut page = match ctx.channels.history_page(channel_id, before, self.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Stopping bulk import of channel {}: {}", channel_id, e);
                    summary.errors.push(format!("history fetch failed: {}", e));
                    break;
                }
            };
            let page_len = page.len();
            if page_len == 0 {
                break;
            }
            before = page.iter().map(|message| message.message_id).min();
            page.sort_by_key(|message| message.message_id);

            for message in page.iter() {
                if summary.scanned >= self.max_messages {
                    break;
                }
                summary.scanned += 1;
                if message.text.trim().is_empty() {
                    summary.skipped += 1;
                    continue;
                }
                match guard.is_already_recorded(message).await {
                    Ok(false) => {}
                    Ok(true) => {
                        summary.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping message {}, duplicate check failed: {}", message.message_id, e);
                        summary.skipped += 1;
                        continue;
                    }
                }
                match record_into(ctx, message, &target).await {
                    Ok(outcome) => {
                        if outcome.saved_count > 0 {
                            summary.recorded += 1;
                        }
                        summary.errors.extend(outcome.errors.into_iter().map(|failure| {
                            format!("{}: {} ({})", message.message_id, failure.reason, failure.user_id)
                        }));
                    }
                    Err(StatsError::Input(InputError::EmptyStatSet)) => summary.skipped += 1,
                    Err(e) => summary.errors.push(format!("{}: {}", message.message_id, e)),
                }
            }

            if page_len < self.page_size as usize {
                break;
            }
        }

        info!(
            "Bulk import of channel {} finished: {} scanned, {} recorded, {} skipped, {} error(s)",
            channel_id, summary.scanned, summary.recorded, summary.skipped, summary.errors.len()
        );
        summary
    }
}
