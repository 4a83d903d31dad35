use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::HarvestEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Turns harvest events into log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::TargetStarted {
                target,
                resumed_from,
            } => match resumed_from {
                Some(index) => engine_info!("resuming {} at file index {}", target, index),
                None => engine_info!("starting {}", target),
            },
            HarvestEvent::PageFetched { depth, entries, .. } => {
                engine_debug!("page at depth {} shows {} entries", depth, entries);
            }
            HarvestEvent::EntrySkipped { error, .. } => {
                engine_warn!("skipping malformed entry: {}", error);
            }
            HarvestEvent::ItemSaved {
                file_index,
                media_url,
                path,
                ..
            } => {
                engine_info!("downloaded {} as #{} in {}", media_url, file_index, path.display());
            }
            HarvestEvent::DownloadFailed {
                file_index,
                media_url,
                error,
                ..
            } => {
                engine_warn!(
                    "an error occurred while downloading {} (#{}): {}",
                    media_url,
                    file_index,
                    error
                );
            }
            HarvestEvent::TargetFinished(report) => {
                engine_info!(
                    "finished {}: {} new, {} saved, {} failed, stop reason {:?}",
                    report.target,
                    report.yielded,
                    report.saved,
                    report.failed,
                    report.stop_reason
                );
            }
        }
    }
}
