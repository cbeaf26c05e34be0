use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::preview::locale::Locale;
use crate::preview::messages::{MessageKey, Messages};

/// The "saved" acknowledgement shown after a save.
///
/// It reverts by itself after a delay, on a tokio task so the caller never blocks.
/// Saving again restarts the delay, and dropping the indicator cancels it.
#[derive(Debug)]
pub struct SavedIndicator {
    delay: Duration,
    showing: Arc<watch::Sender<bool>>,
    revert: Option<JoinHandle<()>>,
}

impl SavedIndicator {
    pub fn new(delay: Duration) -> SavedIndicator {
        let (showing, _) = watch::channel(false);
        SavedIndicator { delay, showing: Arc::new(showing), revert: None }
    }

    /// Whether the acknowledgement is currently shown
    pub fn is_showing(&self) -> bool {
        *self.showing.borrow()
    }

    /// Follow the indicator, e.g. to relabel a button when it reverts
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.showing.subscribe()
    }

    /// The label of the save button
    pub fn label<'a>(&self, messages: &'a dyn Messages, locale: Locale) -> Cow<'a, str> {
        if self.is_showing() {
            messages.get(MessageKey::SavedButton, locale)
        } else {
            messages.get(MessageKey::SaveButton, locale)
        }
    }

    /// Shows the acknowledgement and schedules its revert
    pub fn trigger(&mut self) {
        self.cancel();
        self.showing.send_replace(true);

        match Handle::try_current() {
            Ok(handle) => {
                let showing = Arc::clone(&self.showing);
                let delay = self.delay;
                self.revert = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    showing.send_replace(false);
                }));
            }
            Err(_) => {
                warn!("no tokio runtime to revert the saved indicator, reverting right away");
                self.showing.send_replace(false);
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(revert) = self.revert.take() {
            revert.abort();
        }
    }
}

impl Drop for SavedIndicator {
    fn drop(&mut self) {
        self.cancel();
    }
}
