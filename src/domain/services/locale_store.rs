#[cfg(test)]
#[path = "locale_store_test.rs"]
mod tests;

use std::str::FromStr;

use tokio::sync::watch;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Locale;
use crate::domain::models::TranslationKey;

/// Current UI locale plus change notifications. Shared by reference
/// (usually behind an `Arc`) with whatever renders text.
pub struct LocaleStore {
    tx: watch::Sender<Locale>,
}

impl Default for LocaleStore {
    fn default() -> LocaleStore {
        let locale = Locale::from_str(&Config::get(ConfigKey::Locale)).unwrap_or_default();
        return LocaleStore::new(locale);
    }
}

impl LocaleStore {
    pub fn new(locale: Locale) -> LocaleStore {
        let (tx, _) = watch::channel(locale);
        return LocaleStore { tx };
    }

    pub fn locale(&self) -> Locale {
        return *self.tx.borrow();
    }

    /// Switches locale. Subscribers are only notified when it actually
    /// changes; returns whether it did.
    pub fn set_locale(&self, locale: Locale) -> bool {
        return self.tx.send_if_modified(|current| {
            if *current == locale {
                return false;
            }
            *current = locale;
            return true;
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Locale> {
        return self.tx.subscribe();
    }

    pub fn t(&self, key: TranslationKey) -> &'static str {
        return key.translate(self.locale());
    }
}
